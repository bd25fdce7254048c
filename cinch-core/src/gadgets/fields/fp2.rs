//! Degree-2 extension variable.
//!
//! The workhorse of the G2 and line-coefficient arithmetic. Multiplication
//! uses the Karatsuba decomposition (3 constrained multiplications instead of
//! 4), squaring the complex-squaring trick (2 instead of 3).

use std::borrow::Borrow;

use ark_ff::{Fp2, Fp2Config, One, Zero};
use ark_r1cs_std::alloc::{AllocVar, AllocationMode};
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};

use super::fpc;

/// An element of the quadratic extension, as a pair of base-field variables.
pub struct Fq2Var<Q: Fp2Config> {
    pub c0: FpVar<Q::Fp>,
    pub c1: FpVar<Q::Fp>,
}

impl<Q: Fp2Config> Clone for Fq2Var<Q> {
    fn clone(&self) -> Self {
        Self {
            c0: self.c0.clone(),
            c1: self.c1.clone(),
        }
    }
}

impl<Q: Fp2Config> Fq2Var<Q> {
    pub fn new(c0: FpVar<Q::Fp>, c1: FpVar<Q::Fp>) -> Self {
        Self { c0, c1 }
    }

    pub fn constant(value: Fp2<Q>) -> Self {
        Self::new(fpc(value.c0), fpc(value.c1))
    }

    pub fn zero() -> Self {
        Self::constant(Fp2::zero())
    }

    pub fn one() -> Self {
        Self::constant(Fp2::one())
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::new(&self.c0 + &other.c0, &self.c1 + &other.c1)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::new(&self.c0 - &other.c0, &self.c1 - &other.c1)
    }

    pub fn neg(&self) -> Self {
        Self::new(FpVar::zero() - &self.c0, FpVar::zero() - &self.c1)
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    pub fn triple(&self) -> Self {
        self.double().add(self)
    }

    /// Scale by a base-field constant. Free.
    pub fn scale(&self, k: Q::Fp) -> Self {
        Self::new(&self.c0 * &fpc(k), &self.c1 * &fpc(k))
    }

    /// Multiply by a constant extension element. Free.
    pub fn mul_by_constant(&self, c: &Fp2<Q>) -> Self {
        // (a0 + a1 u)(c0 + c1 u) with u^2 = NONRESIDUE.
        let c0 = &(&self.c0 * &fpc(c.c0)) + &(&self.c1 * &fpc(Q::NONRESIDUE * c.c1));
        let c1 = &(&self.c0 * &fpc(c.c1)) + &(&self.c1 * &fpc(c.c0));
        Self::new(c0, c1)
    }

    /// Multiply both components by a base-field variable. 2 constraints.
    pub fn mul_by_base(&self, f: &FpVar<Q::Fp>) -> Self {
        Self::new(&self.c0 * f, &self.c1 * f)
    }

    /// Karatsuba multiplication: 3 constrained multiplications.
    pub fn mul(&self, other: &Self) -> Self {
        let v0 = &self.c0 * &other.c0;
        let v1 = &self.c1 * &other.c1;
        let t = &(&self.c0 + &self.c1) * &(&other.c0 + &other.c1);
        let c0 = &v0 + &(&v1 * &fpc(Q::NONRESIDUE));
        let c1 = &(&t - &v0) - &v1;
        Self::new(c0, c1)
    }

    /// Complex squaring: 2 constrained multiplications.
    pub fn square(&self) -> Self {
        let v = &self.c0 * &self.c1;
        let a = &self.c0 + &self.c1;
        let b = &self.c0 + &(&self.c1 * &fpc(Q::NONRESIDUE));
        let c0 = &(&a * &b) - &(&v + &(&v * &fpc(Q::NONRESIDUE)));
        let c1 = &v + &v;
        Self::new(c0, c1)
    }

    /// Conjugation: negate the degree-1 coefficient. Free.
    pub fn conjugate(&self) -> Self {
        Self::new(self.c0.clone(), FpVar::zero() - &self.c1)
    }

    /// Frobenius endomorphism. For a quadratic extension this is conjugation
    /// for odd powers; realized as a constant scaling, so free.
    pub fn frobenius_map(&self, power: usize) -> Self {
        let c1 = &self.c1 * &fpc(Q::FROBENIUS_COEFF_FP2_C1[power % 2]);
        Self::new(self.c0.clone(), c1)
    }
}

impl<Q: Fp2Config> R1CSVar<Q::Fp> for Fq2Var<Q> {
    type Value = Fp2<Q>;

    fn cs(&self) -> ConstraintSystemRef<Q::Fp> {
        self.c0.cs().or(self.c1.cs())
    }

    fn value(&self) -> Result<Fp2<Q>, SynthesisError> {
        Ok(Fp2::new(self.c0.value()?, self.c1.value()?))
    }
}

impl<Q: Fp2Config> AllocVar<Fp2<Q>, Q::Fp> for Fq2Var<Q> {
    fn new_variable<T: Borrow<Fp2<Q>>>(
        cs: impl Into<Namespace<Q::Fp>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let value = f().map(|v| *v.borrow());
        let (v0, v1) = match value {
            Ok(v) => (Ok(v.c0), Ok(v.c1)),
            Err(_) => (
                Err(SynthesisError::AssignmentMissing),
                Err(SynthesisError::AssignmentMissing),
            ),
        };
        let c0 = FpVar::new_variable(cs.clone(), || v0, mode)?;
        let c1 = FpVar::new_variable(cs, || v1, mode)?;
        Ok(Self::new(c0, c1))
    }
}

impl<Q: Fp2Config> EqGadget<Q::Fp> for Fq2Var<Q> {
    fn is_eq(&self, other: &Self) -> Result<Boolean<Q::Fp>, SynthesisError> {
        let e0 = self.c0.is_eq(&other.c0)?;
        let e1 = self.c1.is_eq(&other.c1)?;
        Boolean::kary_and(&[e0, e1])
    }

    fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        self.c0.enforce_equal(&other.c0)?;
        self.c1.enforce_equal(&other.c1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::{Fq, Fq2, Fq2Config};
    use ark_ff::{Field, UniformRand};
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    fn witness(cs: &ConstraintSystemRef<Fq>, v: Fq2) -> Fq2Var<Fq2Config> {
        Fq2Var::new_witness(cs.clone(), || Ok(v)).unwrap()
    }

    #[test]
    fn arithmetic_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        for _ in 0..20 {
            let a = Fq2::rand(&mut rng);
            let b = Fq2::rand(&mut rng);
            let av = witness(&cs, a);
            let bv = witness(&cs, b);

            assert_eq!(av.add(&bv).value().unwrap(), a + b);
            assert_eq!(av.sub(&bv).value().unwrap(), a - b);
            assert_eq!(av.mul(&bv).value().unwrap(), a * b);
            assert_eq!(av.square().value().unwrap(), a.square());
            assert_eq!(av.neg().value().unwrap(), -a);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn constant_and_base_multiplication() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fq2::rand(&mut rng);
        let c = Fq2::rand(&mut rng);
        let k = Fq::rand(&mut rng);

        let av = witness(&cs, a);
        let kv = FpVar::new_witness(cs.clone(), || Ok(k)).unwrap();

        assert_eq!(av.mul_by_constant(&c).value().unwrap(), a * c);
        let mut scaled = a;
        scaled.mul_assign_by_fp(&k);
        assert_eq!(av.mul_by_base(&kv).value().unwrap(), scaled);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn frobenius_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fq2::rand(&mut rng);
        let av = witness(&cs, a);
        for power in 0..4 {
            let mut expected = a;
            expected.frobenius_map_in_place(power);
            assert_eq!(av.frobenius_map(power).value().unwrap(), expected);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn squaring_is_cheaper_than_multiplication() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fq2::rand(&mut rng);
        let av = witness(&cs, a);

        let before = cs.num_constraints();
        let _ = av.square();
        let square_cost = cs.num_constraints() - before;
        let _ = av.mul(&av.clone());
        let mul_cost = cs.num_constraints() - before - square_cost;
        assert_eq!(square_cost, 2);
        assert_eq!(mul_cost, 3);
    }
}
