//! Degree-12 extension variable (quadratic over degree-6), the pairing
//! target group's home.
//!
//! Besides the generic Karatsuba multiplication and complex squaring, this
//! carries the two operations the Miller loop leans on: the sparse
//! `mul_by_034` line multiplication (exactly 3 of the 6 quadratic
//! sub-components of a line evaluation are non-zero, and the constraint count
//! exploits that) and the constraint-free unitary conjugate.

use std::borrow::Borrow;

use ark_ff::{Field, Fp12, Fp12Config, Fp6Config, One};
use ark_r1cs_std::alloc::{AllocVar, AllocationMode};
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};

use super::{Fq2Var, Fq6Var};

type F<Q> =
    <<<Q as Fp12Config>::Fp6Config as Fp6Config>::Fp2Config as ark_ff::Fp2Config>::Fp;
type Fq2Of<Q> = Fq2Var<<<Q as Fp12Config>::Fp6Config as Fp6Config>::Fp2Config>;

/// An element of the degree-12 extension, as two degree-6 variables over the
/// quadratic generator `w` (`w^2 = v`).
pub struct Fq12Var<Q: Fp12Config> {
    pub c0: Fq6Var<Q::Fp6Config>,
    pub c1: Fq6Var<Q::Fp6Config>,
}

impl<Q: Fp12Config> Clone for Fq12Var<Q> {
    fn clone(&self) -> Self {
        Self {
            c0: self.c0.clone(),
            c1: self.c1.clone(),
        }
    }
}

impl<Q: Fp12Config> Fq12Var<Q> {
    pub fn new(c0: Fq6Var<Q::Fp6Config>, c1: Fq6Var<Q::Fp6Config>) -> Self {
        Self { c0, c1 }
    }

    pub fn constant(value: Fp12<Q>) -> Self {
        Self::new(Fq6Var::constant(value.c0), Fq6Var::constant(value.c1))
    }

    pub fn one() -> Self {
        Self::constant(Fp12::one())
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.c0.add(&other.c0), self.c1.add(&other.c1))
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.c0.sub(&other.c0), self.c1.sub(&other.c1))
    }

    /// Karatsuba multiplication: 3 degree-6 multiplications.
    pub fn mul(&self, other: &Self) -> Self {
        let v0 = self.c0.mul(&other.c0);
        let v1 = self.c1.mul(&other.c1);
        let t = self.c0.add(&self.c1).mul(&other.c0.add(&other.c1));
        let c0 = v0.add(&v1.mul_by_nonresidue());
        let c1 = t.sub(&v0).sub(&v1);
        Self::new(c0, c1)
    }

    /// Complex squaring: 2 degree-6 multiplications.
    pub fn square(&self) -> Self {
        let v = self.c0.mul(&self.c1);
        let a = self.c0.add(&self.c1);
        let b = self.c0.add(&self.c1.mul_by_nonresidue());
        let c0 = a.mul(&b).sub(&v).sub(&v.mul_by_nonresidue());
        let c1 = v.double();
        Self::new(c0, c1)
    }

    /// Multiply by the sparse line evaluation `c0 + (d0 + d1 v) w`:
    /// 13 quadratic-extension multiplications against 18 for the generic mul.
    pub fn mul_by_034(&self, c0: &Fq2Of<Q>, d0: &Fq2Of<Q>, d1: &Fq2Of<Q>) -> Self {
        let a = Fq6Var::new(
            self.c0.c0.mul(c0),
            self.c0.c1.mul(c0),
            self.c0.c2.mul(c0),
        );
        let b = self.c1.mul_by_01(d0, d1);
        let e = self.c0.add(&self.c1).mul_by_01(&c0.add(d0), d1);
        let new_c1 = e.sub(&a.add(&b));
        let new_c0 = a.add(&b.mul_by_nonresidue());
        Self::new(new_c0, new_c1)
    }

    /// Unitary inverse (conjugate). Free; valid as an inverse only for
    /// elements of the cyclotomic subgroup, which is where the Miller loop
    /// output lives after the easy part of the final exponentiation.
    pub fn conjugate(&self) -> Self {
        Self::new(self.c0.clone(), self.c1.neg())
    }

    /// Full inverse: witnessed, then bound by `self * inv = 1`.
    pub fn inverse(&self) -> Result<Self, SynthesisError> {
        let cs = self.cs();
        let inv = Self::new_witness(cs, || {
            self.value()?
                .inverse()
                .ok_or(SynthesisError::DivisionByZero)
        })?;
        self.mul(&inv).enforce_equal(&Self::one())?;
        Ok(inv)
    }

    /// Frobenius endomorphism; conjugations and constant scalings only. Free.
    pub fn frobenius_map(&self, power: usize) -> Self {
        let c0 = self.c0.frobenius_map(power);
        let c1 = self
            .c1
            .frobenius_map(power)
            .mul_by_fp2_constant(&Q::FROBENIUS_COEFF_FP12_C1[power % 12]);
        Self::new(c0, c1)
    }

    /// Fixed-exponent power by square-and-multiply over the exponent's bits.
    pub fn pow_u64_limbs(&self, exponent: &[u64]) -> Self {
        let mut res = Self::one();
        for bit in ark_ff::BitIteratorBE::without_leading_zeros(exponent) {
            res = res.square();
            if bit {
                res = res.mul(self);
            }
        }
        res
    }

    pub fn is_one(&self) -> Result<Boolean<F<Q>>, SynthesisError> {
        self.is_eq(&Self::one())
    }
}

impl<Q: Fp12Config> R1CSVar<F<Q>> for Fq12Var<Q> {
    type Value = Fp12<Q>;

    fn cs(&self) -> ConstraintSystemRef<F<Q>> {
        self.c0.cs().or(self.c1.cs())
    }

    fn value(&self) -> Result<Fp12<Q>, SynthesisError> {
        Ok(Fp12::new(self.c0.value()?, self.c1.value()?))
    }
}

impl<Q: Fp12Config> AllocVar<Fp12<Q>, F<Q>> for Fq12Var<Q> {
    fn new_variable<T: Borrow<Fp12<Q>>>(
        cs: impl Into<Namespace<F<Q>>>,
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
        let c0 = Fq6Var::new_variable(cs.clone(), || v0, mode)?;
        let c1 = Fq6Var::new_variable(cs, || v1, mode)?;
        Ok(Self::new(c0, c1))
    }
}

impl<Q: Fp12Config> EqGadget<F<Q>> for Fq12Var<Q> {
    fn is_eq(&self, other: &Self) -> Result<Boolean<F<Q>>, SynthesisError> {
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
    use ark_bls12_377::{Fq, Fq12, Fq12Config, Fq2};
    use ark_ff::UniformRand;
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    fn witness(cs: &ConstraintSystemRef<Fq>, v: Fq12) -> Fq12Var<Fq12Config> {
        Fq12Var::new_witness(cs.clone(), || Ok(v)).unwrap()
    }

    #[test]
    fn arithmetic_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        for _ in 0..5 {
            let a = Fq12::rand(&mut rng);
            let b = Fq12::rand(&mut rng);
            let av = witness(&cs, a);
            let bv = witness(&cs, b);

            assert_eq!(av.mul(&bv).value().unwrap(), a * b);
            assert_eq!(av.square().value().unwrap(), a.square());
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn sparse_mul_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fq12::rand(&mut rng);
        let c0 = Fq2::rand(&mut rng);
        let d0 = Fq2::rand(&mut rng);
        let d1 = Fq2::rand(&mut rng);

        let av = witness(&cs, a);
        let c0v = Fq2Var::new_witness(cs.clone(), || Ok(c0)).unwrap();
        let d0v = Fq2Var::new_witness(cs.clone(), || Ok(d0)).unwrap();
        let d1v = Fq2Var::new_witness(cs.clone(), || Ok(d1)).unwrap();

        let mut expected = a;
        expected.mul_by_034(&c0, &d0, &d1);
        assert_eq!(av.mul_by_034(&c0v, &d0v, &d1v).value().unwrap(), expected);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn inverse_and_conjugate() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fq12::rand(&mut rng);
        let av = witness(&cs, a);

        let inv = av.inverse().unwrap();
        assert_eq!(inv.value().unwrap(), a.inverse().unwrap());

        let mut conj = a;
        conj.conjugate_in_place();
        assert_eq!(av.conjugate().value().unwrap(), conj);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn frobenius_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fq12::rand(&mut rng);
        let av = witness(&cs, a);
        for power in 0..13 {
            let mut expected = a;
            expected.frobenius_map_in_place(power);
            assert_eq!(av.frobenius_map(power).value().unwrap(), expected);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn pow_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fq12::rand(&mut rng);
        let av = witness(&cs, a);
        let e = [0x8508c00000000001u64];
        assert_eq!(av.pow_u64_limbs(&e).value().unwrap(), a.pow(e));
        assert!(cs.is_satisfied().unwrap());
    }
}
