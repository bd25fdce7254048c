//! Degree-6 extension variable (cubic over quadratic).

use std::borrow::Borrow;

use ark_ff::{Fp2, Fp6, Fp6Config, One, Zero};
use ark_r1cs_std::alloc::{AllocVar, AllocationMode};
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};

use super::Fq2Var;

type F<Q> = <<Q as Fp6Config>::Fp2Config as ark_ff::Fp2Config>::Fp;

/// An element of the degree-6 extension, as three quadratic-extension
/// variables over the cubic non-residue `v` (`v^3 = NONRESIDUE`).
pub struct Fq6Var<Q: Fp6Config> {
    pub c0: Fq2Var<Q::Fp2Config>,
    pub c1: Fq2Var<Q::Fp2Config>,
    pub c2: Fq2Var<Q::Fp2Config>,
}

impl<Q: Fp6Config> Clone for Fq6Var<Q> {
    fn clone(&self) -> Self {
        Self {
            c0: self.c0.clone(),
            c1: self.c1.clone(),
            c2: self.c2.clone(),
        }
    }
}

impl<Q: Fp6Config> Fq6Var<Q> {
    pub fn new(
        c0: Fq2Var<Q::Fp2Config>,
        c1: Fq2Var<Q::Fp2Config>,
        c2: Fq2Var<Q::Fp2Config>,
    ) -> Self {
        Self { c0, c1, c2 }
    }

    pub fn constant(value: Fp6<Q>) -> Self {
        Self::new(
            Fq2Var::constant(value.c0),
            Fq2Var::constant(value.c1),
            Fq2Var::constant(value.c2),
        )
    }

    pub fn zero() -> Self {
        Self::constant(Fp6::zero())
    }

    pub fn one() -> Self {
        Self::constant(Fp6::one())
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::new(
            self.c0.add(&other.c0),
            self.c1.add(&other.c1),
            self.c2.add(&other.c2),
        )
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::new(
            self.c0.sub(&other.c0),
            self.c1.sub(&other.c1),
            self.c2.sub(&other.c2),
        )
    }

    pub fn neg(&self) -> Self {
        Self::new(self.c0.neg(), self.c1.neg(), self.c2.neg())
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// Scale every coefficient by a constant quadratic-extension element. Free.
    pub fn mul_by_fp2_constant(&self, c: &Fp2<Q::Fp2Config>) -> Self {
        Self::new(
            self.c0.mul_by_constant(c),
            self.c1.mul_by_constant(c),
            self.c2.mul_by_constant(c),
        )
    }

    /// Multiply by the cubic generator `v`: a coefficient rotation plus one
    /// constant scaling. Free.
    pub fn mul_by_nonresidue(&self) -> Self {
        Self::new(
            self.c2.mul_by_constant(&Q::NONRESIDUE),
            self.c0.clone(),
            self.c1.clone(),
        )
    }

    /// Karatsuba multiplication: 6 quadratic-extension multiplications.
    pub fn mul(&self, other: &Self) -> Self {
        let v0 = self.c0.mul(&other.c0);
        let v1 = self.c1.mul(&other.c1);
        let v2 = self.c2.mul(&other.c2);

        let t0 = self
            .c1
            .add(&self.c2)
            .mul(&other.c1.add(&other.c2))
            .sub(&v1)
            .sub(&v2);
        let t1 = self
            .c0
            .add(&self.c1)
            .mul(&other.c0.add(&other.c1))
            .sub(&v0)
            .sub(&v1);
        let t2 = self
            .c0
            .add(&self.c2)
            .mul(&other.c0.add(&other.c2))
            .sub(&v0)
            .sub(&v2);

        let c0 = t0.mul_by_constant(&Q::NONRESIDUE).add(&v0);
        let c1 = t1.add(&v2.mul_by_constant(&Q::NONRESIDUE));
        let c2 = t2.add(&v1);
        Self::new(c0, c1, c2)
    }

    /// Specialized squaring: 5 quadratic-extension multiplications.
    pub fn square(&self) -> Self {
        let s0 = self.c0.square();
        let ab = self.c0.mul(&self.c1);
        let s1 = ab.double();
        let s2 = self.c0.sub(&self.c1).add(&self.c2).square();
        let bc = self.c1.mul(&self.c2);
        let s3 = bc.double();
        let s4 = self.c2.square();

        let c0 = s3.mul_by_constant(&Q::NONRESIDUE).add(&s0);
        let c1 = s4.mul_by_constant(&Q::NONRESIDUE).add(&s1);
        let c2 = s1.add(&s2).add(&s3).sub(&s0).sub(&s4);
        Self::new(c0, c1, c2)
    }

    /// Multiply by a sparse element with non-zero coefficients only in
    /// degrees 0 and 1: 5 quadratic-extension multiplications instead of 6.
    pub fn mul_by_01(&self, b0: &Fq2Var<Q::Fp2Config>, b1: &Fq2Var<Q::Fp2Config>) -> Self {
        let v0 = self.c0.mul(b0);
        let v1 = self.c1.mul(b1);

        let t0 = self.c1.add(&self.c2).mul(b1).sub(&v1);
        let c0 = t0.mul_by_constant(&Q::NONRESIDUE).add(&v0);
        let c1 = self
            .c0
            .add(&self.c1)
            .mul(&b0.add(b1))
            .sub(&v0)
            .sub(&v1);
        let c2 = self.c0.add(&self.c2).mul(b0).sub(&v0).add(&v1);
        Self::new(c0, c1, c2)
    }

    /// Frobenius endomorphism; conjugations and constant scalings only. Free.
    pub fn frobenius_map(&self, power: usize) -> Self {
        let c0 = self.c0.frobenius_map(power);
        let c1 = self
            .c1
            .frobenius_map(power)
            .mul_by_constant(&Q::FROBENIUS_COEFF_FP6_C1[power % 6]);
        let c2 = self
            .c2
            .frobenius_map(power)
            .mul_by_constant(&Q::FROBENIUS_COEFF_FP6_C2[power % 6]);
        Self::new(c0, c1, c2)
    }
}

impl<Q: Fp6Config> R1CSVar<F<Q>> for Fq6Var<Q> {
    type Value = Fp6<Q>;

    fn cs(&self) -> ConstraintSystemRef<F<Q>> {
        self.c0.cs().or(self.c1.cs()).or(self.c2.cs())
    }

    fn value(&self) -> Result<Fp6<Q>, SynthesisError> {
        Ok(Fp6::new(
            self.c0.value()?,
            self.c1.value()?,
            self.c2.value()?,
        ))
    }
}

impl<Q: Fp6Config> AllocVar<Fp6<Q>, F<Q>> for Fq6Var<Q> {
    fn new_variable<T: Borrow<Fp6<Q>>>(
        cs: impl Into<Namespace<F<Q>>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let value = f().map(|v| *v.borrow());
        let (v0, v1, v2) = match value {
            Ok(v) => (Ok(v.c0), Ok(v.c1), Ok(v.c2)),
            Err(_) => (
                Err(SynthesisError::AssignmentMissing),
                Err(SynthesisError::AssignmentMissing),
                Err(SynthesisError::AssignmentMissing),
            ),
        };
        let c0 = Fq2Var::new_variable(cs.clone(), || v0, mode)?;
        let c1 = Fq2Var::new_variable(cs.clone(), || v1, mode)?;
        let c2 = Fq2Var::new_variable(cs, || v2, mode)?;
        Ok(Self::new(c0, c1, c2))
    }
}

impl<Q: Fp6Config> EqGadget<F<Q>> for Fq6Var<Q> {
    fn is_eq(&self, other: &Self) -> Result<Boolean<F<Q>>, SynthesisError> {
        let e0 = self.c0.is_eq(&other.c0)?;
        let e1 = self.c1.is_eq(&other.c1)?;
        let e2 = self.c2.is_eq(&other.c2)?;
        Boolean::kary_and(&[e0, e1, e2])
    }

    fn enforce_equal(&self, other: &Self) -> Result<(), SynthesisError> {
        self.c0.enforce_equal(&other.c0)?;
        self.c1.enforce_equal(&other.c1)?;
        self.c2.enforce_equal(&other.c2)
    }
}
