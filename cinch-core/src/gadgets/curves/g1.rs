//! Affine G1 point variable over the wrapping circuit's native field.
//!
//! Addition and doubling use incomplete affine formulas with a witnessed
//! slope. Exceptional cases (adding a point to itself or its negation,
//! doubling the identity) make the slope constraint unsatisfiable rather than
//! unsound; for honestly-derived keys and proofs they occur with negligible
//! probability. Callers must not feed the point at infinity.

use std::borrow::Borrow;

use ark_ec::bls12::{Bls12Config, G1Affine};
use ark_ec::AffineRepr;
use ark_ff::{Field, Zero};
use ark_r1cs_std::alloc::{AllocVar, AllocationMode};
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_r1cs_std::select::CondSelectGadget;
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};

/// An affine point of the nested curve's first group, (x, y) in the wrapping
/// scalar field.
pub struct G1Var<P: Bls12Config> {
    pub x: FpVar<P::Fp>,
    pub y: FpVar<P::Fp>,
}

impl<P: Bls12Config> Clone for G1Var<P> {
    fn clone(&self) -> Self {
        Self {
            x: self.x.clone(),
            y: self.y.clone(),
        }
    }
}

impl<P: Bls12Config> G1Var<P> {
    pub fn new(x: FpVar<P::Fp>, y: FpVar<P::Fp>) -> Self {
        Self { x, y }
    }

    pub fn negate(&self) -> Self {
        Self::new(self.x.clone(), FpVar::zero() - &self.y)
    }

    /// Incomplete affine addition: 3 constraints. Requires `self.x != other.x`.
    pub fn add_unchecked(&self, other: &Self) -> Result<Self, SynthesisError> {
        let cs = self.cs().or(other.cs());
        let lambda = FpVar::new_witness(cs, || {
            let dx = other.x.value()? - self.x.value()?;
            let dy = other.y.value()? - self.y.value()?;
            dx.inverse()
                .map(|inv| dy * inv)
                .ok_or(SynthesisError::DivisionByZero)
        })?;
        // lambda * (x2 - x1) = y2 - y1
        lambda.mul_equals(&(&other.x - &self.x), &(&other.y - &self.y))?;
        let x3 = &lambda.square()? - &(&self.x + &other.x);
        let y3 = &(&lambda * &(&self.x - &x3)) - &self.y;
        Ok(Self::new(x3, y3))
    }

    /// Affine doubling: 4 constraints. Requires `self.y != 0`.
    pub fn double(&self) -> Result<Self, SynthesisError> {
        let cs = self.cs();
        let x_sq = &self.x * &self.x;
        let lambda = FpVar::new_witness(cs, || {
            let x = self.x.value()?;
            let num = x.square() + x.square().double();
            self.y
                .value()?
                .double()
                .inverse()
                .map(|inv| num * inv)
                .ok_or(SynthesisError::DivisionByZero)
        })?;
        // lambda * 2y = 3x^2
        let three_x_sq = &x_sq.double()? + &x_sq;
        lambda.mul_equals(&self.y.double()?, &three_x_sq)?;
        let x3 = &lambda.square()? - &self.x.double()?;
        let y3 = &(&lambda * &(&self.x - &x3)) - &self.y;
        Ok(Self::new(x3, y3))
    }

    pub fn conditionally_select(
        cond: &Boolean<P::Fp>,
        when_true: &Self,
        when_false: &Self,
    ) -> Result<Self, SynthesisError> {
        Ok(Self::new(
            FpVar::conditionally_select(cond, &when_true.x, &when_false.x)?,
            FpVar::conditionally_select(cond, &when_true.y, &when_false.y)?,
        ))
    }

    /// Fold `base * Σ 2^i bits_i` into `acc` by conditional addition: the
    /// accumulator moves only on set bits, so the point at infinity never
    /// materializes for a non-zero starting accumulator.
    pub fn mul_bits_and_add(
        acc: &Self,
        base: &Self,
        bits: &[Boolean<P::Fp>],
    ) -> Result<Self, SynthesisError> {
        let mut acc = acc.clone();
        let mut pow = base.clone();
        for (i, bit) in bits.iter().enumerate() {
            let sum = acc.add_unchecked(&pow)?;
            acc = Self::conditionally_select(bit, &sum, &acc)?;
            if i + 1 < bits.len() {
                pow = pow.double()?;
            }
        }
        Ok(acc)
    }
}

impl<P: Bls12Config> R1CSVar<P::Fp> for G1Var<P> {
    type Value = G1Affine<P>;

    fn cs(&self) -> ConstraintSystemRef<P::Fp> {
        self.x.cs().or(self.y.cs())
    }

    fn value(&self) -> Result<G1Affine<P>, SynthesisError> {
        Ok(G1Affine::<P>::new_unchecked(
            self.x.value()?,
            self.y.value()?,
        ))
    }
}

impl<P: Bls12Config> AllocVar<G1Affine<P>, P::Fp> for G1Var<P> {
    fn new_variable<T: Borrow<G1Affine<P>>>(
        cs: impl Into<Namespace<P::Fp>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let coords = f().map(|p| {
            let p = *p.borrow();
            // The identity has no affine coordinates; (0, 0) is not on the
            // curve, so a pairing check against it cannot pass.
            p.xy()
                .map(|(x, y)| (*x, *y))
                .unwrap_or((P::Fp::zero(), P::Fp::zero()))
        });
        let (x, y) = match coords {
            Ok((x, y)) => (Ok(x), Ok(y)),
            Err(_) => (
                Err(SynthesisError::AssignmentMissing),
                Err(SynthesisError::AssignmentMissing),
            ),
        };
        let x = FpVar::new_variable(cs.clone(), || x, mode)?;
        let y = FpVar::new_variable(cs, || y, mode)?;
        Ok(Self::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::{Config, Fq, Fr, G1Affine as NativeG1};
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_ff::{BigInteger, PrimeField, UniformRand};
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    fn random_point(rng: &mut impl rand::Rng) -> NativeG1 {
        (NativeG1::generator().into_group() * Fr::rand(rng)).into_affine()
    }

    #[test]
    fn add_and_double_match_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let p = random_point(&mut rng);
        let q = random_point(&mut rng);

        let pv = G1Var::<Config>::new_witness(cs.clone(), || Ok(p)).unwrap();
        let qv = G1Var::<Config>::new_witness(cs.clone(), || Ok(q)).unwrap();

        assert_eq!(
            pv.add_unchecked(&qv).unwrap().value().unwrap(),
            (p.into_group() + q).into_affine()
        );
        assert_eq!(
            pv.double().unwrap().value().unwrap(),
            (p.into_group() + p).into_affine()
        );
        assert_eq!(pv.negate().value().unwrap(), -p);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn bit_fold_computes_scalar_multiple() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let start = random_point(&mut rng);
        let base = random_point(&mut rng);
        let scalar = Fr::rand(&mut rng);

        let start_v = G1Var::<Config>::new_witness(cs.clone(), || Ok(start)).unwrap();
        let base_v = G1Var::<Config>::new_witness(cs.clone(), || Ok(base)).unwrap();
        let bits: Vec<_> = scalar
            .into_bigint()
            .to_bits_le()
            .into_iter()
            .take(Fr::MODULUS_BIT_SIZE as usize)
            .map(|b| Boolean::new_witness(cs.clone(), || Ok(b)).unwrap())
            .collect();

        let acc = G1Var::mul_bits_and_add(&start_v, &base_v, &bits).unwrap();
        assert_eq!(
            acc.value().unwrap(),
            (start.into_group() + base.into_group() * scalar).into_affine()
        );
        assert!(cs.is_satisfied().unwrap());
    }
}
