//! G2 point variables and the Miller-loop step formulas.
//!
//! The accumulator point is kept in homogeneous projective form; each
//! doubling/addition step returns the next point together with the line
//! coefficients the Miller loop consumes. The formulas are the standard
//! short-Weierstrass projective ones, with every intermediate individually
//! witnessed and constrained, one checked multiplication per field
//! multiplication, no fused unchecked combinations.

use std::borrow::Borrow;

use ark_ec::bls12::{Bls12Config, G2Affine, TwistType};
use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ec::AffineRepr;
use ark_ff::{BitIteratorBE, Field, Fp2, Zero};
use ark_r1cs_std::alloc::{AllocVar, AllocationMode};
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::R1CSVar;
use ark_relations::r1cs::{ConstraintSystemRef, Namespace, SynthesisError};

use crate::gadgets::fields::Fq2Var;

type Fq2Of<P> = Fq2Var<<P as Bls12Config>::Fp2Config>;

/// An affine point of the nested curve's second group.
pub struct G2AffineVar<P: Bls12Config> {
    pub x: Fq2Of<P>,
    pub y: Fq2Of<P>,
}

/// The Miller-loop accumulator point, in homogeneous projective coordinates;
/// degenerates to affine at Z = 1. Intermediate-only: no part of any proof's
/// public state.
pub struct G2ProjectiveVar<P: Bls12Config> {
    pub x: Fq2Of<P>,
    pub y: Fq2Of<P>,
    pub z: Fq2Of<P>,
}

/// Line-function coefficients emitted by one doubling or addition step and
/// consumed by one sparse multiplication in the Miller loop. Ephemeral.
pub struct LineCoeffsVar<P: Bls12Config> {
    pub c0: Fq2Of<P>,
    pub c1: Fq2Of<P>,
    pub c2: Fq2Of<P>,
}

impl<P: Bls12Config> Clone for G2AffineVar<P> {
    fn clone(&self) -> Self {
        Self {
            x: self.x.clone(),
            y: self.y.clone(),
        }
    }
}

impl<P: Bls12Config> Clone for G2ProjectiveVar<P> {
    fn clone(&self) -> Self {
        Self {
            x: self.x.clone(),
            y: self.y.clone(),
            z: self.z.clone(),
        }
    }
}

impl<P: Bls12Config> Clone for LineCoeffsVar<P> {
    fn clone(&self) -> Self {
        Self {
            c0: self.c0.clone(),
            c1: self.c1.clone(),
            c2: self.c2.clone(),
        }
    }
}

impl<P: Bls12Config> G2AffineVar<P> {
    pub fn new(x: Fq2Of<P>, y: Fq2Of<P>) -> Self {
        Self { x, y }
    }

    /// Lift to projective with Z = 1.
    pub fn to_projective(&self) -> G2ProjectiveVar<P> {
        G2ProjectiveVar {
            x: self.x.clone(),
            y: self.y.clone(),
            z: Fq2Var::one(),
        }
    }

    /// Incomplete affine addition with a witnessed slope. Requires distinct
    /// x-coordinates; used only for combining witnessed key/proof points.
    pub fn add_unchecked(&self, other: &Self) -> Result<Self, SynthesisError> {
        let cs = self.x.cs().or(other.x.cs());
        let lambda = Fq2Of::<P>::new_witness(cs, || {
            let dx = other.x.value()? - self.x.value()?;
            let dy = other.y.value()? - self.y.value()?;
            dx.inverse()
                .map(|inv| dy * inv)
                .ok_or(SynthesisError::DivisionByZero)
        })?;
        lambda
            .mul(&other.x.sub(&self.x))
            .enforce_equal(&other.y.sub(&self.y))?;
        let x3 = lambda.square().sub(&self.x.add(&other.x));
        let y3 = lambda.mul(&self.x.sub(&x3)).sub(&self.y);
        Ok(Self::new(x3, y3))
    }
}

/// One doubling step of the Miller-loop accumulator, producing the next
/// point and the line coefficients through the tangent at R.
pub fn double_step<P: Bls12Config>(
    r: &G2ProjectiveVar<P>,
) -> (G2ProjectiveVar<P>, LineCoeffsVar<P>) {
    let two_inv = P::Fp::from(2u64)
        .inverse()
        .expect("field characteristic is odd");
    let twist_b = <P::G2Config as SWCurveConfig>::COEFF_B;

    let a = r.x.mul(&r.y).scale(two_inv);
    let b = r.y.square();
    let c = r.z.square();
    let e = c.triple().mul_by_constant(&twist_b);
    let f = e.triple();
    let g = b.add(&f).scale(two_inv);
    let h = r.y.add(&r.z).square().sub(&b.add(&c));
    let i = e.sub(&b);
    let j = r.x.square();
    let e_sq = e.square();

    let next = G2ProjectiveVar {
        x: a.mul(&b.sub(&f)),
        y: g.square().sub(&e_sq.triple()),
        z: b.mul(&h),
    };
    let coeffs = match P::TWIST_TYPE {
        TwistType::D => LineCoeffsVar {
            c0: h.neg(),
            c1: j.triple(),
            c2: i,
        },
        TwistType::M => unreachable!("only D-type twists are supported"),
    };
    (next, coeffs)
}

/// One mixed-addition step against the fixed affine point Q.
pub fn add_step<P: Bls12Config>(
    r: &G2ProjectiveVar<P>,
    q: &G2AffineVar<P>,
) -> (G2ProjectiveVar<P>, LineCoeffsVar<P>) {
    let theta = r.y.sub(&q.y.mul(&r.z));
    let lambda = r.x.sub(&q.x.mul(&r.z));
    let c = theta.square();
    let d = lambda.square();
    let e = lambda.mul(&d);
    let f = r.z.mul(&c);
    let g = r.x.mul(&d);
    let h = e.add(&f).sub(&g.double());
    let j = theta.mul(&q.x).sub(&lambda.mul(&q.y));

    let next = G2ProjectiveVar {
        x: lambda.mul(&h),
        y: theta.mul(&g.sub(&h)).sub(&e.mul(&r.y)),
        z: r.z.mul(&e),
    };
    let coeffs = match P::TWIST_TYPE {
        TwistType::D => LineCoeffsVar {
            c0: lambda,
            c1: theta.neg(),
            c2: j,
        },
        TwistType::M => unreachable!("only D-type twists are supported"),
    };
    (next, coeffs)
}

/// Unroll the doubling/addition schedule dictated by the ate loop count,
/// producing the ordered line-coefficient list the Miller loop consumes.
/// Computed once per distinct G2 point.
pub fn precompute_line_coeffs<P: Bls12Config>(q: &G2AffineVar<P>) -> Vec<LineCoeffsVar<P>> {
    let mut r = q.to_projective();
    let mut coeffs = Vec::new();
    for bit in BitIteratorBE::without_leading_zeros(P::X).skip(1) {
        let (next, c) = double_step(&r);
        coeffs.push(c);
        r = next;
        if bit {
            let (next, c) = add_step(&r, q);
            coeffs.push(c);
            r = next;
        }
    }
    coeffs
}

impl<P: Bls12Config> R1CSVar<P::Fp> for G2AffineVar<P> {
    type Value = G2Affine<P>;

    fn cs(&self) -> ConstraintSystemRef<P::Fp> {
        self.x.cs().or(self.y.cs())
    }

    fn value(&self) -> Result<G2Affine<P>, SynthesisError> {
        Ok(G2Affine::<P>::new_unchecked(
            self.x.value()?,
            self.y.value()?,
        ))
    }
}

impl<P: Bls12Config> AllocVar<G2Affine<P>, P::Fp> for G2AffineVar<P> {
    fn new_variable<T: Borrow<G2Affine<P>>>(
        cs: impl Into<Namespace<P::Fp>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let coords = f().map(|p| {
            let p = *p.borrow();
            p.xy()
                .map(|(x, y)| (*x, *y))
                .unwrap_or((Fp2::zero(), Fp2::zero()))
        });
        let (x, y) = match coords {
            Ok((x, y)) => (Ok(x), Ok(y)),
            Err(_) => (
                Err(SynthesisError::AssignmentMissing),
                Err(SynthesisError::AssignmentMissing),
            ),
        };
        let x = Fq2Var::new_variable(cs.clone(), || x, mode)?;
        let y = Fq2Var::new_variable(cs, || y, mode)?;
        Ok(Self::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::{Config, Fq, Fr, G2Affine as NativeG2};
    use ark_ec::bls12::G2Prepared;
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_ff::UniformRand;
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    #[test]
    fn precomputed_lines_match_native_preparation() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let q = (NativeG2::generator().into_group() * Fr::rand(&mut rng)).into_affine();

        let qv = G2AffineVar::<Config>::new_witness(cs.clone(), || Ok(q)).unwrap();
        let coeffs = precompute_line_coeffs(&qv);

        let native = G2Prepared::<Config>::from(q);
        assert_eq!(coeffs.len(), native.ell_coeffs.len());
        for (var, (c0, c1, c2)) in coeffs.iter().zip(native.ell_coeffs.iter()) {
            assert_eq!(var.c0.value().unwrap(), *c0);
            assert_eq!(var.c1.value().unwrap(), *c1);
            assert_eq!(var.c2.value().unwrap(), *c2);
        }
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn affine_addition_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let p = (NativeG2::generator().into_group() * Fr::rand(&mut rng)).into_affine();
        let q = (NativeG2::generator().into_group() * Fr::rand(&mut rng)).into_affine();

        let pv = G2AffineVar::<Config>::new_witness(cs.clone(), || Ok(p)).unwrap();
        let qv = G2AffineVar::<Config>::new_witness(cs.clone(), || Ok(q)).unwrap();
        assert_eq!(
            pv.add_unchecked(&qv).unwrap().value().unwrap(),
            (p.into_group() + q).into_affine()
        );
        assert!(cs.is_satisfied().unwrap());
    }
}
