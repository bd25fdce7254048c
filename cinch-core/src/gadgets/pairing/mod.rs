//! The shared Miller-loop accumulator and the product-of-pairings checks.
//!
//! All pairings of one verification equation are accumulated into a single
//! target-group element (one squaring plus one sparse multiplication per
//! pair per loop bit) and pay for a single final exponentiation. This is the
//! dominant constraint-count optimization of the whole verifier. Inverted
//! pairings are realized by negating the G1 argument; the result surfaces as
//! a boolean wire, never as a hard constraint failure.

use ark_ec::bls12::Bls12Config;
use ark_ff::BitIteratorBE;
use ark_r1cs_std::boolean::Boolean;
use ark_relations::r1cs::SynthesisError;

use super::curves::{G1Var, LineCoeffsVar};
use super::fields::Fq12Var;

pub type Fq12Of<P> = Fq12Var<<P as Bls12Config>::Fp12Config>;

/// One (G1 point, line-coefficient schedule) pair entering the shared loop.
/// The schedule comes from [`precompute_line_coeffs`], one per distinct G2
/// point.
///
/// [`precompute_line_coeffs`]: crate::gadgets::curves::g2::precompute_line_coeffs
pub struct MillerPairVar<'a, P: Bls12Config> {
    pub point: G1Var<P>,
    pub coeffs: &'a [LineCoeffsVar<P>],
}

/// Multiply the accumulator by one line evaluated at P. The line is sparse
/// (3 of 6 quadratic sub-components non-zero), so this is a `mul_by_034`.
fn apply_line<P: Bls12Config>(
    f: Fq12Of<P>,
    coeffs: &LineCoeffsVar<P>,
    p: &G1Var<P>,
) -> Fq12Of<P> {
    let c0 = coeffs.c0.mul_by_base(&p.y);
    let c1 = coeffs.c1.mul_by_base(&p.x);
    f.mul_by_034(&c0, &c1, &coeffs.c2)
}

/// Shared Miller loop over any number of pairs.
pub fn miller_loop<P: Bls12Config>(pairs: &[MillerPairVar<'_, P>]) -> Fq12Of<P> {
    let mut f = Fq12Of::<P>::one();
    let mut cursors = vec![0usize; pairs.len()];
    for bit in BitIteratorBE::without_leading_zeros(P::X).skip(1) {
        f = f.square();
        for (pair, cursor) in pairs.iter().zip(cursors.iter_mut()) {
            f = apply_line(f, &pair.coeffs[*cursor], &pair.point);
            *cursor += 1;
        }
        if bit {
            for (pair, cursor) in pairs.iter().zip(cursors.iter_mut()) {
                f = apply_line(f, &pair.coeffs[*cursor], &pair.point);
                *cursor += 1;
            }
        }
    }
    if P::X_IS_NEGATIVE {
        f = f.conjugate();
    }
    f
}

/// `f^X`, conjugating when the curve parameter is negative. Valid for
/// unitary `f` only, which is where the hard part operates.
fn exp_by_x<P: Bls12Config>(f: &Fq12Of<P>) -> Fq12Of<P> {
    let r = f.pow_u64_limbs(P::X);
    if P::X_IS_NEGATIVE {
        r.conjugate()
    } else {
        r
    }
}

/// Final exponentiation to the unique coset representative.
///
/// Easy part: `f^((q^6 - 1)(q^2 + 1))` via conjugate, one witnessed inverse,
/// and a Frobenius. Hard part: exponent `(x-1)^2 (x+q)(x^2+q^2-1) + 3`, a
/// fixed positive multiple of `(q^4 - q^2 + 1)/r` coprime-cofactor equal to
/// 3; since `gcd(3, r) = 1`, the is-identity test is exactly preserved.
pub fn final_exponentiation<P: Bls12Config>(
    f: &Fq12Of<P>,
) -> Result<Fq12Of<P>, SynthesisError> {
    let t = f.conjugate().mul(&f.inverse()?);
    let m = t.frobenius_map(2).mul(&t);

    let y1 = exp_by_x::<P>(&m).mul(&m.conjugate());
    let y2 = exp_by_x::<P>(&y1).mul(&y1.conjugate());
    let y3 = exp_by_x::<P>(&y2).mul(&y2.frobenius_map(1));
    let y4 = exp_by_x::<P>(&exp_by_x::<P>(&y3))
        .mul(&y3.frobenius_map(2))
        .mul(&y3.conjugate());
    Ok(y4.mul(&m.square()).mul(&m))
}

/// Boolean check that the product of the given pairings is the identity.
///
/// `e(P1,Q1) * e(P2,Q2) * e(P3,Q3) = e(P4,Q4)` is phrased by the caller as a
/// four-pair product with the fourth G1 argument negated. The result is a
/// soft boolean: an unsatisfied equation clears the wire, it does not break
/// the constraint system.
pub fn pairing_product_is_one<P: Bls12Config>(
    pairs: &[MillerPairVar<'_, P>],
) -> Result<Boolean<P::Fp>, SynthesisError> {
    let f = miller_loop(pairs);
    final_exponentiation::<P>(&f)?.is_one()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gadgets::curves::g2::{precompute_line_coeffs, G2AffineVar};
    use ark_bls12_377::{Bls12_377, Config, Fq, Fr, G1Affine, G2Affine};
    use ark_ec::pairing::Pairing;
    use ark_ec::{AffineRepr, CurveGroup};
    use ark_ff::UniformRand;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
    use ark_std::test_rng;

    fn witness_pair(
        cs: &ConstraintSystemRef<Fq>,
        p: G1Affine,
        q: G2Affine,
    ) -> (G1Var<Config>, Vec<crate::gadgets::curves::LineCoeffsVar<Config>>) {
        let pv = G1Var::new_witness(cs.clone(), || Ok(p)).unwrap();
        let qv = G2AffineVar::new_witness(cs.clone(), || Ok(q)).unwrap();
        let coeffs = precompute_line_coeffs(&qv);
        (pv, coeffs)
    }

    #[test]
    fn miller_loop_matches_native() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let p1 = (G1Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();
        let q1 = (G2Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();
        let p2 = (G1Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();
        let q2 = (G2Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();

        let (p1v, c1) = witness_pair(&cs, p1, q1);
        let (p2v, c2) = witness_pair(&cs, p2, q2);
        let f = miller_loop(&[
            MillerPairVar {
                point: p1v,
                coeffs: &c1,
            },
            MillerPairVar {
                point: p2v,
                coeffs: &c2,
            },
        ]);

        let native = Bls12_377::multi_miller_loop([p1, p2], [q1, q2]).0;
        assert_eq!(f.value().unwrap(), native);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn cancelling_product_passes_check() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let a = Fr::rand(&mut rng);
        let b = Fr::rand(&mut rng);
        // e(aP, bQ) * e(-bP, aQ) = 1.
        let p1 = (G1Affine::generator().into_group() * a).into_affine();
        let q1 = (G2Affine::generator().into_group() * b).into_affine();
        let p2 = (-(G1Affine::generator().into_group() * b)).into_affine();
        let q2 = (G2Affine::generator().into_group() * a).into_affine();

        let (p1v, c1) = witness_pair(&cs, p1, q1);
        let (p2v, c2) = witness_pair(&cs, p2, q2);
        let ok = pairing_product_is_one(&[
            MillerPairVar {
                point: p1v,
                coeffs: &c1,
            },
            MillerPairVar {
                point: p2v,
                coeffs: &c2,
            },
        ])
        .unwrap();
        assert!(ok.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn unrelated_product_fails_check() {
        let mut rng = test_rng();
        let cs = ConstraintSystem::<Fq>::new_ref();
        let p1 = (G1Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();
        let q1 = (G2Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();
        let p2 = (G1Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();
        let q2 = (G2Affine::generator().into_group() * Fr::rand(&mut rng)).into_affine();

        let (p1v, c1) = witness_pair(&cs, p1, q1);
        let (p2v, c2) = witness_pair(&cs, p2, q2);
        let ok = pairing_product_is_one(&[
            MillerPairVar {
                point: p1v,
                coeffs: &c1,
            },
            MillerPairVar {
                point: p2v,
                coeffs: &c2,
            },
        ])
        .unwrap();
        // The check stays soft: the wire clears but the system is satisfied.
        assert!(!ok.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }
}
