//! In-circuit half of the verification-key digest.
//!
//! Mirrors the native schedule in [`super::MimcParams`] exactly: additions
//! and constant injections are free linear combinations; each round costs
//! one short square-and-multiply chain for the power map (5 constraints at
//! exponent 17).

use ark_ff::{BitIteratorBE, PrimeField};
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;

use super::MimcParams;
use crate::gadgets::fields::fpc;

/// `base^e` by square-and-multiply over the constant exponent's bits.
fn pow_var<F: PrimeField>(base: &FpVar<F>, exponent: u64) -> FpVar<F> {
    debug_assert!(exponent >= 1);
    let mut res = base.clone();
    for bit in BitIteratorBE::without_leading_zeros([exponent]).skip(1) {
        res = &res * &res;
        if bit {
            res = &res * base;
        }
    }
    res
}

/// The keyed permutation over variables.
pub fn permute_var<F: PrimeField>(
    params: &MimcParams<F>,
    x: &FpVar<F>,
    key: &FpVar<F>,
) -> FpVar<F> {
    let mut x = x.clone();
    for c in &params.round_constants {
        x = pow_var(&(&(&x + key) + &fpc(*c)), params.exponent);
    }
    &x + key
}

/// Miyaguchi–Preneel compression over variables.
pub fn compress_var<F: PrimeField>(
    params: &MimcParams<F>,
    h: &FpVar<F>,
    m: &FpVar<F>,
) -> FpVar<F> {
    &(&permute_var(params, m, h) + h) + m
}

/// Fold a message of variables over the compression function.
pub fn digest_var<F: PrimeField>(
    params: &MimcParams<F>,
    elems: &[FpVar<F>],
) -> Result<FpVar<F>, SynthesisError> {
    let mut h = fpc(params.iv);
    for m in elems {
        h = compress_var(params, &h, m);
    }
    Ok(h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::Fq;
    use ark_ff::UniformRand;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    #[test]
    fn circuit_digest_matches_native() {
        let mut rng = test_rng();
        let params = MimcParams::<Fq>::derive(17, 93, "cinch.test-digest");
        let cs = ConstraintSystem::<Fq>::new_ref();

        let elems: Vec<Fq> = (0..6).map(|_| Fq::rand(&mut rng)).collect();
        let vars: Vec<FpVar<Fq>> = elems
            .iter()
            .map(|e| FpVar::new_witness(cs.clone(), || Ok(*e)).unwrap())
            .collect();

        let native = params.hash(&elems);
        let circuit = digest_var(&params, &vars).unwrap();
        assert_eq!(circuit.value().unwrap(), native);
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn power_map_cost_is_logarithmic() {
        let cs = ConstraintSystem::<Fq>::new_ref();
        let x = FpVar::new_witness(cs.clone(), || Ok(Fq::from(7u64))).unwrap();
        let before = cs.num_constraints();
        let _ = pow_var(&x, 17);
        // 4 squarings and 1 multiplication for 17 = 0b10001.
        assert_eq!(cs.num_constraints() - before, 5);
    }
}
