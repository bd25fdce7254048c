//! Verification-key digest: a MiMC permutation in Miyaguchi–Preneel mode
//! over the wrapping scalar field.
//!
//! The circuit never sees a verification key as primary input; it sees one
//! scalar. [`compute_vk_digest`] is the native half of that binding and
//! [`gadget`] the in-circuit half; the two run the identical permutation
//! schedule and must agree bit for bit.

use ark_ff::PrimeField;
use sha3::{Digest, Keccak256};

use crate::error::AggregationError;
use crate::pair::{RecursionPair, WrapScalar};
use crate::verifier::NestedSnarkGadget;

pub mod gadget;

/// Parameters of the keyed MiMC permutation: a power round function
/// `x -> (x + k + c_i)^e` iterated over Keccak-derived round constants.
pub struct MimcParams<F: PrimeField> {
    pub exponent: u64,
    pub round_constants: Vec<F>,
    pub iv: F,
}

impl<F: PrimeField> MimcParams<F> {
    /// Derive parameters for a domain tag. Round constants are the iterated
    /// Keccak-256 chain over the tag, reduced into the field.
    pub fn derive(exponent: u64, rounds: usize, domain: &str) -> Self {
        let mut state: [u8; 32] = Keccak256::digest(domain.as_bytes()).into();
        let mut round_constants = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            round_constants.push(F::from_be_bytes_mod_order(&state));
            state = Keccak256::digest(state).into();
        }
        let iv_bytes: [u8; 32] =
            Keccak256::digest([domain.as_bytes(), b".iv"].concat()).into();
        Self {
            exponent,
            round_constants,
            iv: F::from_be_bytes_mod_order(&iv_bytes),
        }
    }

    /// The keyed permutation, including the final key addition.
    pub fn permute(&self, x: F, key: F) -> F {
        let mut x = x;
        for c in &self.round_constants {
            x = (x + key + c).pow([self.exponent]);
        }
        x + key
    }

    /// Miyaguchi–Preneel compression: `E_h(m) + h + m`.
    pub fn compress(&self, h: F, m: F) -> F {
        self.permute(m, h) + h + m
    }

    /// Fold a message over the compression function, starting from the IV.
    pub fn hash(&self, elems: &[F]) -> F {
        elems.iter().fold(self.iv, |h, m| self.compress(h, *m))
    }
}

/// Digest parameters of a recursion pair's wrapping scalar field.
pub fn digest_params<R: RecursionPair>() -> MimcParams<WrapScalar<R>> {
    MimcParams::derive(R::DIGEST_EXPONENT, R::DIGEST_ROUNDS, R::DIGEST_DOMAIN)
}

/// Bind a verification key (plus its declared input count) to one wrapping
/// scalar. Usable by clients before registration; the aggregation circuit
/// recomputes the same value from the witnessed key.
pub fn compute_vk_digest<R, S>(
    vk: &S::VerifyingKey,
    num_inputs: usize,
) -> Result<WrapScalar<R>, AggregationError>
where
    R: RecursionPair,
    S: NestedSnarkGadget<<R as RecursionPair>::Nested>,
{
    let declared = S::num_inputs(vk);
    if declared != num_inputs {
        return Err(AggregationError::InputCountMismatch {
            expected: num_inputs,
            got: declared,
        });
    }
    let params = digest_params::<R>();
    let mut elems = vec![WrapScalar::<R>::from(num_inputs as u64)];
    elems.extend(S::digest_preimage(vk)?);
    Ok(params.hash(&elems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_377::Fq;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    fn params() -> MimcParams<Fq> {
        MimcParams::derive(17, 93, "cinch.test-digest")
    }

    #[test]
    fn digest_is_deterministic() {
        let mut rng = test_rng();
        let p = params();
        let elems: Vec<Fq> = (0..8).map(|_| Fq::rand(&mut rng)).collect();
        assert_eq!(p.hash(&elems), p.hash(&elems));
    }

    #[test]
    fn digest_is_input_sensitive() {
        let mut rng = test_rng();
        let p = params();
        let elems: Vec<Fq> = (0..8).map(|_| Fq::rand(&mut rng)).collect();
        let mut perturbed = elems.clone();
        perturbed[3] += Fq::from(1u64);
        assert_ne!(p.hash(&elems), p.hash(&perturbed));
        // Length-extension of the element list also changes the digest.
        let extended: Vec<Fq> = elems.iter().copied().chain([Fq::from(0u64)]).collect();
        assert_ne!(p.hash(&elems), p.hash(&extended));
    }

    #[test]
    fn permutation_is_a_bijection_on_samples() {
        let mut rng = test_rng();
        let p = params();
        let key = Fq::rand(&mut rng);
        let a = Fq::rand(&mut rng);
        let b = a + Fq::from(1u64);
        assert_ne!(p.permute(a, key), p.permute(b, key));
    }
}
