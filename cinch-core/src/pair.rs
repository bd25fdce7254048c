//! The recursion-pair seam: which nested curve is verified inside which
//! wrapping curve.
//!
//! The only structural requirement is that the wrapping curve's scalar field
//! *is* the nested curve's base field, so nested G1 coordinates are native
//! circuit values and the G2/target towers are small extensions over them.
//! Everything curve-specific (the ate loop count, the tower configuration,
//! the digest permutation parameters) is reached through this trait, so
//! constraint code stays generic and is monomorphized per pair.

use ark_ec::bls12::{Bls12, Bls12Config};
use ark_ec::pairing::Pairing;
use ark_ff::PrimeField;

/// The nested pairing engine of a recursion pair.
pub type NestedEngine<R> = Bls12<<R as RecursionPair>::Nested>;

/// The nested curve's scalar field (primary inputs of nested proofs).
pub type NestedScalar<R> = <NestedEngine<R> as Pairing>::ScalarField;

/// The wrapping curve's scalar field, which is the circuit's native field.
pub type WrapScalar<R> = <<R as RecursionPair>::Wrap as Pairing>::ScalarField;

/// A fixed (wrapping curve, nested curve) combination.
pub trait RecursionPair: Send + Sync + 'static {
    /// Pairing engine the aggregated proof is produced over.
    type Wrap: Pairing<ScalarField = <Self::Nested as Bls12Config>::Fp>;

    /// Configuration of the nested BLS12-family curve whose proofs are
    /// verified in-circuit.
    type Nested: Bls12Config;

    /// Permutation exponent of the verification-key digest. Must be coprime
    /// to `q - 1` for the wrapping scalar field's modulus `q`, so the round
    /// function is a bijection.
    const DIGEST_EXPONENT: u64;

    /// Digest round count: `ceil(modulus bits / log2(exponent))`, the
    /// standard margin against interpolation-style algebraic attacks.
    const DIGEST_ROUNDS: usize;

    /// Domain tag for digest round-constant derivation.
    const DIGEST_DOMAIN: &'static str;

    const NAME: &'static str;
}

/// Number of bits in the nested scalar field's modulus; nested primary
/// inputs and their wrapping-field embeddings share this bit length.
pub fn nested_scalar_bits<R: RecursionPair>() -> usize {
    NestedScalar::<R>::MODULUS_BIT_SIZE as usize
}

/// Re-express a nested scalar in the wrapping scalar field. Injective: the
/// nested modulus is strictly smaller than the wrapping one.
pub fn embed_nested_scalar<R: RecursionPair>(x: &NestedScalar<R>) -> WrapScalar<R> {
    use ark_ff::BigInteger;
    WrapScalar::<R>::from_le_bytes_mod_order(&x.into_bigint().to_bytes_le())
}

/// BLS12-377 proofs aggregated inside BW6-761. BW6-761's scalar field is
/// BLS12-377's base field by construction.
pub struct Bls377Bw6;

impl RecursionPair for Bls377Bw6 {
    type Wrap = ark_bw6_761::BW6_761;
    type Nested = ark_bls12_377::Config;

    // gcd(17, q - 1) = 1 for the 377-bit BW6-761 scalar modulus; 17 is the
    // smallest such prime exponent above the trivial ones.
    const DIGEST_EXPONENT: u64 = 17;
    // ceil(377 / log2(17)) = 93.
    const DIGEST_ROUNDS: usize = 93;
    const DIGEST_DOMAIN: &'static str = "cinch.vk-digest.bls12-377.bw6-761";
    const NAME: &'static str = "bls12-377/bw6-761";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_scalar_field_is_nested_base_field() {
        // Type-level identity; checked here on the moduli for documentation.
        assert_eq!(
            <WrapScalar<Bls377Bw6> as PrimeField>::MODULUS,
            <<ark_bls12_377::Config as Bls12Config>::Fp as PrimeField>::MODULUS,
        );
        assert_eq!(nested_scalar_bits::<Bls377Bw6>(), 253);
    }
}
