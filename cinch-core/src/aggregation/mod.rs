//! The aggregation circuit and its setup/prove/verify entry points.

pub mod circuit;
pub mod export;
pub mod keypair;

pub use circuit::{AggregationCircuit, BatchEntry};
pub use export::{constraint_summary, ConstraintSummary};
pub use keypair::AggregationKeypair;

use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use ark_std::rand::{CryptoRng, RngCore};

use crate::error::AggregationError;
use crate::pair::{RecursionPair, WrapScalar};
use crate::verifier::NestedSnarkGadget;

/// A wrapping proof together with its primary inputs and the decoded
/// per-slot validity bits.
#[derive(Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct AggregateProof<RP: RecursionPair> {
    pub proof: Proof<RP::Wrap>,
    /// `[vk_digest, packed_validity_bits, inputs...]`, ready for the
    /// wrapping verifier.
    pub public_inputs: Vec<WrapScalar<RP>>,
    /// Validity of each proof slot, low index = slot 0. Mirrors the packed
    /// primary input.
    pub validity: Vec<bool>,
}

/// Run the non-deterministic trusted setup for one circuit shape. One-time
/// per (pair, system, batch size, input count) combination; two runs agree
/// on shape but not on key material.
#[tracing::instrument(skip_all, fields(pair = R::NAME, system = S::NAME, batch = N, inputs = num_inputs))]
pub fn generate_trusted_setup<R, S, const N: usize>(
    num_inputs: usize,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<(ProvingKey<R::Wrap>, VerifyingKey<R::Wrap>), AggregationError>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    let circuit = AggregationCircuit::<R, S, N>::blank(num_inputs);
    let (pk, vk) = Groth16::<R::Wrap>::setup(circuit, rng)?;
    tracing::info!(
        primary_inputs = vk.gamma_abc_g1.len() - 1,
        "trusted setup complete"
    );
    Ok((pk, vk))
}

/// Aggregate one batch of nested proofs into a wrapping proof.
///
/// Fails on malformed input (wrong primary-input count, unusable key
/// material) before any proving work. Does *not* fail on cryptographically
/// invalid nested proofs: those produce a wrapping proof whose corresponding
/// validity bit is 0.
#[tracing::instrument(skip_all, fields(pair = R::NAME, system = S::NAME, batch = N))]
pub fn prove<R, S, const N: usize>(
    proving_key: &ProvingKey<R::Wrap>,
    nested_vk: &S::VerifyingKey,
    entries: Vec<BatchEntry<R::Nested, S>>,
    rng: &mut (impl RngCore + CryptoRng),
) -> Result<AggregateProof<R>, AggregationError>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    let num_inputs = S::num_inputs(nested_vk);
    let circuit = AggregationCircuit::<R, S, N>::new(nested_vk.clone(), entries, num_inputs)?;
    let public_inputs = circuit.public_inputs()?;
    let validity = circuit.validity_bits();
    tracing::debug!(?validity, "validity bits assigned");

    let proof = Groth16::<R::Wrap>::prove(proving_key, circuit, rng)?;
    Ok(AggregateProof {
        proof,
        public_inputs,
        validity,
    })
}

/// Verify a wrapping proof against the wrapping verification key.
pub fn verify_aggregate<R: RecursionPair>(
    verifying_key: &VerifyingKey<R::Wrap>,
    aggregate: &AggregateProof<R>,
) -> Result<bool, AggregationError> {
    Ok(Groth16::<R::Wrap>::verify(
        verifying_key,
        &aggregate.public_inputs,
        &aggregate.proof,
    )?)
}

/// Decode the packed validity-bit primary input (low bit = slot 0).
pub fn decode_validity_bits<R: RecursionPair>(packed: WrapScalar<R>, batch: usize) -> Vec<bool> {
    use ark_ff::{BigInteger, PrimeField};
    let repr = packed.into_bigint();
    (0..batch).map(|i| repr.get_bit(i)).collect()
}
