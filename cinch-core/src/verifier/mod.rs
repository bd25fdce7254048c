//! Nested-SNARK verifier sub-circuits.
//!
//! Each supported nested proof system is a strategy behind the same
//! `(key, inputs, proof) -> result bit` contract, selected at build time and
//! monomorphized; the aggregation circuit never knows which scheme it hosts.
//! Verification is state-free and per-call: `process_verification_key`
//! expands a key variable into precomputed form once per key per circuit,
//! `online_verify` consumes it once per proof slot.
//!
//! Primary inputs arrive as bit vectors already constrained by the caller;
//! no field conversion happens here.

pub mod gm17;
pub mod groth16;

use ark_ec::bls12::{Bls12, Bls12Config, G1Affine, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ec::AffineRepr;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::error::AggregationError;
use crate::gadgets::curves::{G1Var, G2AffineVar};

/// Scalar field of the nested engine built on config `P`.
pub type NestedScalarOf<P> = <Bls12<P> as Pairing>::ScalarField;

/// A nested proof system's verifier sub-circuit and its native counterpart.
pub trait NestedSnarkGadget<P: Bls12Config>: Send + Sync + 'static {
    const NAME: &'static str;

    type VerifyingKey: Clone + CanonicalSerialize + CanonicalDeserialize + Send + Sync + 'static;
    type Proof: Clone + CanonicalSerialize + CanonicalDeserialize + Send + Sync + 'static;
    type VerifyingKeyVar;
    type PreparedKeyVar;
    type ProofVar;

    /// Number of primary inputs the key commits to.
    fn num_inputs(vk: &Self::VerifyingKey) -> usize;

    /// A structurally complete key with `num_inputs` inputs, used to fix the
    /// circuit shape during setup. Its values are never constrained.
    fn placeholder_vk(num_inputs: usize) -> Self::VerifyingKey;

    /// A structurally complete proof for the same purpose.
    fn placeholder_proof() -> Self::Proof;

    /// Flatten the key's affine coordinates for the digest, in a fixed
    /// order. Errors on points at infinity: those are malformed key
    /// material, not invalid proofs.
    fn digest_preimage(vk: &Self::VerifyingKey) -> Result<Vec<P::Fp>, AggregationError>;

    /// The in-circuit mirror of [`Self::digest_preimage`].
    fn digest_preimage_var(vk: &Self::VerifyingKeyVar) -> Vec<FpVar<P::Fp>>;

    fn allocate_vk(
        cs: ConstraintSystemRef<P::Fp>,
        vk: &Self::VerifyingKey,
    ) -> Result<Self::VerifyingKeyVar, SynthesisError>;

    fn allocate_proof(
        cs: ConstraintSystemRef<P::Fp>,
        proof: &Self::Proof,
    ) -> Result<Self::ProofVar, SynthesisError>;

    /// Expand a key variable into precomputed form (line-coefficient
    /// schedules for its G2 elements). One-time per key per circuit.
    fn process_verification_key(
        vk: &Self::VerifyingKeyVar,
    ) -> Result<Self::PreparedKeyVar, SynthesisError>;

    /// Evaluate the verification equation(s), writing the outcome into a
    /// returned boolean wire. A failing equation clears the wire; it never
    /// makes the constraint system unsatisfiable.
    fn online_verify(
        pvk: &Self::PreparedKeyVar,
        input_bits: &[Vec<Boolean<P::Fp>>],
        proof: &Self::ProofVar,
    ) -> Result<Boolean<P::Fp>, SynthesisError>;

    /// Native verification, used by the prover to assign the validity-bit
    /// witnesses. Never errors: anything the native verifier rejects or
    /// chokes on is an invalid proof.
    fn native_verify(
        vk: &Self::VerifyingKey,
        inputs: &[NestedScalarOf<P>],
        proof: &Self::Proof,
    ) -> bool;
}

/// `query[0] + Σ inputs[i] * query[i + 1]`, folded by conditional addition
/// so the identity never materializes. The caller guarantees
/// `query.len() == input_bits.len() + 1`.
pub(crate) fn input_accumulator<P: Bls12Config>(
    query: &[G1Var<P>],
    input_bits: &[Vec<Boolean<P::Fp>>],
) -> Result<G1Var<P>, SynthesisError> {
    let mut acc = query[0].clone();
    for (base, bits) in query[1..].iter().zip(input_bits) {
        acc = G1Var::mul_bits_and_add(&acc, base, bits)?;
    }
    Ok(acc)
}

pub(crate) fn push_g1_coords<P: Bls12Config>(
    out: &mut Vec<P::Fp>,
    p: &G1Affine<P>,
) -> Result<(), AggregationError> {
    let (x, y) = p
        .xy()
        .ok_or(AggregationError::MalformedKey("G1 point at infinity"))?;
    out.push(*x);
    out.push(*y);
    Ok(())
}

pub(crate) fn push_g2_coords<P: Bls12Config>(
    out: &mut Vec<P::Fp>,
    p: &G2Affine<P>,
) -> Result<(), AggregationError> {
    let (x, y) = p
        .xy()
        .ok_or(AggregationError::MalformedKey("G2 point at infinity"))?;
    out.extend([x.c0, x.c1, y.c0, y.c1]);
    Ok(())
}

pub(crate) fn push_g1_coord_vars<P: Bls12Config>(out: &mut Vec<FpVar<P::Fp>>, p: &G1Var<P>) {
    out.push(p.x.clone());
    out.push(p.y.clone());
}

pub(crate) fn push_g2_coord_vars<P: Bls12Config>(
    out: &mut Vec<FpVar<P::Fp>>,
    p: &G2AffineVar<P>,
) {
    out.push(p.x.c0.clone());
    out.push(p.x.c1.clone());
    out.push(p.y.c0.clone());
    out.push(p.y.c1.clone());
}
