//! Batch aggregation of pairing-based SNARK proofs.
//!
//! `cinch-core` wraps a batch of N nested SNARK proofs (Groth16 or GM17 over a
//! BLS12-family curve) into a single Groth16 proof over an outer curve whose
//! scalar field equals the nested curve's base field. The aggregation circuit
//! re-runs the nested pairing verifier in R1CS and records, per slot, whether
//! verification succeeded: an invalid nested proof clears its validity bit
//! instead of failing the batch.
//!
//! ## Module structure
//! - `gadgets/`: the in-circuit arithmetic: extension-field towers
//!   (`fields`), curve point operations (`curves`), and the Miller loop /
//!   final exponentiation / product-of-pairings checks (`pairing`).
//! - `verifier`: the nested-SNARK verifier sub-circuits, one strategy per
//!   supported proof system, behind a common `(key, inputs, proof) -> bit`
//!   contract.
//! - `hash`: the MiMC verification-key digest, usable natively and in-circuit.
//! - `aggregation`: the aggregation circuit, trusted setup and proving entry
//!   points, keypair persistence, and the constraint-system export.
//! - `pool`: the per-application admission pool and the service facade
//!   consumed by the RPC layer.
//!
//! The wrapping curve, nested curve, and nested proof system are all fixed at
//! compile time through the [`pair::RecursionPair`] and
//! [`verifier::NestedSnarkGadget`] seams; the shipped instantiation is
//! BLS12-377 inside BW6-761.

pub mod aggregation;
pub mod error;
pub mod gadgets;
pub mod hash;
pub mod pair;
pub mod pool;
pub mod verifier;

pub use aggregation::{
    generate_trusted_setup, prove, verify_aggregate, AggregateProof, AggregationCircuit,
    AggregationKeypair, BatchEntry,
};
pub use error::{AggregationError, PoolError};
pub use hash::compute_vk_digest;
pub use pair::{Bls377Bw6, RecursionPair};
pub use pool::{Aggregator, ApplicationPool, TxToAggregate};
pub use verifier::{gm17::Gm17Nested, groth16::Groth16Nested, NestedSnarkGadget};
