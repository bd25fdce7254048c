//! In-circuit arithmetic for the nested curve, expressed over the wrapping
//! curve's native scalar field.
//!
//! Everything in this tree follows the same cost discipline: linear
//! operations (add, sub, negation, scaling by constants, Frobenius) are free
//! linear combinations; every field multiplication is one individually
//! witnessed and constrained R1CS multiplication.

pub mod bits;
pub mod curves;
pub mod fields;
pub mod pairing;
