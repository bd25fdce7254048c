//! Extension-field tower variables: degree 2, degree 6 (3 over 2), and
//! degree 12 (2 over 6).
//!
//! Coefficient ordering matches `ark-ff`'s canonical tower representation,
//! so `value()` on any tower variable and witness allocation from a native
//! element are inverse operations.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;

pub mod fp12;
pub mod fp2;
pub mod fp6;

pub use fp12::Fq12Var;
pub use fp2::Fq2Var;
pub use fp6::Fq6Var;

/// Lift a native constant into a (constraint-free) circuit constant.
pub(crate) fn fpc<F: PrimeField>(c: F) -> FpVar<F> {
    FpVar::Constant(c)
}
