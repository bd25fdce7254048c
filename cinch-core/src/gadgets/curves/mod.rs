//! Point variables for the nested curve's two source groups.

pub mod g1;
pub mod g2;

pub use g1::G1Var;
pub use g2::{precompute_line_coeffs, G2AffineVar, G2ProjectiveVar, LineCoeffsVar};
