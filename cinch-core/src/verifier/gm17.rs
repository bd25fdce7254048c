//! GM17 verifier strategy: the richer-check scheme.
//!
//! Two equations instead of Groth16's one:
//!   e(A + g^α, B + h^β) = e(g^α, h^β) · e(ψ, h^γ) · e(C, h)
//!   e(A, h^γ) = e(g^γ, B)
//! with ψ the input accumulator over the query points. Each equation is one
//! combined Miller product (five pairs and two pairs respectively); the
//! result bit is their conjunction.

use ark_ec::bls12::{Bls12, Bls12Config, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_gm17::{Proof, VerifyingKey, GM17};
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use ark_snark::SNARK;

use super::{
    input_accumulator, push_g1_coord_vars, push_g1_coords, push_g2_coord_vars, push_g2_coords,
    NestedScalarOf, NestedSnarkGadget,
};
use crate::error::AggregationError;
use crate::gadgets::curves::{precompute_line_coeffs, G1Var, G2AffineVar, LineCoeffsVar};
use crate::gadgets::pairing::{pairing_product_is_one, MillerPairVar};

/// Marker type selecting GM17 as the nested proof system.
pub struct Gm17Nested;

pub struct Gm17VkVar<P: Bls12Config> {
    pub h_g2: G2AffineVar<P>,
    pub g_alpha_g1: G1Var<P>,
    pub h_beta_g2: G2AffineVar<P>,
    pub g_gamma_g1: G1Var<P>,
    pub h_gamma_g2: G2AffineVar<P>,
    pub query: Vec<G1Var<P>>,
}

pub struct PreparedGm17VkVar<P: Bls12Config> {
    g_alpha_g1: G1Var<P>,
    g_gamma_g1: G1Var<P>,
    h_beta_g2: G2AffineVar<P>,
    query: Vec<G1Var<P>>,
    h_coeffs: Vec<LineCoeffsVar<P>>,
    h_beta_coeffs: Vec<LineCoeffsVar<P>>,
    h_gamma_coeffs: Vec<LineCoeffsVar<P>>,
}

pub struct Gm17ProofVar<P: Bls12Config> {
    pub a: G1Var<P>,
    pub b: G2AffineVar<P>,
    pub c: G1Var<P>,
}

impl<P: Bls12Config> NestedSnarkGadget<P> for Gm17Nested {
    const NAME: &'static str = "gm17";

    type VerifyingKey = VerifyingKey<Bls12<P>>;
    type Proof = Proof<Bls12<P>>;
    type VerifyingKeyVar = Gm17VkVar<P>;
    type PreparedKeyVar = PreparedGm17VkVar<P>;
    type ProofVar = Gm17ProofVar<P>;

    fn num_inputs(vk: &Self::VerifyingKey) -> usize {
        vk.query.len().saturating_sub(1)
    }

    fn placeholder_vk(num_inputs: usize) -> Self::VerifyingKey {
        VerifyingKey {
            h_g2: G2Affine::<P>::generator(),
            g_alpha_g1: G1Affine::<P>::generator(),
            h_beta_g2: G2Affine::<P>::generator(),
            g_gamma_g1: G1Affine::<P>::generator(),
            h_gamma_g2: G2Affine::<P>::generator(),
            query: vec![G1Affine::<P>::generator(); num_inputs + 1],
        }
    }

    fn placeholder_proof() -> Self::Proof {
        Proof {
            a: G1Affine::<P>::generator(),
            b: G2Affine::<P>::generator(),
            c: G1Affine::<P>::generator(),
        }
    }

    fn digest_preimage(vk: &Self::VerifyingKey) -> Result<Vec<P::Fp>, AggregationError> {
        let mut out = Vec::with_capacity(16 + 2 * vk.query.len());
        push_g2_coords::<P>(&mut out, &vk.h_g2)?;
        push_g1_coords::<P>(&mut out, &vk.g_alpha_g1)?;
        push_g2_coords::<P>(&mut out, &vk.h_beta_g2)?;
        push_g1_coords::<P>(&mut out, &vk.g_gamma_g1)?;
        push_g2_coords::<P>(&mut out, &vk.h_gamma_g2)?;
        for p in &vk.query {
            push_g1_coords::<P>(&mut out, p)?;
        }
        Ok(out)
    }

    fn digest_preimage_var(vk: &Self::VerifyingKeyVar) -> Vec<FpVar<P::Fp>> {
        let mut out = Vec::with_capacity(16 + 2 * vk.query.len());
        push_g2_coord_vars::<P>(&mut out, &vk.h_g2);
        push_g1_coord_vars::<P>(&mut out, &vk.g_alpha_g1);
        push_g2_coord_vars::<P>(&mut out, &vk.h_beta_g2);
        push_g1_coord_vars::<P>(&mut out, &vk.g_gamma_g1);
        push_g2_coord_vars::<P>(&mut out, &vk.h_gamma_g2);
        for p in &vk.query {
            push_g1_coord_vars::<P>(&mut out, p);
        }
        out
    }

    fn allocate_vk(
        cs: ConstraintSystemRef<P::Fp>,
        vk: &Self::VerifyingKey,
    ) -> Result<Self::VerifyingKeyVar, SynthesisError> {
        Ok(Gm17VkVar {
            h_g2: G2AffineVar::new_witness(cs.clone(), || Ok(vk.h_g2))?,
            g_alpha_g1: G1Var::new_witness(cs.clone(), || Ok(vk.g_alpha_g1))?,
            h_beta_g2: G2AffineVar::new_witness(cs.clone(), || Ok(vk.h_beta_g2))?,
            g_gamma_g1: G1Var::new_witness(cs.clone(), || Ok(vk.g_gamma_g1))?,
            h_gamma_g2: G2AffineVar::new_witness(cs.clone(), || Ok(vk.h_gamma_g2))?,
            query: vk
                .query
                .iter()
                .map(|p| G1Var::new_witness(cs.clone(), || Ok(*p)))
                .collect::<Result<_, _>>()?,
        })
    }

    fn allocate_proof(
        cs: ConstraintSystemRef<P::Fp>,
        proof: &Self::Proof,
    ) -> Result<Self::ProofVar, SynthesisError> {
        Ok(Gm17ProofVar {
            a: G1Var::new_witness(cs.clone(), || Ok(proof.a))?,
            b: G2AffineVar::new_witness(cs.clone(), || Ok(proof.b))?,
            c: G1Var::new_witness(cs, || Ok(proof.c))?,
        })
    }

    fn process_verification_key(
        vk: &Self::VerifyingKeyVar,
    ) -> Result<Self::PreparedKeyVar, SynthesisError> {
        Ok(PreparedGm17VkVar {
            g_alpha_g1: vk.g_alpha_g1.clone(),
            g_gamma_g1: vk.g_gamma_g1.clone(),
            h_beta_g2: vk.h_beta_g2.clone(),
            query: vk.query.clone(),
            h_coeffs: precompute_line_coeffs(&vk.h_g2),
            h_beta_coeffs: precompute_line_coeffs(&vk.h_beta_g2),
            h_gamma_coeffs: precompute_line_coeffs(&vk.h_gamma_g2),
        })
    }

    fn online_verify(
        pvk: &Self::PreparedKeyVar,
        input_bits: &[Vec<Boolean<P::Fp>>],
        proof: &Self::ProofVar,
    ) -> Result<Boolean<P::Fp>, SynthesisError> {
        let psi = input_accumulator(&pvk.query, input_bits)?;

        // Knowledge-commitment equation, as a five-pair product with the
        // left side inverted.
        let a_alpha = proof.a.add_unchecked(&pvk.g_alpha_g1)?;
        let b_beta = proof.b.add_unchecked(&pvk.h_beta_g2)?;
        let b_beta_coeffs = precompute_line_coeffs(&b_beta);
        let knowledge = pairing_product_is_one(&[
            MillerPairVar {
                point: a_alpha.negate(),
                coeffs: &b_beta_coeffs,
            },
            MillerPairVar {
                point: pvk.g_alpha_g1.clone(),
                coeffs: &pvk.h_beta_coeffs,
            },
            MillerPairVar {
                point: psi,
                coeffs: &pvk.h_gamma_coeffs,
            },
            MillerPairVar {
                point: proof.c.clone(),
                coeffs: &pvk.h_coeffs,
            },
        ])?;

        // Consistency equation e(A, h^γ) = e(g^γ, B).
        let b_coeffs = precompute_line_coeffs(&proof.b);
        let consistency = pairing_product_is_one(&[
            MillerPairVar {
                point: proof.a.negate(),
                coeffs: &pvk.h_gamma_coeffs,
            },
            MillerPairVar {
                point: pvk.g_gamma_g1.clone(),
                coeffs: &b_coeffs,
            },
        ])?;

        Boolean::kary_and(&[knowledge, consistency])
    }

    fn native_verify(
        vk: &Self::VerifyingKey,
        inputs: &[NestedScalarOf<P>],
        proof: &Self::Proof,
    ) -> bool {
        match GM17::<Bls12<P>>::verify(vk, inputs, proof) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!(error = ?e, "native gm17 verification errored; treating proof as invalid");
                false
            }
        }
    }
}
