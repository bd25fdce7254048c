//! Groth16 verifier strategy: one combined four-pairing check.
//!
//! The verification equation `e(A, B) = e(α, β) · e(acc, γ) · e(C, δ)` is
//! evaluated as a single four-pair Miller product with the `A` argument
//! negated, so the whole equation pays one final exponentiation.

use ark_ec::bls12::{Bls12, Bls12Config, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_groth16::{Groth16, Proof, VerifyingKey};
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

/// Marker type selecting Groth16 as the nested proof system.
pub struct Groth16Nested;

/// Witnessed verification key: one variable per affine coordinate.
pub struct Groth16VkVar<P: Bls12Config> {
    pub alpha_g1: G1Var<P>,
    pub beta_g2: G2AffineVar<P>,
    pub gamma_g2: G2AffineVar<P>,
    pub delta_g2: G2AffineVar<P>,
    pub gamma_abc_g1: Vec<G1Var<P>>,
}

/// Key in precomputed form: line-coefficient schedules for the three fixed
/// G2 elements, plus the G1 material the online check consumes directly.
pub struct PreparedGroth16VkVar<P: Bls12Config> {
    alpha_g1: G1Var<P>,
    gamma_abc_g1: Vec<G1Var<P>>,
    beta_coeffs: Vec<LineCoeffsVar<P>>,
    gamma_coeffs: Vec<LineCoeffsVar<P>>,
    delta_coeffs: Vec<LineCoeffsVar<P>>,
}

pub struct Groth16ProofVar<P: Bls12Config> {
    pub a: G1Var<P>,
    pub b: G2AffineVar<P>,
    pub c: G1Var<P>,
}

impl<P: Bls12Config> NestedSnarkGadget<P> for Groth16Nested {
    const NAME: &'static str = "groth16";

    type VerifyingKey = VerifyingKey<Bls12<P>>;
    type Proof = Proof<Bls12<P>>;
    type VerifyingKeyVar = Groth16VkVar<P>;
    type PreparedKeyVar = PreparedGroth16VkVar<P>;
    type ProofVar = Groth16ProofVar<P>;

    fn num_inputs(vk: &Self::VerifyingKey) -> usize {
        vk.gamma_abc_g1.len().saturating_sub(1)
    }

    fn placeholder_vk(num_inputs: usize) -> Self::VerifyingKey {
        VerifyingKey {
            alpha_g1: G1Affine::<P>::generator(),
            beta_g2: G2Affine::<P>::generator(),
            gamma_g2: G2Affine::<P>::generator(),
            delta_g2: G2Affine::<P>::generator(),
            gamma_abc_g1: vec![G1Affine::<P>::generator(); num_inputs + 1],
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
        let mut out = Vec::with_capacity(14 + 2 * vk.gamma_abc_g1.len());
        push_g1_coords::<P>(&mut out, &vk.alpha_g1)?;
        push_g2_coords::<P>(&mut out, &vk.beta_g2)?;
        push_g2_coords::<P>(&mut out, &vk.gamma_g2)?;
        push_g2_coords::<P>(&mut out, &vk.delta_g2)?;
        for p in &vk.gamma_abc_g1 {
            push_g1_coords::<P>(&mut out, p)?;
        }
        Ok(out)
    }

    fn digest_preimage_var(vk: &Self::VerifyingKeyVar) -> Vec<FpVar<P::Fp>> {
        let mut out = Vec::with_capacity(14 + 2 * vk.gamma_abc_g1.len());
        push_g1_coord_vars::<P>(&mut out, &vk.alpha_g1);
        push_g2_coord_vars::<P>(&mut out, &vk.beta_g2);
        push_g2_coord_vars::<P>(&mut out, &vk.gamma_g2);
        push_g2_coord_vars::<P>(&mut out, &vk.delta_g2);
        for p in &vk.gamma_abc_g1 {
            push_g1_coord_vars::<P>(&mut out, p);
        }
        out
    }

    fn allocate_vk(
        cs: ConstraintSystemRef<P::Fp>,
        vk: &Self::VerifyingKey,
    ) -> Result<Self::VerifyingKeyVar, SynthesisError> {
        Ok(Groth16VkVar {
            alpha_g1: G1Var::new_witness(cs.clone(), || Ok(vk.alpha_g1))?,
            beta_g2: G2AffineVar::new_witness(cs.clone(), || Ok(vk.beta_g2))?,
            gamma_g2: G2AffineVar::new_witness(cs.clone(), || Ok(vk.gamma_g2))?,
            delta_g2: G2AffineVar::new_witness(cs.clone(), || Ok(vk.delta_g2))?,
            gamma_abc_g1: vk
                .gamma_abc_g1
                .iter()
                .map(|p| G1Var::new_witness(cs.clone(), || Ok(*p)))
                .collect::<Result<_, _>>()?,
        })
    }

    fn allocate_proof(
        cs: ConstraintSystemRef<P::Fp>,
        proof: &Self::Proof,
    ) -> Result<Self::ProofVar, SynthesisError> {
        Ok(Groth16ProofVar {
            a: G1Var::new_witness(cs.clone(), || Ok(proof.a))?,
            b: G2AffineVar::new_witness(cs.clone(), || Ok(proof.b))?,
            c: G1Var::new_witness(cs, || Ok(proof.c))?,
        })
    }

    fn process_verification_key(
        vk: &Self::VerifyingKeyVar,
    ) -> Result<Self::PreparedKeyVar, SynthesisError> {
        Ok(PreparedGroth16VkVar {
            alpha_g1: vk.alpha_g1.clone(),
            gamma_abc_g1: vk.gamma_abc_g1.clone(),
            beta_coeffs: precompute_line_coeffs(&vk.beta_g2),
            gamma_coeffs: precompute_line_coeffs(&vk.gamma_g2),
            delta_coeffs: precompute_line_coeffs(&vk.delta_g2),
        })
    }

    fn online_verify(
        pvk: &Self::PreparedKeyVar,
        input_bits: &[Vec<Boolean<P::Fp>>],
        proof: &Self::ProofVar,
    ) -> Result<Boolean<P::Fp>, SynthesisError> {
        let acc = input_accumulator(&pvk.gamma_abc_g1, input_bits)?;
        let b_coeffs = precompute_line_coeffs(&proof.b);
        pairing_product_is_one(&[
            MillerPairVar {
                point: proof.a.negate(),
                coeffs: &b_coeffs,
            },
            MillerPairVar {
                point: pvk.alpha_g1.clone(),
                coeffs: &pvk.beta_coeffs,
            },
            MillerPairVar {
                point: acc,
                coeffs: &pvk.gamma_coeffs,
            },
            MillerPairVar {
                point: proof.c.clone(),
                coeffs: &pvk.delta_coeffs,
            },
        ])
    }

    fn native_verify(
        vk: &Self::VerifyingKey,
        inputs: &[NestedScalarOf<P>],
        proof: &Self::Proof,
    ) -> bool {
        match Groth16::<Bls12<P>>::verify(vk, inputs, proof) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::debug!(error = ?e, "native groth16 verification errored; treating proof as invalid");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gadgets::bits::unpack_into_bits;
    use ark_bls12_377::{Bls12_377, Config, Fq, Fr};
    use ark_ff::{BigInteger, PrimeField, UniformRand};
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::{
        ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef as CsRef, SynthesisError,
    };
    use ark_snark::CircuitSpecificSetupSNARK;
    use ark_std::test_rng;

    /// k-input toy circuit: proves knowledge of w with x_i = w * (i + 2).
    #[derive(Clone)]
    pub(crate) struct MulCircuit {
        pub w: Option<Fr>,
        pub num_inputs: usize,
    }

    impl ConstraintSynthesizer<Fr> for MulCircuit {
        fn generate_constraints(self, cs: CsRef<Fr>) -> Result<(), SynthesisError> {
            use ark_relations::lc;
            let w = cs.new_witness_variable(|| {
                self.w.ok_or(SynthesisError::AssignmentMissing)
            })?;
            for i in 0..self.num_inputs {
                let factor = Fr::from(i as u64 + 2);
                let x = cs.new_input_variable(|| {
                    self.w
                        .map(|w| w * factor)
                        .ok_or(SynthesisError::AssignmentMissing)
                })?;
                cs.enforce_constraint(lc!() + w, lc!() + (factor, ark_relations::r1cs::Variable::One), lc!() + x)?;
            }
            Ok(())
        }
    }

    pub(crate) fn sample_proof(
        num_inputs: usize,
        seed_w: u64,
    ) -> (VerifyingKey<Bls12_377>, Proof<Bls12_377>, Vec<Fr>) {
        let mut rng = test_rng();
        let (pk, vk) = Groth16::<Bls12_377>::setup(
            MulCircuit {
                w: None,
                num_inputs,
            },
            &mut rng,
        )
        .unwrap();
        let w = Fr::from(seed_w) * Fr::rand(&mut rng);
        let inputs: Vec<Fr> = (0..num_inputs)
            .map(|i| w * Fr::from(i as u64 + 2))
            .collect();
        let proof = Groth16::<Bls12_377>::prove(
            &pk,
            MulCircuit {
                w: Some(w),
                num_inputs,
            },
            &mut rng,
        )
        .unwrap();
        (vk, proof, inputs)
    }

    fn verify_in_circuit(
        vk: &VerifyingKey<Bls12_377>,
        proof: &Proof<Bls12_377>,
        inputs: &[Fr],
    ) -> bool {
        let cs = ConstraintSystem::<Fq>::new_ref();
        let vk_var = Groth16Nested::allocate_vk(cs.clone(), vk).unwrap();
        let pvk = <Groth16Nested as NestedSnarkGadget<Config>>::process_verification_key(&vk_var)
            .unwrap();
        let proof_var = Groth16Nested::allocate_proof(cs.clone(), proof).unwrap();

        let bits: Vec<Vec<_>> = inputs
            .iter()
            .map(|x| {
                let embedded =
                    Fq::from_le_bytes_mod_order(&x.into_bigint().to_bytes_le());
                let var =
                    FpVar::new_witness(cs.clone(), || Ok(embedded)).unwrap();
                unpack_into_bits(&var, Fr::MODULUS_BIT_SIZE as usize).unwrap()
            })
            .collect();

        let bit = Groth16Nested::online_verify(&pvk, &bits, &proof_var).unwrap();
        assert!(cs.is_satisfied().unwrap());
        bit.value().unwrap()
    }

    #[test]
    fn valid_proof_sets_result_bit() {
        let (vk, proof, inputs) = sample_proof(2, 7);
        assert!(Groth16Nested::native_verify(&vk, &inputs, &proof));
        assert!(verify_in_circuit(&vk, &proof, &inputs));
    }

    #[test]
    fn perturbed_input_clears_result_bit() {
        let (vk, proof, mut inputs) = sample_proof(2, 7);
        inputs[1] += Fr::from(1u64);
        assert!(!Groth16Nested::native_verify(&vk, &inputs, &proof));
        assert!(!verify_in_circuit(&vk, &proof, &inputs));
    }
}
