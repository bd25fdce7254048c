//! The aggregation circuit: N nested-verifier slots, the key digest binding,
//! and the primary-input layout.
//!
//! Primary inputs, in order:
//! `[vk_digest, packed_validity_bits, input[0][0..k], ..., input[N-1][0..k]]`
//! with `k` the per-proof primary-input count fixed at construction. Only
//! witness values vary between proving calls; the constraint shape is a pure
//! function of `(N, k)`.

use std::marker::PhantomData;

use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::error::AggregationError;
use crate::gadgets::bits::{le_bits_to_fp, unpack_into_bits};
use crate::gadgets::fields::fpc;
use crate::hash::{compute_vk_digest, digest_params, gadget::digest_var};
use crate::pair::{
    embed_nested_scalar, nested_scalar_bits, NestedScalar, RecursionPair, WrapScalar,
};
use crate::verifier::{NestedScalarOf, NestedSnarkGadget};

use ark_ec::bls12::Bls12Config;
use ark_ff::{Field, Zero};

/// One proof slot's witness material: the nested proof and its primary
/// inputs (in the nested scalar field).
pub struct BatchEntry<P: Bls12Config, S: NestedSnarkGadget<P>> {
    pub proof: S::Proof,
    pub inputs: Vec<NestedScalarOf<P>>,
}

impl<P: Bls12Config, S: NestedSnarkGadget<P>> Clone for BatchEntry<P, S> {
    fn clone(&self) -> Self {
        Self {
            proof: self.proof.clone(),
            inputs: self.inputs.clone(),
        }
    }
}

/// The aggregation circuit over batch size `N`. Construction validates
/// shape; synthesis assumes it.
pub struct AggregationCircuit<R, S, const N: usize>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    nested_vk: S::VerifyingKey,
    entries: Vec<BatchEntry<R::Nested, S>>,
    num_inputs: usize,
    _pair: PhantomData<R>,
}

impl<R, S, const N: usize> AggregationCircuit<R, S, N>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    /// Build a proving-ready circuit. Rejects shape mismatches: a wrong
    /// per-proof input count is caught here, before any proving work.
    pub fn new(
        nested_vk: S::VerifyingKey,
        entries: Vec<BatchEntry<R::Nested, S>>,
        num_inputs: usize,
    ) -> Result<Self, AggregationError> {
        let declared = S::num_inputs(&nested_vk);
        if declared != num_inputs {
            return Err(AggregationError::InputCountMismatch {
                expected: num_inputs,
                got: declared,
            });
        }
        if entries.len() != N {
            return Err(AggregationError::InputCountMismatch {
                expected: N,
                got: entries.len(),
            });
        }
        for entry in &entries {
            if entry.inputs.len() != num_inputs {
                return Err(AggregationError::InputCountMismatch {
                    expected: num_inputs,
                    got: entry.inputs.len(),
                });
            }
        }
        Ok(Self {
            nested_vk,
            entries,
            num_inputs,
            _pair: PhantomData,
        })
    }

    /// A value-free circuit fixing the constraint shape for `(N, k)`; used
    /// by trusted setup and the constraint export. Placeholder values are
    /// never evaluated in setup mode.
    pub fn blank(num_inputs: usize) -> Self {
        let entry = BatchEntry::<R::Nested, S> {
            proof: S::placeholder_proof(),
            inputs: vec![NestedScalar::<R>::zero(); num_inputs],
        };
        Self {
            nested_vk: S::placeholder_vk(num_inputs),
            entries: vec![entry; N],
            num_inputs,
            _pair: PhantomData,
        }
    }

    pub fn num_inputs_per_proof(&self) -> usize {
        self.num_inputs
    }

    /// Primary-input count of the wrapping proof: digest, packed bits, and
    /// `N * k` embedded nested inputs.
    pub fn num_primary_inputs(&self) -> usize {
        2 + N * self.num_inputs
    }

    /// Native validity of each slot; this is what the packed-bit witness
    /// will decode to.
    pub fn validity_bits(&self) -> Vec<bool> {
        self.entries
            .iter()
            .map(|e| S::native_verify(&self.nested_vk, &e.inputs, &e.proof))
            .collect()
    }

    fn packed_validity_value(&self) -> WrapScalar<R> {
        let mut packed = WrapScalar::<R>::zero();
        let mut coeff = WrapScalar::<R>::from(1u64);
        for valid in self.validity_bits() {
            if valid {
                packed += coeff;
            }
            coeff.double_in_place();
        }
        packed
    }

    /// The full primary-input assignment, as the wrapping verifier expects
    /// it.
    pub fn public_inputs(&self) -> Result<Vec<WrapScalar<R>>, AggregationError> {
        let mut inputs = Vec::with_capacity(self.num_primary_inputs());
        inputs.push(compute_vk_digest::<R, S>(&self.nested_vk, self.num_inputs)?);
        inputs.push(self.packed_validity_value());
        for entry in &self.entries {
            for x in &entry.inputs {
                inputs.push(embed_nested_scalar::<R>(x));
            }
        }
        Ok(inputs)
    }
}

impl<R, S, const N: usize> ConstraintSynthesizer<WrapScalar<R>> for AggregationCircuit<R, S, N>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    fn generate_constraints(
        self,
        cs: ConstraintSystemRef<WrapScalar<R>>,
    ) -> Result<(), SynthesisError> {
        let k = self.num_inputs;

        // Primary inputs, in layout order.
        let digest_input = FpVar::new_input(cs.clone(), || {
            compute_vk_digest::<R, S>(&self.nested_vk, k)
                .map_err(|_| SynthesisError::AssignmentMissing)
        })?;
        let packed_input = FpVar::new_input(cs.clone(), || Ok(self.packed_validity_value()))?;
        let mut input_vars = Vec::with_capacity(N * k);
        for entry in &self.entries {
            for j in 0..k {
                input_vars.push(FpVar::new_input(cs.clone(), || {
                    Ok(embed_nested_scalar::<R>(&entry.inputs[j]))
                })?);
            }
        }

        // Witness the key once; bind its digest to the primary input.
        let vk_var = S::allocate_vk(cs.clone(), &self.nested_vk)?;
        let params = digest_params::<R>();
        let mut preimage = vec![fpc(WrapScalar::<R>::from(k as u64))];
        preimage.extend(S::digest_preimage_var(&vk_var));
        digest_var(&params, &preimage)?.enforce_equal(&digest_input)?;

        let pvk = S::process_verification_key(&vk_var)?;

        // One verifier slot per nested proof. Each primary input is
        // bit-decomposed at the nested scalar width, tying the public value
        // to the scalar the verifier consumes.
        let nbits = nested_scalar_bits::<R>();
        let mut validity: Vec<Boolean<WrapScalar<R>>> = Vec::with_capacity(N);
        for (slot, entry) in self.entries.iter().enumerate() {
            let proof_var = S::allocate_proof(cs.clone(), &entry.proof)?;
            let bits = input_vars[slot * k..(slot + 1) * k]
                .iter()
                .map(|v| unpack_into_bits(v, nbits))
                .collect::<Result<Vec<_>, _>>()?;
            validity.push(S::online_verify(&pvk, &bits, &proof_var)?);
        }

        // Pack the slot bits, low bit = slot 0.
        le_bits_to_fp(&validity).enforce_equal(&packed_input)?;
        Ok(())
    }
}
