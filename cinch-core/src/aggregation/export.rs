//! Structured export of the constraint system for debugging and audit.

use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode,
};
use serde::Serialize;

use super::AggregationCircuit;
use crate::error::AggregationError;
use crate::pair::{RecursionPair, WrapScalar};
use crate::verifier::NestedSnarkGadget;

/// Shape summary of one aggregation circuit instantiation.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintSummary {
    pub pair: &'static str,
    pub system: &'static str,
    pub batch_size: usize,
    pub inputs_per_proof: usize,
    pub primary_inputs: usize,
    pub witness_variables: usize,
    pub constraints: usize,
}

impl ConstraintSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Synthesize a blank circuit in setup mode and report its shape.
pub fn constraint_summary<R, S, const N: usize>(
    num_inputs: usize,
) -> Result<ConstraintSummary, AggregationError>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    let cs = ConstraintSystem::<WrapScalar<R>>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    cs.set_mode(SynthesisMode::Setup);
    AggregationCircuit::<R, S, N>::blank(num_inputs).generate_constraints(cs.clone())?;

    Ok(ConstraintSummary {
        pair: R::NAME,
        system: S::NAME,
        batch_size: N,
        inputs_per_proof: num_inputs,
        // The constant-one variable is not a primary input.
        primary_inputs: cs.num_instance_variables() - 1,
        witness_variables: cs.num_witness_variables(),
        constraints: cs.num_constraints(),
    })
}
