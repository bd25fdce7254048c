//! Per-application admission pool: pending transactions ordered by fee.
//!
//! One pool per registered application. Insertion is O(log n); batch
//! extraction pops the highest-fee entries, FIFO among equal fees (by a
//! monotone admission sequence number). The pool never blocks and holds no
//! persistent state.

pub mod service;

pub use service::{AggregatedBatch, Aggregator};

use std::collections::BinaryHeap;

use ark_ec::bls12::Bls12Config;

use crate::error::AggregationError;
use crate::verifier::{NestedScalarOf, NestedSnarkGadget};

/// A pending nested proof with its application parameters and priority.
pub struct TxToAggregate<P: Bls12Config, S: NestedSnarkGadget<P>> {
    pub proof: S::Proof,
    pub inputs: Vec<NestedScalarOf<P>>,
    /// Opaque application payload, re-emitted alongside the aggregated
    /// output. Never interpreted here.
    pub parameters: Vec<u8>,
    pub fee: u64,
    /// Admission order, used as the FIFO tie-break among equal fees.
    seq: u64,
}

impl<P: Bls12Config, S: NestedSnarkGadget<P>> Clone for TxToAggregate<P, S> {
    fn clone(&self) -> Self {
        Self {
            proof: self.proof.clone(),
            inputs: self.inputs.clone(),
            parameters: self.parameters.clone(),
            fee: self.fee,
            seq: self.seq,
        }
    }
}

// Ordering is (fee descending, admission order ascending); the heap is a
// max-heap, so greater = extracted first.
impl<P: Bls12Config, S: NestedSnarkGadget<P>> PartialEq for TxToAggregate<P, S> {
    fn eq(&self, other: &Self) -> bool {
        self.fee == other.fee && self.seq == other.seq
    }
}

impl<P: Bls12Config, S: NestedSnarkGadget<P>> Eq for TxToAggregate<P, S> {}

impl<P: Bls12Config, S: NestedSnarkGadget<P>> PartialOrd for TxToAggregate<P, S> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<P: Bls12Config, S: NestedSnarkGadget<P>> Ord for TxToAggregate<P, S> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.fee
            .cmp(&other.fee)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// One application's verification key and its pending-transaction queue.
/// The key is immutable after registration; the queue changes only through
/// [`ApplicationPool::add_tx`] and [`ApplicationPool::get_next_batch`].
pub struct ApplicationPool<P: Bls12Config, S: NestedSnarkGadget<P>> {
    vk: S::VerifyingKey,
    num_inputs: usize,
    queue: BinaryHeap<TxToAggregate<P, S>>,
    next_seq: u64,
}

impl<P: Bls12Config, S: NestedSnarkGadget<P>> Clone for ApplicationPool<P, S> {
    fn clone(&self) -> Self {
        Self {
            vk: self.vk.clone(),
            num_inputs: self.num_inputs,
            queue: self.queue.clone(),
            next_seq: self.next_seq,
        }
    }
}

impl<P: Bls12Config, S: NestedSnarkGadget<P>> ApplicationPool<P, S> {
    pub fn new(vk: S::VerifyingKey) -> Self {
        let num_inputs = S::num_inputs(&vk);
        Self {
            vk,
            num_inputs,
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn verifying_key(&self) -> &S::VerifyingKey {
        &self.vk
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Admit a transaction. Rejects a primary-input count that does not
    /// match the application's key; no state changes on rejection.
    pub fn add_tx(
        &mut self,
        proof: S::Proof,
        inputs: Vec<NestedScalarOf<P>>,
        parameters: Vec<u8>,
        fee: u64,
    ) -> Result<(), AggregationError> {
        if inputs.len() != self.num_inputs {
            return Err(AggregationError::InputCountMismatch {
                expected: self.num_inputs,
                got: inputs.len(),
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(TxToAggregate {
            proof,
            inputs,
            parameters,
            fee,
            seq,
        });
        Ok(())
    }

    /// Pop up to `out.len()` highest-priority entries into the caller's
    /// buffer and return how many were written. Slots past the returned
    /// count are left untouched and must not be read. Returns immediately
    /// with whatever is available; never waits.
    pub fn get_next_batch(&mut self, out: &mut [Option<TxToAggregate<P, S>>]) -> usize {
        let mut count = 0;
        for slot in out.iter_mut() {
            match self.queue.pop() {
                Some(tx) => {
                    *slot = Some(tx);
                    count += 1;
                }
                None => break,
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::groth16::Groth16Nested;
    use ark_bls12_377::Config;

    type Pool = ApplicationPool<Config, Groth16Nested>;

    fn pool_with_fees(fees: &[u64]) -> Pool {
        let vk = <Groth16Nested as NestedSnarkGadget<Config>>::placeholder_vk(1);
        let proof = <Groth16Nested as NestedSnarkGadget<Config>>::placeholder_proof();
        let mut pool = Pool::new(vk);
        for &fee in fees {
            pool.add_tx(
                proof.clone(),
                vec![Default::default()],
                fee.to_le_bytes().to_vec(),
                fee,
            )
            .unwrap();
        }
        pool
    }

    fn drain_fees(pool: &mut Pool, batch: usize) -> Vec<u64> {
        let mut out: Vec<Option<TxToAggregate<Config, Groth16Nested>>> = vec![None; batch];
        let count = pool.get_next_batch(&mut out);
        out.into_iter().take(count).map(|tx| tx.unwrap().fee).collect()
    }

    #[test]
    fn batches_come_out_in_descending_fee_order() {
        let mut pool = pool_with_fees(&[1, 20, 12, 3, 120]);
        assert_eq!(drain_fees(&mut pool, 2), vec![120, 20]);
        assert_eq!(pool.len(), 3);
        assert_eq!(drain_fees(&mut pool, 2), vec![12, 3]);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn equal_fees_are_fifo() {
        let mut pool = pool_with_fees(&[]);
        let proof = <Groth16Nested as NestedSnarkGadget<Config>>::placeholder_proof();
        for tag in 0u8..4 {
            pool.add_tx(proof.clone(), vec![Default::default()], vec![tag], 5)
                .unwrap();
        }
        let mut out: Vec<Option<TxToAggregate<Config, Groth16Nested>>> = vec![None; 4];
        assert_eq!(pool.get_next_batch(&mut out), 4);
        let tags: Vec<u8> = out.into_iter().map(|tx| tx.unwrap().parameters[0]).collect();
        assert_eq!(tags, vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_pool_extraction_touches_nothing() {
        let mut pool = pool_with_fees(&[]);
        let mut out: Vec<Option<TxToAggregate<Config, Groth16Nested>>> = vec![None; 3];
        assert_eq!(pool.get_next_batch(&mut out), 0);
        assert!(out.iter().all(|slot| slot.is_none()));
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn partial_batch_reports_true_count() {
        let mut pool = pool_with_fees(&[9, 4]);
        let mut out: Vec<Option<TxToAggregate<Config, Groth16Nested>>> = vec![None; 4];
        assert_eq!(pool.get_next_batch(&mut out), 2);
        assert!(out[2].is_none() && out[3].is_none());
    }

    #[test]
    fn wrong_input_count_is_rejected_without_mutation() {
        let mut pool = pool_with_fees(&[]);
        let proof = <Groth16Nested as NestedSnarkGadget<Config>>::placeholder_proof();
        let err = pool.add_tx(proof, vec![], vec![], 1).unwrap_err();
        assert!(matches!(
            err,
            AggregationError::InputCountMismatch {
                expected: 1,
                got: 0
            }
        ));
        assert!(pool.is_empty());
    }
}
