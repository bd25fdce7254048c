//! The service façade the RPC layer drives: application registry, proof
//! submission, and batch aggregation.
//!
//! Pools are independently locked: submissions to different applications
//! proceed concurrently, mutations of one pool are serialized. Proving runs
//! outside any pool lock; it is long-running and CPU-bound, and hosts are
//! expected to call it from a worker thread.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use ark_groth16::VerifyingKey;
use ark_std::rand::{CryptoRng, RngCore};

use super::{ApplicationPool, TxToAggregate};
use crate::aggregation::{prove, AggregateProof, AggregationKeypair, BatchEntry};
use crate::error::{AggregationError, PoolError};
use crate::hash::compute_vk_digest;
use crate::pair::{RecursionPair, WrapScalar};
use crate::verifier::{NestedScalarOf, NestedSnarkGadget};

/// An aggregated batch: the wrapping proof plus the application parameters
/// of the transactions actually consumed (padding slots are not re-emitted).
pub struct AggregatedBatch<R: RecursionPair> {
    pub proof: AggregateProof<R>,
    pub parameters: Vec<Vec<u8>>,
}

/// The aggregation service for one circuit shape: a wrapping keypair and
/// one admission pool per registered application.
pub struct Aggregator<R, S, const N: usize>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    keypair: AggregationKeypair<R>,
    num_inputs: usize,
    pools: RwLock<HashMap<String, Mutex<ApplicationPool<R::Nested, S>>>>,
}

impl<R, S, const N: usize> Aggregator<R, S, N>
where
    R: RecursionPair,
    S: NestedSnarkGadget<R::Nested>,
{
    /// Wrap an existing keypair (typically from
    /// [`AggregationKeypair::load_or_generate`]).
    pub fn new(keypair: AggregationKeypair<R>, num_inputs: usize) -> Self {
        Self {
            keypair,
            num_inputs,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Run trusted setup and start with an empty registry.
    pub fn setup(
        num_inputs: usize,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Self, AggregationError> {
        let keypair = AggregationKeypair::generate::<S, N>(num_inputs, rng)?;
        Ok(Self::new(keypair, num_inputs))
    }

    /// The wrapping circuit's verification key, for external verification of
    /// aggregated proofs.
    pub fn verification_key(&self) -> &VerifyingKey<<R as RecursionPair>::Wrap> {
        &self.keypair.verifying_key
    }

    /// Register an application under a unique name. Returns the key digest
    /// clients use to identify the key inside aggregated proofs. Rejects
    /// duplicate names and keys whose input count does not fit the circuit;
    /// nothing is mutated on rejection.
    #[tracing::instrument(skip_all, fields(app = name))]
    pub fn register_application(
        &self,
        name: &str,
        nested_vk: S::VerifyingKey,
    ) -> Result<WrapScalar<R>, AggregationError> {
        let declared = S::num_inputs(&nested_vk);
        if declared != self.num_inputs {
            return Err(AggregationError::InputCountMismatch {
                expected: self.num_inputs,
                got: declared,
            });
        }
        // Also validates the key material (rejects points at infinity).
        let digest = compute_vk_digest::<R, S>(&nested_vk, self.num_inputs)?;

        let mut pools = self.pools.write().expect("pool registry lock poisoned");
        if pools.contains_key(name) {
            return Err(PoolError::DuplicateApplication(name.to_string()).into());
        }
        pools.insert(
            name.to_string(),
            Mutex::new(ApplicationPool::new(nested_vk)),
        );
        tracing::info!("application registered");
        Ok(digest)
    }

    /// Admit a transaction into its application's pool.
    #[tracing::instrument(skip_all, fields(app = name, fee))]
    pub fn submit_transaction(
        &self,
        name: &str,
        proof: S::Proof,
        inputs: Vec<NestedScalarOf<R::Nested>>,
        parameters: Vec<u8>,
        fee: u64,
    ) -> Result<(), AggregationError> {
        let pools = self.pools.read().expect("pool registry lock poisoned");
        let pool = pools
            .get(name)
            .ok_or_else(|| PoolError::UnknownApplication(name.to_string()))?;
        let result = pool
            .lock()
            .expect("pool lock poisoned")
            .add_tx(proof, inputs, parameters, fee);
        result
    }

    /// Pending-transaction count for an application.
    pub fn pending_transactions(&self, name: &str) -> Result<usize, AggregationError> {
        let pools = self.pools.read().expect("pool registry lock poisoned");
        let pool = pools
            .get(name)
            .ok_or_else(|| PoolError::UnknownApplication(name.to_string()))?;
        let count = pool.lock().expect("pool lock poisoned").len();
        Ok(count)
    }

    /// Pull the next batch for an application and aggregate it.
    ///
    /// Fails with a retryable [`AggregationError::InsufficientPendingEntries`]
    /// when the pool is empty. A partial batch (fewer than `N` pending
    /// entries) is padded by repeating the last popped transaction: padding
    /// entries are real proofs, so they cannot clear validity bits, and
    /// their parameters are not re-emitted.
    #[tracing::instrument(skip_all, fields(app = name))]
    pub fn generate_aggregated_transaction(
        &self,
        name: &str,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<AggregatedBatch<R>, AggregationError> {
        let (nested_vk, batch) = {
            let pools = self.pools.read().expect("pool registry lock poisoned");
            let pool = pools
                .get(name)
                .ok_or_else(|| PoolError::UnknownApplication(name.to_string()))?;
            let mut pool = pool.lock().expect("pool lock poisoned");

            let mut out: Vec<Option<TxToAggregate<R::Nested, S>>> = vec![None; N];
            let count = pool.get_next_batch(&mut out);
            if count == 0 {
                return Err(AggregationError::InsufficientPendingEntries(
                    name.to_string(),
                ));
            }
            let batch: Vec<TxToAggregate<R::Nested, S>> = out
                .into_iter()
                .take(count)
                .map(|tx| tx.expect("batch slot within count is filled"))
                .collect();
            (pool.verifying_key().clone(), batch)
        };
        tracing::debug!(popped = batch.len(), "batch extracted");

        let mut entries: Vec<BatchEntry<R::Nested, S>> = batch
            .iter()
            .map(|tx| BatchEntry {
                proof: tx.proof.clone(),
                inputs: tx.inputs.clone(),
            })
            .collect();
        let pad = entries.last().cloned().expect("batch is non-empty");
        entries.resize(N, pad);

        let proof = prove::<R, S, N>(&self.keypair.proving_key, &nested_vk, entries, rng)?;
        Ok(AggregatedBatch {
            proof,
            parameters: batch.into_iter().map(|tx| tx.parameters).collect(),
        })
    }
}
