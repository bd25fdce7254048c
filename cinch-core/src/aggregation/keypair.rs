//! Keypair persistence: the wrapping circuit's proving/verification key,
//! generated once per circuit shape and reused across process restarts.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ark_groth16::{ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, RngCore};

use super::generate_trusted_setup;
use crate::error::AggregationError;
use crate::pair::RecursionPair;
use crate::verifier::NestedSnarkGadget;

/// The wrapping circuit's keypair. The verification key is also embedded in
/// the proving key; it is kept separately for cheap access.
pub struct AggregationKeypair<R: RecursionPair> {
    pub proving_key: ProvingKey<R::Wrap>,
    pub verifying_key: VerifyingKey<R::Wrap>,
}

impl<R: RecursionPair> AggregationKeypair<R> {
    /// Run trusted setup for the `(N, num_inputs)` circuit shape.
    pub fn generate<S, const N: usize>(
        num_inputs: usize,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Self, AggregationError>
    where
        S: NestedSnarkGadget<R::Nested>,
    {
        let (proving_key, verifying_key) = generate_trusted_setup::<R, S, N>(num_inputs, rng)?;
        Ok(Self {
            proving_key,
            verifying_key,
        })
    }

    /// Write the proving key (which embeds the verification key) to a file.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AggregationError> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.proving_key.serialize_uncompressed(&mut writer)?;
        Ok(())
    }

    /// Read a keypair previously written by [`Self::save`]. The file is a
    /// locally produced artifact, so point validation is skipped.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AggregationError> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let proving_key =
            ProvingKey::<R::Wrap>::deserialize_uncompressed_unchecked(&mut reader)?;
        let verifying_key = proving_key.vk.clone();
        Ok(Self {
            proving_key,
            verifying_key,
        })
    }

    /// Load the keypair if the file exists, otherwise run setup and persist
    /// the result.
    pub fn load_or_generate<S, const N: usize>(
        path: impl AsRef<Path>,
        num_inputs: usize,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Self, AggregationError>
    where
        S: NestedSnarkGadget<R::Nested>,
    {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!(path = %path.display(), "reusing persisted keypair");
            return Self::load(path);
        }
        tracing::info!(path = %path.display(), "no persisted keypair; running trusted setup");
        let keypair = Self::generate::<S, N>(num_inputs, rng)?;
        keypair.save(path)?;
        Ok(keypair)
    }
}
