use crate::{
    codec::{Codec, EncoderCache, validate_original_chunks, validate_shares},
    consts::RS_GF8,
    errors::EdsError,
};
use reed_solomon_erasure::galois_8::ReedSolomon;
use std::sync::Arc;

/// Classic Reed-Solomon codec over GF(2^8), backed by `reed-solomon-erasure`.
///
/// Building the encoding matrix for `k` data shards is costly, so encoders are kept in a cache keyed
/// by `k` for the lifetime of the codec.
pub struct ReedSolomonGf8Codec {
    cache: EncoderCache<ReedSolomon>,
}

impl ReedSolomonGf8Codec {
    /// GF(2^8) allows at most 256 shards, original and parity together.
    pub const MAX_ORIGINAL_SHARDS: usize = 128;

    pub fn new() -> Self {
        ReedSolomonGf8Codec { cache: EncoderCache::new() }
    }

    fn encoder(&self, k: usize) -> Result<Arc<ReedSolomon>, EdsError> {
        self.cache
            .get_or_try_init(k, || ReedSolomon::new(k, k).map_err(|err| EdsError::EncodingFailed(format!("{:?}", err))))
    }
}

impl Default for ReedSolomonGf8Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for ReedSolomonGf8Codec {
    fn encode(&self, data: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, EdsError> {
        let k = validate_original_chunks(data)?;
        let encoder = self.encoder(k)?;

        let mut shards = Vec::with_capacity(2 * k);
        shards.extend_from_slice(data);
        shards.resize(2 * k, vec![0u8; data[0].len()]);

        encoder.encode(&mut shards).map_err(|err| EdsError::EncodingFailed(format!("{:?}", err)))?;
        Ok(shards.split_off(k))
    }

    fn decode(&self, mut shares: Vec<Option<Vec<u8>>>) -> Result<Vec<Vec<u8>>, EdsError> {
        let (k, present) = validate_shares(&shares)?;
        if present < k {
            return Err(EdsError::TooFewShards);
        }

        let encoder = self.encoder(k).map_err(|err| EdsError::DecodingFailed(err.to_string()))?;
        encoder.reconstruct(&mut shares).map_err(|err| match err {
            reed_solomon_erasure::Error::TooFewShardsPresent => EdsError::TooFewShards,
            err => EdsError::DecodingFailed(format!("{:?}", err)),
        })?;

        shares
            .into_iter()
            .map(|share| share.ok_or_else(|| EdsError::DecodingFailed("shard left unrestored".to_string())))
            .collect()
    }

    fn max_chunks(&self) -> usize {
        Self::MAX_ORIGINAL_SHARDS * Self::MAX_ORIGINAL_SHARDS
    }

    fn name(&self) -> &'static str {
        RS_GF8
    }
}
