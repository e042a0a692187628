use crate::{
    codec::{Codec, validate_original_chunks, validate_shares},
    consts::LEOPARD,
    errors::EdsError,
};

/// Reed-Solomon codec over GF(2^16), using the Leopard FFT algorithm of `reed-solomon-simd`.
///
/// Chunk length must be a non-zero multiple of 2 bytes. The backend keeps its lookup tables
/// process-global, so unlike [`crate::ReedSolomonGf8Codec`] there is nothing worth caching per size.
///
/// Every vector is coded over GF(2^16), whatever its length. Leopard implementations which switch
/// to GF(2^8) for up to 256 shards produce different parity, so squares extended by them can't be
/// verified or repaired with this codec, nor the other way round.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeopardCodec;

impl LeopardCodec {
    /// Maximum number of original shards in a single vector.
    pub const MAX_ORIGINAL_SHARDS: usize = 32768;

    pub fn new() -> Self {
        LeopardCodec
    }
}

impl Codec for LeopardCodec {
    fn encode(&self, data: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, EdsError> {
        let k = validate_original_chunks(data)?;
        reed_solomon_simd::encode(k, k, data).map_err(|err| EdsError::EncodingFailed(err.to_string()))
    }

    fn decode(&self, mut shares: Vec<Option<Vec<u8>>>) -> Result<Vec<Vec<u8>>, EdsError> {
        let (k, present) = validate_shares(&shares)?;
        if present < k {
            return Err(EdsError::TooFewShards);
        }

        // Only missing original shards go through the backend, parity is recomputed from them.
        if shares[..k].iter().any(Option::is_none) {
            let original = shares[..k].iter().enumerate().filter_map(|(idx, share)| share.as_ref().map(|s| (idx, s)));
            let recovery = shares[k..].iter().enumerate().filter_map(|(idx, share)| share.as_ref().map(|s| (idx, s)));

            let restored = reed_solomon_simd::decode(k, k, original, recovery).map_err(|err| match err {
                reed_solomon_simd::Error::NotEnoughShards { .. } => EdsError::TooFewShards,
                err => EdsError::DecodingFailed(err.to_string()),
            })?;

            for (idx, chunk) in restored {
                shares[idx] = Some(chunk);
            }
        }

        if shares[k..].iter().any(Option::is_none) {
            let original = shares[..k]
                .iter()
                .map(|share| share.clone().ok_or_else(|| EdsError::DecodingFailed("original shard left unrestored".to_string())))
                .collect::<Result<Vec<Vec<u8>>, EdsError>>()?;

            let parity = self.encode(&original)?;
            shares[k..].iter_mut().zip(parity).filter(|(share, _)| share.is_none()).for_each(|(share, chunk)| *share = Some(chunk));
        }

        shares
            .into_iter()
            .map(|share| share.ok_or_else(|| EdsError::DecodingFailed("shard left unrestored".to_string())))
            .collect()
    }

    fn max_chunks(&self) -> usize {
        Self::MAX_ORIGINAL_SHARDS * Self::MAX_ORIGINAL_SHARDS
    }

    fn name(&self) -> &'static str {
        LEOPARD
    }
}
