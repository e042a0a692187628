use crate::{errors::EdsError, leopard::LeopardCodec, rs_gf8::ReedSolomonGf8Codec};
use once_cell::sync::OnceCell;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

/// An erasure code extending `k` equal-length chunks with `k` parity chunks, and recovering all `2k`
/// chunks from any `k` of them.
pub trait Codec: Send + Sync {
    /// Computes `data.len()` parity chunks for the given original chunks.
    ///
    /// All chunks must be non-empty and of equal length. Output is deterministic for a fixed input.
    fn encode(&self, data: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, EdsError>;

    /// Reconstructs every absent entry of `shares`, which holds `k` original chunks followed by `k`
    /// parity chunks. Present entries are returned untouched.
    ///
    /// Returns `EdsError::TooFewShards` when fewer than `k` entries are present.
    fn decode(&self, shares: Vec<Option<Vec<u8>>>) -> Result<Vec<Vec<u8>>, EdsError>;

    /// Maximum number of chunks in the original data square this codec can extend.
    fn max_chunks(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Returns `k` if `data` is a valid, non-empty set of equal-length original chunks.
pub(crate) fn validate_original_chunks(data: &[Vec<u8>]) -> Result<usize, EdsError> {
    let first = data.first().ok_or_else(|| EdsError::EncodingFailed("no chunks to encode".to_string()))?;
    if first.is_empty() {
        return Err(EdsError::EmptyChunk);
    }

    if let Some(chunk) = data.iter().find(|chunk| chunk.len() != first.len()) {
        return Err(EdsError::ChunkSizeMismatch {
            expected: first.len(),
            got: chunk.len(),
        });
    }

    Ok(data.len())
}

/// Returns `(k, present)` for a share vector handed to `Codec::decode`.
pub(crate) fn validate_shares(shares: &[Option<Vec<u8>>]) -> Result<(usize, usize), EdsError> {
    if shares.is_empty() || shares.len() % 2 != 0 {
        return Err(EdsError::DecodingFailed(format!("expected even, non-zero number of shares, got {}", shares.len())));
    }

    let present = shares.iter().filter(|share| share.is_some()).count();
    Ok((shares.len() / 2, present))
}

/// Per shard count cache of expensive-to-build encoders.
///
/// Lookups of an existing entry only take the read lock. Populating a missing entry happens at most
/// once per key: concurrent callers for the same key block until the first one has built it.
/// Entries live as long as the cache.
pub(crate) struct EncoderCache<E> {
    entries: RwLock<HashMap<usize, Arc<OnceCell<Arc<E>>>>>,
}

impl<E> EncoderCache<E> {
    pub fn new() -> Self {
        EncoderCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_try_init<F>(&self, shard_count: usize, init: F) -> Result<Arc<E>, EdsError>
    where
        F: FnOnce() -> Result<E, EdsError>,
    {
        let existing = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&shard_count)
            .cloned();

        let cell = match existing {
            Some(cell) => cell,
            None => self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(shard_count)
                .or_default()
                .clone(),
        };

        cell.get_or_try_init(|| init().map(Arc::new)).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Explicit mapping from codec name to codec instance. Build it once at startup and pass it to
/// whoever needs to resolve a codec by name.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        CodecRegistry { codecs: HashMap::new() }
    }

    /// Registers `codec` under its own name, replacing any codec previously registered under it.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        self.codecs.insert(codec.name().to_string(), codec);
    }

    /// Looks up a codec by name.
    ///
    /// # Returns
    ///
    /// Returns a `Result` which is:
    /// - `Ok(Arc<dyn Codec>)` sharing the registered codec instance.
    /// - `Err(EdsError::UnknownCodec)` if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Codec>, EdsError> {
        self.codecs.get(name).cloned().ok_or_else(|| EdsError::UnknownCodec(name.to_string()))
    }

    /// Names of all registered codecs, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.codecs.keys().map(String::as_str).collect::<Vec<&str>>();
        names.sort_unstable();
        names
    }
}

impl Default for CodecRegistry {
    /// Registry holding the `leopard` and `rs-gf8` codecs.
    fn default() -> Self {
        let mut registry = CodecRegistry::new();
        registry.register(Arc::new(LeopardCodec::new()));
        registry.register(Arc::new(ReedSolomonGf8Codec::new()));
        registry
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Codec, CodecRegistry, EncoderCache};
    use crate::{
        consts::{LEOPARD, RS_GF8},
        errors::EdsError,
    };
    use rand::{Rng, seq::SliceRandom};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    pub fn generate_random_chunks<R: Rng + ?Sized>(count: usize, chunk_size: usize, rng: &mut R) -> Vec<Vec<u8>> {
        (0..count).map(|_| (0..chunk_size).map(|_| rng.random()).collect()).collect()
    }

    fn all_codecs() -> Vec<Arc<dyn Codec>> {
        let registry = CodecRegistry::default();
        registry.names().into_iter().map(|name| registry.get(name).unwrap()).collect()
    }

    #[test]
    fn test_default_registry_resolves_builtin_codecs() {
        let registry = CodecRegistry::default();

        assert_eq!(registry.names(), vec![LEOPARD, RS_GF8]);
        assert_eq!(registry.get(LEOPARD).unwrap().name(), LEOPARD);
        assert_eq!(registry.get(RS_GF8).unwrap().name(), RS_GF8);
        assert_eq!(registry.get("nope").err(), Some(EdsError::UnknownCodec("nope".to_string())));
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        let registry = CodecRegistry::new();
        assert!(registry.names().is_empty());
        assert!(matches!(registry.get(LEOPARD), Err(EdsError::UnknownCodec(_))));
    }

    #[test]
    fn prop_test_decode_recovers_any_half_of_shares() {
        const NUM_TEST_ITERATIONS: usize = 10;
        const CHUNK_SIZE: usize = 64;

        let mut rng = rand::rng();

        for codec in all_codecs() {
            (0..NUM_TEST_ITERATIONS).for_each(|_| {
                let k = rng.random_range(1..=32usize);
                let data = generate_random_chunks(k, CHUNK_SIZE, &mut rng);

                let parity = codec.encode(&data).expect("Must be able to encode");
                assert_eq!(parity.len(), k);
                assert!(parity.iter().all(|chunk| chunk.len() == CHUNK_SIZE));

                let full = data.iter().chain(parity.iter()).cloned().collect::<Vec<Vec<u8>>>();

                let mut indices = (0..2 * k).collect::<Vec<usize>>();
                indices.shuffle(&mut rng);

                let mut shares = full.iter().cloned().map(Some).collect::<Vec<Option<Vec<u8>>>>();
                indices.iter().take(k).for_each(|&idx| shares[idx] = None);

                let decoded = codec.decode(shares).expect("Must be able to decode from half of the shares");
                assert_eq!(decoded, full);
            });
        }
    }

    #[test]
    fn test_decode_with_too_few_shares() {
        let mut rng = rand::rng();

        for codec in all_codecs() {
            let data = generate_random_chunks(4, 64, &mut rng);
            let parity = codec.encode(&data).unwrap();

            let mut shares = data.into_iter().chain(parity).map(Some).collect::<Vec<Option<Vec<u8>>>>();
            shares[0] = None;
            shares[3] = None;
            shares[5] = None;
            shares[6] = None;
            shares[7] = None;

            assert_eq!(codec.decode(shares), Err(EdsError::TooFewShards), "codec {}", codec.name());
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let mut rng = rand::rng();

        for codec in all_codecs() {
            let data = generate_random_chunks(8, 128, &mut rng);
            assert_eq!(codec.encode(&data).unwrap(), codec.encode(&data).unwrap());
        }
    }

    #[test]
    fn test_encode_rejects_malformed_input() {
        for codec in all_codecs() {
            assert!(matches!(codec.encode(&[]), Err(EdsError::EncodingFailed(_))));
            assert_eq!(
                codec.encode(&[vec![1u8; 64], vec![2u8; 32]]),
                Err(EdsError::ChunkSizeMismatch { expected: 64, got: 32 })
            );
        }
    }

    #[test]
    fn test_decode_rejects_odd_share_count() {
        for codec in all_codecs() {
            assert!(matches!(codec.decode(vec![Some(vec![1u8; 64]); 3]), Err(EdsError::DecodingFailed(_))));
        }
    }

    #[test]
    fn test_encoder_cache_builds_each_entry_once() {
        let cache = EncoderCache::<usize>::new();
        let builds = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for shard_count in [2usize, 4, 8] {
                        let value = cache
                            .get_or_try_init(shard_count, || {
                                builds.fetch_add(1, Ordering::SeqCst);
                                Ok(shard_count * 10)
                            })
                            .unwrap();
                        assert_eq!(*value, shard_count * 10);
                    }
                });
            }
        });

        assert_eq!(builds.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_encoder_cache_retries_after_failed_build() {
        let cache = EncoderCache::<usize>::new();

        assert!(cache.get_or_try_init(4, || Err(EdsError::EncodingFailed("boom".to_string()))).is_err());
        assert_eq!(*cache.get_or_try_init(4, || Ok(40)).unwrap(), 40);
    }
}
