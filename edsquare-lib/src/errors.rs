use crate::axis::Axis;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdsError {
    #[error("invalid number of chunks for a square: {0}")]
    InvalidSquareSize(usize),
    #[error("chunk size mismatch: expected {expected}B, got {got}B")]
    ChunkSizeMismatch { expected: usize, got: usize },
    #[error("empty chunk in data square")]
    EmptyChunk,
    #[error("too many chunks: {count} (codec supports at most {max})")]
    TooManyChunks { count: usize, max: usize },
    #[error("expected {expected} {axis} roots, got {got}")]
    RootCountMismatch { axis: Axis, expected: usize, got: usize },
    #[error("invalid cell index: ({row}, {col}) (width: {width})")]
    InvalidCellIndex { row: usize, col: usize, width: usize },
    #[error("{axis} {index} is incomplete")]
    IncompleteVector { axis: Axis, index: usize },

    #[error("unknown codec: {0}")]
    UnknownCodec(String),
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
    #[error("decoding failed: {0}")]
    DecodingFailed(String),
    /// Not enough shares are present to decode a vector yet. Absorbed by the crossword solver.
    #[error("too few shards given to reconstruct all the shards")]
    TooFewShards,

    /// A fully present vector of the input disagrees with its supplied root, before any repair happened.
    #[error("bad root input: {axis} {index} does not match its expected root")]
    InvalidRootInput { axis: Axis, index: usize },
    #[error("byzantine row: {row}")]
    ByzantineRow { row: usize },
    #[error("byzantine column: {column}")]
    ByzantineColumn { column: usize },
    #[error("failed to solve data square")]
    UnrepairableDataSquare,

    #[error("no leaf nodes to build merkle tree on")]
    NoLeafNodesToBuildMerkleTreeOn,

    #[error("failed to serialize square header: {0}")]
    HeaderSerializationFailed(String),
    #[error("failed to deserialize square header: {0}")]
    HeaderDeserializationFailed(String),
    #[error("failed to serialize extended data square: {0}")]
    SquareSerializationFailed(String),
    #[error("failed to deserialize extended data square: {0}")]
    SquareDeserializationFailed(String),
}

impl EdsError {
    /// Blames vector `index` along `axis`.
    pub fn byzantine(axis: Axis, index: usize) -> Self {
        match axis {
            Axis::Row => EdsError::ByzantineRow { row: index },
            Axis::Column => EdsError::ByzantineColumn { column: index },
        }
    }

    pub fn is_byzantine(&self) -> bool {
        matches!(self, EdsError::ByzantineRow { .. } | EdsError::ByzantineColumn { .. })
    }
}
