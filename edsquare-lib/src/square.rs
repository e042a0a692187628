use crate::{
    axis::Axis,
    codec::{Codec, CodecRegistry},
    consts::EDSQUARE_BINCODE_CONFIG,
    errors::EdsError,
    header::SquareHeader,
    merkle_tree::{TreeConstructorFn, vector_root},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A `width × width` grid of equal-length chunks whose rows and columns are Reed-Solomon codewords.
///
/// The top-left `width/2 × width/2` quadrant holds original data. Every row of the original half is
/// extended to the right, and every column is extended downwards, so each of the `2 × width`
/// vectors is independently decodable from any half of its chunks.
///
/// Squares handed out by this crate are always complete. A square is only partially filled while
/// the crossword solver repairs it, and absent cells are then `None`, never zero-filled.
#[derive(Clone)]
pub struct ExtendedDataSquare {
    width: usize,
    chunk_size: usize,
    cells: Vec<Option<Vec<u8>>>,
    codec: Arc<dyn Codec>,
    tree_fn: TreeConstructorFn,
}

#[derive(Serialize, Deserialize)]
struct SquareRecord {
    codec: String,
    width: usize,
    chunk_size: usize,
    cells: Vec<Vec<u8>>,
}

/// Returns the width of a square made of `num_chunks` chunks, if there is one.
pub(crate) fn square_width(num_chunks: usize) -> Option<usize> {
    let width = num_chunks.isqrt();
    (width > 0 && width * width == num_chunks).then_some(width)
}

/// Checks that every present chunk is non-empty and of the same length, returning that length.
pub(crate) fn common_chunk_size<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Result<Option<usize>, EdsError> {
    let mut chunk_size = None;

    for chunk in chunks {
        if chunk.is_empty() {
            return Err(EdsError::EmptyChunk);
        }

        match chunk_size {
            None => chunk_size = Some(chunk.len()),
            Some(expected) if expected != chunk.len() => {
                return Err(EdsError::ChunkSizeMismatch {
                    expected,
                    got: chunk.len(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(chunk_size)
}

impl ExtendedDataSquare {
    /// Extends an original data square of `k × k` chunks, given in row-major order, into a
    /// `2k × 2k` extended data square.
    ///
    /// Original rows are extended first, then all `2k` columns are extended from their original half.
    ///
    /// # Returns
    ///
    /// Returns a `Result` which is:
    /// - `Ok(ExtendedDataSquare)` holding the complete extended square.
    /// - `Err(EdsError::InvalidSquareSize)` if `data.len()` is not a non-zero perfect square.
    /// - `Err(EdsError::TooManyChunks)` if the codec cannot extend a square this big.
    /// - `Err(EdsError::EmptyChunk)` or `Err(EdsError::ChunkSizeMismatch)` for malformed chunks.
    /// - `Err(EdsError::EncodingFailed)` if the codec fails.
    pub fn compute(data: Vec<Vec<u8>>, codec: Arc<dyn Codec>, tree_fn: TreeConstructorFn) -> Result<Self, EdsError> {
        let original_width = square_width(data.len()).ok_or(EdsError::InvalidSquareSize(data.len()))?;
        if data.len() > codec.max_chunks() {
            return Err(EdsError::TooManyChunks {
                count: data.len(),
                max: codec.max_chunks(),
            });
        }

        let chunk_size = common_chunk_size(data.iter().map(Vec::as_slice))?.ok_or(EdsError::InvalidSquareSize(0))?;
        let width = 2 * original_width;

        let mut cells = vec![None; width * width];
        data.into_iter().enumerate().for_each(|(idx, chunk)| {
            cells[(idx / original_width) * width + idx % original_width] = Some(chunk);
        });

        let mut eds = ExtendedDataSquare {
            width,
            chunk_size,
            cells,
            codec,
            tree_fn,
        };

        let row_parities = (0..original_width)
            .into_par_iter()
            .map(|row| eds.codec.encode(&eds.original_half(Axis::Row, row)?))
            .collect::<Result<Vec<Vec<Vec<u8>>>, EdsError>>()?;
        for (row, parity) in row_parities.into_iter().enumerate() {
            eds.write_extension_half(Axis::Row, row, parity);
        }

        let col_parities = (0..width)
            .into_par_iter()
            .map(|col| eds.codec.encode(&eds.original_half(Axis::Column, col)?))
            .collect::<Result<Vec<Vec<Vec<u8>>>, EdsError>>()?;
        for (col, parity) in col_parities.into_iter().enumerate() {
            eds.write_extension_half(Axis::Column, col, parity);
        }

        Ok(eds)
    }

    /// Wraps a complete extended data square, given as `width²` chunks in row-major order.
    ///
    /// The chunks are taken as they are, no check is done that rows and columns are codewords.
    pub fn import(data: Vec<Vec<u8>>, codec: Arc<dyn Codec>, tree_fn: TreeConstructorFn) -> Result<Self, EdsError> {
        Self::from_cells(data.into_iter().map(Some).collect(), codec, tree_fn)
    }

    /// Wraps a possibly incomplete square, given as `width²` cells in row-major order.
    pub(crate) fn from_cells(cells: Vec<Option<Vec<u8>>>, codec: Arc<dyn Codec>, tree_fn: TreeConstructorFn) -> Result<Self, EdsError> {
        let width = square_width(cells.len())
            .filter(|width| width % 2 == 0)
            .ok_or(EdsError::InvalidSquareSize(cells.len()))?;

        let chunk_size = common_chunk_size(cells.iter().flatten().map(Vec::as_slice))?.ok_or(EdsError::UnrepairableDataSquare)?;
        let original_chunks = (width / 2) * (width / 2);
        if original_chunks > codec.max_chunks() {
            return Err(EdsError::TooManyChunks {
                count: original_chunks,
                max: codec.max_chunks(),
            });
        }

        Ok(ExtendedDataSquare {
            width,
            chunk_size,
            cells,
            codec,
            tree_fn,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Width of the original data square, i.e. half of the extended square's width.
    pub fn original_width(&self) -> usize {
        self.width / 2
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    pub fn tree_fn(&self) -> TreeConstructorFn {
        self.tree_fn
    }

    /// Returns the chunk at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Result<&[u8], EdsError> {
        if row >= self.width || col >= self.width {
            return Err(EdsError::InvalidCellIndex { row, col, width: self.width });
        }

        self.cells[row * self.width + col].as_deref().ok_or(EdsError::IncompleteVector {
            axis: Axis::Row,
            index: row,
        })
    }

    /// Returns a copy of row `index`.
    pub fn row(&self, index: usize) -> Result<Vec<Vec<u8>>, EdsError> {
        self.complete_vector(Axis::Row, index)
    }

    /// Returns a copy of column `index`.
    pub fn col(&self, index: usize) -> Result<Vec<Vec<u8>>, EdsError> {
        self.complete_vector(Axis::Column, index)
    }

    pub fn row_root(&self, index: usize) -> Result<Vec<u8>, EdsError> {
        self.vector_root(Axis::Row, index)
    }

    pub fn col_root(&self, index: usize) -> Result<Vec<u8>, EdsError> {
        self.vector_root(Axis::Column, index)
    }

    /// Recomputes the roots of all rows. Every call commits afresh to the current content.
    pub fn row_roots(&self) -> Result<Vec<Vec<u8>>, EdsError> {
        self.vector_roots(Axis::Row)
    }

    /// Recomputes the roots of all columns. Every call commits afresh to the current content.
    pub fn col_roots(&self) -> Result<Vec<Vec<u8>>, EdsError> {
        self.vector_roots(Axis::Column)
    }

    /// All chunks in row-major order.
    pub fn flattened(&self) -> Result<Vec<Vec<u8>>, EdsError> {
        (0..self.width).map(|row| self.row(row)).collect::<Result<Vec<_>, _>>().map(|rows| rows.concat())
    }

    /// Chunks of the original data square in row-major order.
    pub fn flattened_original(&self) -> Result<Vec<Vec<u8>>, EdsError> {
        (0..self.original_width())
            .map(|row| self.original_half(Axis::Row, row))
            .collect::<Result<Vec<_>, _>>()
            .map(|rows| rows.concat())
    }

    /// Commitment header of this square, carrying all row and column roots.
    pub fn header(&self) -> Result<SquareHeader, EdsError> {
        Ok(SquareHeader::new(self.codec_name(), self.width, self.chunk_size, self.row_roots()?, self.col_roots()?))
    }

    /// Serializes the square into bytes using `bincode`, tagging it with its codec's name.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EdsError> {
        let record = SquareRecord {
            codec: self.codec_name().to_string(),
            width: self.width,
            chunk_size: self.chunk_size,
            cells: self.flattened()?,
        };

        bincode::serde::encode_to_vec(&record, EDSQUARE_BINCODE_CONFIG).map_err(|err| EdsError::SquareSerializationFailed(err.to_string()))
    }

    /// Deserializes a square from bytes, resolving its codec in `registry`.
    ///
    /// # Returns
    ///
    /// Returns a `Result` which is:
    /// - `Ok((Self, usize))` holding the square and the number of bytes read.
    /// - `Err(EdsError::SquareDeserializationFailed)` if the bytes are malformed or inconsistent.
    /// - `Err(EdsError::UnknownCodec)` if the square's codec is not registered.
    pub fn from_bytes(bytes: &[u8], registry: &CodecRegistry, tree_fn: TreeConstructorFn) -> Result<(Self, usize), EdsError> {
        let (record, n) = bincode::serde::decode_from_slice::<SquareRecord, bincode::config::Configuration>(bytes, EDSQUARE_BINCODE_CONFIG)
            .map_err(|err| EdsError::SquareDeserializationFailed(err.to_string()))?;

        if record.width.checked_mul(record.width).filter(|&num_cells| num_cells == record.cells.len()).is_none() {
            return Err(EdsError::SquareDeserializationFailed(
                "number of cells does not match square width".to_string(),
            ));
        }

        let codec = registry.get(&record.codec)?;
        let eds = Self::import(record.cells, codec, tree_fn).map_err(|err| EdsError::SquareDeserializationFailed(err.to_string()))?;

        if eds.chunk_size != record.chunk_size {
            return Err(EdsError::SquareDeserializationFailed("chunk size does not match cells".to_string()));
        }

        Ok((eds, n))
    }

    /// Cell at `position` of vector `index` along `axis`, `None` if absent.
    pub(crate) fn vector_cell(&self, axis: Axis, index: usize, position: usize) -> Option<&[u8]> {
        let (row, col) = axis.cell(index, position);
        self.cells[row * self.width + col].as_deref()
    }

    pub(crate) fn set_vector_cell(&mut self, axis: Axis, index: usize, position: usize, chunk: Vec<u8>) {
        let (row, col) = axis.cell(index, position);
        self.cells[row * self.width + col] = Some(chunk);
    }

    /// Whether vector `index` along `axis` holds a chunk in every cell.
    pub(crate) fn has_no_absent_cell(&self, axis: Axis, index: usize) -> bool {
        (0..self.width).all(|position| self.vector_cell(axis, index, position).is_some())
    }

    /// Copy of cells `[start, start + len)` of vector `index` along `axis`, all of which must be present.
    pub(crate) fn vector_slice(&self, axis: Axis, index: usize, start: usize, len: usize) -> Result<Vec<Vec<u8>>, EdsError> {
        (start..start + len)
            .map(|position| {
                self.vector_cell(axis, index, position)
                    .map(<[u8]>::to_vec)
                    .ok_or(EdsError::IncompleteVector { axis, index })
            })
            .collect()
    }

    pub(crate) fn original_half(&self, axis: Axis, index: usize) -> Result<Vec<Vec<u8>>, EdsError> {
        self.vector_slice(axis, index, 0, self.original_width())
    }

    pub(crate) fn extension_half(&self, axis: Axis, index: usize) -> Result<Vec<Vec<u8>>, EdsError> {
        self.vector_slice(axis, index, self.original_width(), self.original_width())
    }

    pub(crate) fn write_extension_half(&mut self, axis: Axis, index: usize, parity: Vec<Vec<u8>>) {
        let offset = self.original_width();
        for (position, chunk) in parity.into_iter().enumerate() {
            self.set_vector_cell(axis, index, offset + position, chunk);
        }
    }

    /// Recomputes the root of vector `index` along `axis` from its current content.
    pub(crate) fn vector_root(&self, axis: Axis, index: usize) -> Result<Vec<u8>, EdsError> {
        if index >= self.width {
            let (row, col) = axis.cell(index, 0);
            return Err(EdsError::InvalidCellIndex { row, col, width: self.width });
        }

        vector_root(self.tree_fn, axis, index, &self.complete_vector(axis, index)?)
    }

    fn complete_vector(&self, axis: Axis, index: usize) -> Result<Vec<Vec<u8>>, EdsError> {
        if index >= self.width {
            let (row, col) = axis.cell(index, 0);
            return Err(EdsError::InvalidCellIndex { row, col, width: self.width });
        }

        self.vector_slice(axis, index, 0, self.width)
    }

    fn vector_roots(&self, axis: Axis) -> Result<Vec<Vec<u8>>, EdsError> {
        (0..self.width).into_par_iter().map(|index| self.vector_root(axis, index)).collect()
    }
}

impl std::fmt::Debug for ExtendedDataSquare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedDataSquare")
            .field("codec", &self.codec_name())
            .field("width", &self.width)
            .field("chunk_size", &self.chunk_size)
            .field("num_present", &self.cells.iter().filter(|cell| cell.is_some()).count())
            .finish()
    }
}

impl PartialEq for ExtendedDataSquare {
    /// Squares are equal if they use the same codec and hold the same chunks.
    fn eq(&self, other: &Self) -> bool {
        self.codec_name() == other.codec_name() && self.width == other.width && self.cells == other.cells
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{ExtendedDataSquare, SquareRecord, square_width};
    use crate::{
        axis::Axis,
        codec::{Codec, CodecRegistry, tests::generate_random_chunks},
        consts::{EDSQUARE_BINCODE_CONFIG, LEOPARD, RS_GF8},
        errors::EdsError,
        merkle_tree::new_default_tree,
    };
    use std::sync::Arc;

    pub const CHUNK_SIZE: usize = 64;

    pub fn chunk_of(byte: u8) -> Vec<u8> {
        vec![byte; CHUNK_SIZE]
    }

    /// The 2×2 original square `ones, twos / threes, fours`.
    pub fn small_original_square() -> Vec<Vec<u8>> {
        vec![chunk_of(1), chunk_of(2), chunk_of(3), chunk_of(4)]
    }

    pub fn codec(name: &str) -> Arc<dyn Codec> {
        CodecRegistry::default().get(name).expect("Codec must be registered")
    }

    #[test]
    fn test_square_width() {
        assert_eq!(square_width(0), None);
        assert_eq!(square_width(1), Some(1));
        assert_eq!(square_width(15), None);
        assert_eq!(square_width(16), Some(4));
        assert_eq!(square_width(1 << 20), Some(1 << 10));
    }

    #[test]
    fn test_compute_single_chunk_square() {
        for name in [LEOPARD, RS_GF8] {
            let eds = ExtendedDataSquare::compute(vec![chunk_of(1)], codec(name), new_default_tree).expect("Must be able to extend");

            assert_eq!(eds.width(), 2);
            assert_eq!(eds.original_width(), 1);
            assert_eq!(eds.flattened_original().unwrap(), vec![chunk_of(1)]);

            // Codewords of a single original shard.
            let parity = eds.codec().encode(&[chunk_of(1)]).unwrap();
            assert_eq!(eds.cell(0, 1).unwrap(), parity[0].as_slice());
            assert_eq!(eds.cell(1, 0).unwrap(), parity[0].as_slice());
        }
    }

    #[test]
    fn test_compute_keeps_original_quadrant_and_extends_every_vector() {
        for name in [LEOPARD, RS_GF8] {
            let eds = ExtendedDataSquare::compute(small_original_square(), codec(name), new_default_tree).expect("Must be able to extend");

            assert_eq!(eds.width(), 4);
            assert_eq!(eds.chunk_size(), CHUNK_SIZE);
            assert_eq!(eds.flattened_original().unwrap(), small_original_square());
            assert_eq!(eds.row(0).unwrap()[..2], [chunk_of(1), chunk_of(2)]);
            assert_eq!(eds.row(1).unwrap()[..2], [chunk_of(3), chunk_of(4)]);

            for axis in Axis::ALL {
                for index in 0..eds.width() {
                    let original = eds.original_half(axis, index).unwrap();
                    assert_eq!(eds.codec().encode(&original).unwrap(), eds.extension_half(axis, index).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_compute_is_deterministic() {
        let eds1 = ExtendedDataSquare::compute(small_original_square(), codec(LEOPARD), new_default_tree).unwrap();
        let eds2 = ExtendedDataSquare::compute(small_original_square(), codec(LEOPARD), new_default_tree).unwrap();

        assert_eq!(eds1, eds2);
        assert_eq!(eds1.row_roots().unwrap(), eds2.row_roots().unwrap());
        assert_eq!(eds1.col_roots().unwrap(), eds2.col_roots().unwrap());
    }

    #[test]
    fn test_compute_rejects_malformed_input() {
        let leopard = codec(LEOPARD);

        assert_eq!(
            ExtendedDataSquare::compute(Vec::new(), leopard.clone(), new_default_tree).err(),
            Some(EdsError::InvalidSquareSize(0))
        );
        assert_eq!(
            ExtendedDataSquare::compute(vec![chunk_of(1); 3], leopard.clone(), new_default_tree).err(),
            Some(EdsError::InvalidSquareSize(3))
        );
        assert_eq!(
            ExtendedDataSquare::compute(vec![chunk_of(1), chunk_of(2), vec![3u8; 32], chunk_of(4)], leopard.clone(), new_default_tree).err(),
            Some(EdsError::ChunkSizeMismatch {
                expected: CHUNK_SIZE,
                got: 32
            })
        );
        assert_eq!(
            ExtendedDataSquare::compute(vec![Vec::new()], leopard, new_default_tree).err(),
            Some(EdsError::EmptyChunk)
        );

        let too_many = vec![vec![1u8; 2]; 129 * 129];
        assert_eq!(
            ExtendedDataSquare::compute(too_many, codec(RS_GF8), new_default_tree).err(),
            Some(EdsError::TooManyChunks {
                count: 129 * 129,
                max: 128 * 128
            })
        );
    }

    #[test]
    fn test_import_rejects_odd_width() {
        assert_eq!(
            ExtendedDataSquare::import(vec![chunk_of(1); 9], codec(LEOPARD), new_default_tree).err(),
            Some(EdsError::InvalidSquareSize(9))
        );
    }

    #[test]
    fn test_roots_are_recomputed_from_content() {
        let eds = ExtendedDataSquare::compute(small_original_square(), codec(LEOPARD), new_default_tree).unwrap();

        let mut row_roots = eds.row_roots().unwrap();
        row_roots[0][0] ^= 1;
        assert_ne!(row_roots, eds.row_roots().unwrap());

        let mut row = eds.row(0).unwrap();
        row[0][0] ^= 1;
        assert_ne!(row, eds.row(0).unwrap());

        let mut tampered = eds.clone();
        tampered.set_vector_cell(Axis::Row, 1, 1, chunk_of(9));
        assert_ne!(tampered.row_root(1).unwrap(), eds.row_root(1).unwrap());
        assert_ne!(tampered.col_root(1).unwrap(), eds.col_root(1).unwrap());
        assert_eq!(tampered.row_root(0).unwrap(), eds.row_root(0).unwrap());
    }

    #[test]
    fn test_accessors_reject_out_of_range_indices() {
        let eds = ExtendedDataSquare::compute(small_original_square(), codec(LEOPARD), new_default_tree).unwrap();

        assert_eq!(eds.cell(4, 0).err(), Some(EdsError::InvalidCellIndex { row: 4, col: 0, width: 4 }));
        assert!(eds.row(4).is_err());
        assert!(eds.col_root(7).is_err());
    }

    #[test]
    fn test_square_serialization_round_trip() {
        let registry = CodecRegistry::default();

        for name in [LEOPARD, RS_GF8] {
            let data = generate_random_chunks(16, 32, &mut rand::rng());
            let eds = ExtendedDataSquare::compute(data, registry.get(name).unwrap(), new_default_tree).unwrap();

            let bytes = eds.to_bytes().expect("Must be able to serialize square");
            let (decoded, n) = ExtendedDataSquare::from_bytes(&bytes, &registry, new_default_tree).expect("Must be able to deserialize square");

            assert_eq!(n, bytes.len());
            assert_eq!(decoded, eds);
            assert_eq!(decoded.codec_name(), name);
        }
    }

    #[test]
    fn test_square_deserialization_needs_registered_codec() {
        let eds = ExtendedDataSquare::compute(small_original_square(), codec(RS_GF8), new_default_tree).unwrap();
        let bytes = eds.to_bytes().unwrap();

        assert_eq!(
            ExtendedDataSquare::from_bytes(&bytes, &CodecRegistry::new(), new_default_tree).err(),
            Some(EdsError::UnknownCodec(RS_GF8.to_string()))
        );
        assert!(matches!(
            ExtendedDataSquare::from_bytes(&bytes[..bytes.len() / 2], &CodecRegistry::default(), new_default_tree),
            Err(EdsError::SquareDeserializationFailed(_))
        ));
    }

    #[test]
    fn test_square_deserialization_rejects_overflowing_width() {
        let record = SquareRecord {
            codec: LEOPARD.to_string(),
            width: usize::MAX,
            chunk_size: 64,
            cells: Vec::new(),
        };
        let bytes = bincode::serde::encode_to_vec(&record, EDSQUARE_BINCODE_CONFIG).unwrap();

        assert!(matches!(
            ExtendedDataSquare::from_bytes(&bytes, &CodecRegistry::default(), new_default_tree),
            Err(EdsError::SquareDeserializationFailed(_))
        ));
    }

    #[test]
    fn test_leopard_extension_of_small_square_is_stable() {
        let eds = ExtendedDataSquare::compute(small_original_square(), codec(LEOPARD), new_default_tree).unwrap();

        // Leading byte of every cell, row by row. GF(2^16) for any width, see `LeopardCodec`.
        let expected: [u8; 16] = [1, 2, 80, 83, 3, 4, 102, 97, 157, 170, 252, 203, 159, 172, 202, 249];
        let leading = (0..4)
            .flat_map(|row| (0..4).map(move |col| (row, col)))
            .map(|(row, col)| eds.cell(row, col).unwrap()[0])
            .collect::<Vec<u8>>();

        assert_eq!(leading, expected);
    }
}
