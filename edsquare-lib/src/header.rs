use crate::{axis::Axis, consts::EDSQUARE_BINCODE_CONFIG, errors::EdsError};
use serde::{Deserialize, Serialize};

/// Commitment to an extended data square: everything a verifier needs to repair and check a square
/// from a subset of its chunks.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SquareHeader {
    codec: String,
    width: usize,
    chunk_size: usize,
    row_roots: Vec<Vec<u8>>,
    col_roots: Vec<Vec<u8>>,
}

impl SquareHeader {
    pub fn new(codec: &str, width: usize, chunk_size: usize, row_roots: Vec<Vec<u8>>, col_roots: Vec<Vec<u8>>) -> Self {
        SquareHeader {
            codec: codec.to_string(),
            width,
            chunk_size,
            row_roots,
            col_roots,
        }
    }

    pub fn get_codec_name(&self) -> &str {
        &self.codec
    }

    pub fn get_width(&self) -> usize {
        self.width
    }

    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn get_row_roots(&self) -> &[Vec<u8>] {
        &self.row_roots
    }

    pub fn get_col_roots(&self) -> &[Vec<u8>] {
        &self.col_roots
    }

    pub fn get_root(&self, axis: Axis, index: usize) -> Option<&[u8]> {
        match axis {
            Axis::Row => self.row_roots.get(index),
            Axis::Column => self.col_roots.get(index),
        }
        .map(Vec::as_slice)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EdsError> {
        bincode::serde::encode_to_vec(self, EDSQUARE_BINCODE_CONFIG).map_err(|err| EdsError::HeaderSerializationFailed(err.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), EdsError> {
        match bincode::serde::decode_from_slice::<SquareHeader, bincode::config::Configuration>(bytes, EDSQUARE_BINCODE_CONFIG) {
            Ok((header, n)) => {
                if header.width == 0 || header.width % 2 != 0 {
                    return Err(EdsError::HeaderDeserializationFailed(format!("invalid square width {}", header.width)));
                }

                if header.row_roots.len() != header.width || header.col_roots.len() != header.width {
                    return Err(EdsError::HeaderDeserializationFailed(
                        "number of roots and square width do not match".to_string(),
                    ));
                }

                Ok((header, n))
            }
            Err(err) => Err(EdsError::HeaderDeserializationFailed(err.to_string())),
        }
    }
}
