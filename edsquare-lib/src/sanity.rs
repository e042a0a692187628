use crate::{axis::Axis, bit_matrix::BitMatrix, errors::EdsError, square::ExtendedDataSquare};
use tracing::warn;

/// Checks the input of a repair run, before anything gets reconstructed.
///
/// For each index, row first and column second:
/// - a vector holding every chunk, and complete per `matrix`, must commit to its expected root, or
///   the supplied roots contradict the supplied data: `EdsError::InvalidRootInput`.
/// - a vector complete per `matrix` must have the extension half its original half encodes to, or
///   the supplied data is not a codeword: `EdsError::ByzantineRow` / `EdsError::ByzantineColumn`.
///
/// The first contradiction found is returned.
pub(crate) fn prerepair_sanity_check(eds: &ExtendedDataSquare, row_roots: &[Vec<u8>], col_roots: &[Vec<u8>], matrix: &BitMatrix) -> Result<(), EdsError> {
    for index in 0..eds.width() {
        for axis in Axis::ALL {
            let expected_roots = match axis {
                Axis::Row => row_roots,
                Axis::Column => col_roots,
            };
            let is_complete = matrix.vector_is_one(axis, index);

            if eds.has_no_absent_cell(axis, index) && is_complete && eds.vector_root(axis, index)? != expected_roots[index] {
                warn!(%axis, index, "supplied root contradicts fully present vector");
                return Err(EdsError::InvalidRootInput { axis, index });
            }

            if is_complete {
                let parity = eds.codec().encode(&eds.original_half(axis, index)?)?;
                if parity != eds.extension_half(axis, index)? {
                    warn!(%axis, index, "fully present vector is not a codeword");
                    return Err(EdsError::byzantine(axis, index));
                }
            }
        }
    }

    Ok(())
}
