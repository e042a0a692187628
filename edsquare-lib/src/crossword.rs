use crate::{
    axis::Axis,
    bit_matrix::BitMatrix,
    codec::Codec,
    config::SolverConfig,
    errors::EdsError,
    merkle_tree::TreeConstructorFn,
    sanity::prerepair_sanity_check,
    square::{ExtendedDataSquare, square_width},
};
use std::{sync::Arc, time::Instant};
use tracing::{debug, trace, warn};

/// Repairs an incomplete extended data square against its expected row and column roots.
///
/// # Arguments
///
/// * `row_roots` - Expected root of every row, `width` of them.
/// * `col_roots` - Expected root of every column, `width` of them.
/// * `data` - `width²` cells in row-major order, absent chunks being `None`.
/// * `codec` - Erasure code the square was extended with.
/// * `tree_fn` - Builds the commitment tree the roots were computed with.
///
/// # Returns
///
/// Returns a `Result` which is:
/// - `Ok(ExtendedDataSquare)` holding the complete square, every row and column of which matches its root.
/// - `Err(EdsError::InvalidRootInput)` if a vector fully present in `data` contradicts its supplied root.
/// - `Err(EdsError::ByzantineRow)` / `Err(EdsError::ByzantineColumn)` naming the first row or column
///   whose data disagrees with the code or with its root.
/// - `Err(EdsError::UnrepairableDataSquare)` if the present chunks are not enough to solve the square.
/// - Input validation or codec errors otherwise.
pub fn repair_extended_data_square(
    row_roots: &[Vec<u8>],
    col_roots: &[Vec<u8>],
    data: Vec<Option<Vec<u8>>>,
    codec: Arc<dyn Codec>,
    tree_fn: TreeConstructorFn,
) -> Result<ExtendedDataSquare, EdsError> {
    repair_extended_data_square_with_config(row_roots, col_roots, data, codec, tree_fn, &SolverConfig::default())
}

/// Same as [`repair_extended_data_square`], with the solving loop bounded by `config`.
pub fn repair_extended_data_square_with_config(
    row_roots: &[Vec<u8>],
    col_roots: &[Vec<u8>],
    data: Vec<Option<Vec<u8>>>,
    codec: Arc<dyn Codec>,
    tree_fn: TreeConstructorFn,
    config: &SolverConfig,
) -> Result<ExtendedDataSquare, EdsError> {
    let width = square_width(data.len())
        .filter(|width| width % 2 == 0)
        .ok_or(EdsError::InvalidSquareSize(data.len()))?;

    for (axis, roots) in [(Axis::Row, row_roots), (Axis::Column, col_roots)] {
        if roots.len() != width {
            return Err(EdsError::RootCountMismatch {
                axis,
                expected: width,
                got: roots.len(),
            });
        }
    }

    let mut matrix = BitMatrix::from_presence(width, data.iter().map(Option::is_some));
    let mut eds = ExtendedDataSquare::from_cells(data, codec, tree_fn)?;

    prerepair_sanity_check(&eds, row_roots, col_roots, &matrix)?;

    let passes = Crossword {
        eds: &mut eds,
        matrix: &mut matrix,
        row_roots,
        col_roots,
    }
    .solve(config)?;

    debug!(width, passes, "solved extended data square");
    Ok(eds)
}

/// State of one crossword solving run: the square being repaired, which of its cells are trusted,
/// and the roots every completed vector must commit to.
struct Crossword<'a> {
    eds: &'a mut ExtendedDataSquare,
    matrix: &'a mut BitMatrix,
    row_roots: &'a [Vec<u8>],
    col_roots: &'a [Vec<u8>],
}

impl Crossword<'_> {
    /// Runs passes over all rows and columns until the square is complete, returning the number of
    /// passes it took.
    ///
    /// A pass visits indices in increasing order, the row before the column at each index. A pass
    /// without any decoded vector means the square cannot be solved with the chunks at hand.
    fn solve(&mut self, config: &SolverConfig) -> Result<usize, EdsError> {
        let started_at = Instant::now();
        let mut passes = 0;

        while !self.matrix.is_all_ones() {
            if !config.allows_pass(passes, started_at.elapsed()) {
                debug!(passes, "solver bound exhausted before square was solved");
                return Err(EdsError::UnrepairableDataSquare);
            }

            let mut progress_made = false;
            for index in 0..self.eds.width() {
                for axis in Axis::ALL {
                    progress_made |= self.solve_vector(axis, index)?;
                }
            }

            passes += 1;
            debug!(pass = passes, known = self.matrix.num_ones(), progress_made, "finished crossword pass");

            if !progress_made {
                return Err(EdsError::UnrepairableDataSquare);
            }
        }

        Ok(passes)
    }

    /// Attempts to rebuild vector `index` along `axis`, returning whether it got rebuilt.
    fn solve_vector(&mut self, axis: Axis, index: usize) -> Result<bool, EdsError> {
        if self.matrix.vector_is_one(axis, index) {
            return Ok(false);
        }

        let width = self.eds.width();
        let known = (0..width).map(|position| self.matrix.get_in_vector(axis, index, position)).collect::<Vec<bool>>();

        // Only cells marked in the matrix are trusted decoder input.
        let shares = known
            .iter()
            .enumerate()
            .map(|(position, &is_known)| {
                if is_known {
                    self.eds.vector_cell(axis, index, position).map(<[u8]>::to_vec)
                } else {
                    None
                }
            })
            .collect::<Vec<Option<Vec<u8>>>>();

        let rebuilt = match self.eds.codec().decode(shares) {
            Ok(rebuilt) => rebuilt,
            Err(EdsError::TooFewShards) => {
                trace!(%axis, index, "not enough chunks to decode yet");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        for (position, chunk) in rebuilt.into_iter().enumerate() {
            self.eds.set_vector_cell(axis, index, position, chunk);
        }

        let original_width = self.eds.original_width();
        if !self.matrix.vector_range_is_one(axis, index, original_width, width) {
            let parity = self.eds.codec().encode(&self.eds.original_half(axis, index)?)?;
            self.eds.write_extension_half(axis, index, parity);
        }

        self.verify_root(axis, index)?;

        // Writing this vector may have filled the last missing cell of some orthogonal vectors.
        let orthogonal = axis.orthogonal();
        for (position, _) in known.iter().enumerate().filter(|(_, is_known)| !**is_known) {
            if self.matrix.num_ones_in_vector(orthogonal, position) == width - 1 {
                self.verify_root(orthogonal, position)?;
            }
        }

        self.matrix.set_vector(axis, index);
        debug!(%axis, index, "rebuilt vector");

        Ok(true)
    }

    fn verify_root(&self, axis: Axis, index: usize) -> Result<(), EdsError> {
        let expected = match axis {
            Axis::Row => &self.row_roots[index],
            Axis::Column => &self.col_roots[index],
        };

        if &self.eds.vector_root(axis, index)? != expected {
            warn!(%axis, index, "rebuilt vector does not match its expected root");
            return Err(EdsError::byzantine(axis, index));
        }

        Ok(())
    }
}
