use crate::axis::Axis;

/// Square matrix of presence bits, one per cell of an extended data square, stored row-major in
/// 64-bit words.
///
/// Bits are only ever set, never cleared, so the number of set bits is tracked alongside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    num_bits: usize,
    num_ones: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    const WORD_BITS: usize = u64::BITS as usize;

    /// Creates a matrix of `num_bits` cleared bits, laid out as rows of `width` bits.
    pub fn new(width: usize, num_bits: usize) -> Self {
        BitMatrix {
            width,
            num_bits,
            num_ones: 0,
            words: vec![0u64; num_bits.div_ceil(Self::WORD_BITS)],
        }
    }

    /// Creates a `width × width` matrix with the bit of every present cell set, given a row-major
    /// presence flag per cell.
    pub fn from_presence(width: usize, presence: impl IntoIterator<Item = bool>) -> Self {
        let mut matrix = Self::new(width, width * width);
        presence
            .into_iter()
            .take(width * width)
            .enumerate()
            .filter(|&(_, present)| present)
            .for_each(|(idx, _)| matrix.set_flat(idx));

        matrix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.get_flat(row * self.width + col)
    }

    pub fn get_flat(&self, idx: usize) -> bool {
        debug_assert!(idx < self.num_bits);
        (self.words[idx / Self::WORD_BITS] >> (idx % Self::WORD_BITS)) & 1 == 1
    }

    /// Sets the bit at `(row, col)`. Setting an already set bit changes nothing.
    pub fn set(&mut self, row: usize, col: usize) {
        self.set_flat(row * self.width + col)
    }

    pub fn set_flat(&mut self, idx: usize) {
        debug_assert!(idx < self.num_bits);

        let mask = 1u64 << (idx % Self::WORD_BITS);
        let word = &mut self.words[idx / Self::WORD_BITS];

        if *word & mask == 0 {
            *word |= mask;
            self.num_ones += 1;
        }
    }

    pub fn row_is_one(&self, row: usize) -> bool {
        self.row_range_is_one(row, 0, self.width)
    }

    pub fn col_is_one(&self, col: usize) -> bool {
        self.col_range_is_one(col, 0, self.width)
    }

    /// Checks whether bits `[start, end)` of `row` are all set.
    pub fn row_range_is_one(&self, row: usize, start: usize, end: usize) -> bool {
        (start..end).all(|col| self.get(row, col))
    }

    /// Checks whether bits `[start, end)` of `col` are all set.
    pub fn col_range_is_one(&self, col: usize, start: usize, end: usize) -> bool {
        (start..end).all(|row| self.get(row, col))
    }

    pub fn num_ones_in_row(&self, row: usize) -> usize {
        (0..self.width).filter(|&col| self.get(row, col)).count()
    }

    pub fn num_ones_in_col(&self, col: usize) -> usize {
        (0..self.width).filter(|&row| self.get(row, col)).count()
    }

    pub fn num_ones(&self) -> usize {
        self.num_ones
    }

    pub fn is_all_ones(&self) -> bool {
        self.num_ones == self.num_bits
    }

    pub fn get_in_vector(&self, axis: Axis, index: usize, position: usize) -> bool {
        let (row, col) = axis.cell(index, position);
        self.get(row, col)
    }

    pub fn vector_is_one(&self, axis: Axis, index: usize) -> bool {
        match axis {
            Axis::Row => self.row_is_one(index),
            Axis::Column => self.col_is_one(index),
        }
    }

    pub fn vector_range_is_one(&self, axis: Axis, index: usize, start: usize, end: usize) -> bool {
        match axis {
            Axis::Row => self.row_range_is_one(index, start, end),
            Axis::Column => self.col_range_is_one(index, start, end),
        }
    }

    pub fn num_ones_in_vector(&self, axis: Axis, index: usize) -> usize {
        match axis {
            Axis::Row => self.num_ones_in_row(index),
            Axis::Column => self.num_ones_in_col(index),
        }
    }

    /// Sets every bit of vector `index` along `axis`.
    pub fn set_vector(&mut self, axis: Axis, index: usize) {
        for position in 0..self.width {
            let (row, col) = axis.cell(index, position);
            self.set(row, col);
        }
    }
}
