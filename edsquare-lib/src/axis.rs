use serde::{Deserialize, Serialize};

/// Selects whether a vector of the square is one of its rows or one of its columns.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    /// Both axes, in the order the crossword solver visits them for a given index.
    pub const ALL: [Axis; 2] = [Axis::Row, Axis::Column];

    /// Returns the axis crossing this one.
    pub fn orthogonal(self) -> Self {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }

    /// Maps the `position`-th cell of vector `index` along this axis to its `(row, col)` coordinate.
    pub fn cell(self, index: usize, position: usize) -> (usize, usize) {
        match self {
            Axis::Row => (index, position),
            Axis::Column => (position, index),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}
