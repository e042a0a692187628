//! # edsquare-lib: Two-Dimensional Reed-Solomon Extended Data Squares
//!
//! `edsquare-lib` lays out data as a `k × k` square of equal-length chunks and extends it with a
//! Reed-Solomon erasure code along both dimensions into a `2k × 2k` extended data square. Every row
//! and every column is committed to by a binary Merkle root, and an incomplete square can be
//! repaired from a subset of its chunks by iteratively decoding rows and columns, while rows or
//! columns that contradict their roots are pinpointed.
//!
//! ## How to Use
//!
//! ### 1. Extend a Square
//!
//! Pick a codec from the `CodecRegistry` and extend `k²` original chunks, in row-major order.
//! Chunk length must be even for the `leopard` codec.
//!
//! ```rust
//! use edsquare_lib::{CodecRegistry, ExtendedDataSquare, consts, new_default_tree};
//!
//! let codec = CodecRegistry::default().get(consts::LEOPARD).expect("Codec must be registered");
//! let original = (0..16u8).map(|byte| vec![byte; 64]).collect::<Vec<Vec<u8>>>();
//!
//! let eds = ExtendedDataSquare::compute(original, codec, new_default_tree).expect("Failed to extend square");
//! assert_eq!(eds.width(), 8);
//!
//! let header = eds.header().expect("Failed to compute row and column roots");
//! println!("Square of width {} committed with {} row roots.", header.get_width(), header.get_row_roots().len());
//! ```
//!
//! ### 2. Repair a Square
//!
//! Given the expected row and column roots and any subset of cells, with missing ones set to `None`,
//! the crossword solver returns the complete square, provided enough cells are present.
//!
//! ```rust
//! use edsquare_lib::{CodecRegistry, ExtendedDataSquare, consts, new_default_tree, repair_extended_data_square};
//!
//! let codec = CodecRegistry::default().get(consts::RS_GF8).expect("Codec must be registered");
//! let original = (0..4u8).map(|byte| vec![byte; 32]).collect::<Vec<Vec<u8>>>();
//! let eds = ExtendedDataSquare::compute(original, codec.clone(), new_default_tree).unwrap();
//!
//! let row_roots = eds.row_roots().unwrap();
//! let col_roots = eds.col_roots().unwrap();
//!
//! // Lose the whole first row, and one more cell.
//! let mut cells = eds.flattened().unwrap().into_iter().map(Some).collect::<Vec<Option<Vec<u8>>>>();
//! (0..4).for_each(|col| cells[col] = None);
//! cells[9] = None;
//!
//! let repaired = repair_extended_data_square(&row_roots, &col_roots, cells, codec, new_default_tree).expect("Failed to repair square");
//! assert_eq!(repaired, eds);
//! ```
//!
//! ### 3. Detect Byzantine Data
//!
//! A chunk altered after the roots were computed makes the repair fail, naming the offending row or column.
//!
//! ```rust
//! use edsquare_lib::{CodecRegistry, EdsError, ExtendedDataSquare, consts, new_default_tree, repair_extended_data_square};
//!
//! let codec = CodecRegistry::default().get(consts::LEOPARD).unwrap();
//! let original = (0..4u8).map(|byte| vec![byte; 32]).collect::<Vec<Vec<u8>>>();
//! let eds = ExtendedDataSquare::compute(original, codec.clone(), new_default_tree).unwrap();
//!
//! let mut cells = eds.flattened().unwrap().into_iter().map(Some).collect::<Vec<Option<Vec<u8>>>>();
//! cells[0] = Some(vec![0xff; 32]);
//! cells[1] = None;
//! cells[4] = None;
//!
//! let result = repair_extended_data_square(&eds.row_roots().unwrap(), &eds.col_roots().unwrap(), cells, codec, new_default_tree);
//! assert_eq!(result.err(), Some(EdsError::ByzantineRow { row: 0 }));
//! ```

mod axis;
mod bit_matrix;
mod codec;
mod config;
mod crossword;
mod errors;
mod header;
mod leopard;
mod merkle_tree;
mod rs_gf8;
mod sanity;
mod square;

pub mod consts;


pub use axis::Axis;
pub use bit_matrix::BitMatrix;
pub use codec::{Codec, CodecRegistry};
pub use config::SolverConfig;
pub use crossword::{repair_extended_data_square, repair_extended_data_square_with_config};
pub use errors::EdsError;
pub use header::SquareHeader;
pub use leopard::LeopardCodec;
pub use merkle_tree::{DefaultTree, Tree, TreeConstructorFn, new_default_tree, vector_root};
pub use rs_gf8::ReedSolomonGf8Codec;
pub use square::ExtendedDataSquare;
