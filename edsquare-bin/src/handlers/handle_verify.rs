use crate::utils::{SQUARE_HEADER_FILE_NAME, format_bytes, read_present_cells, read_square_header};
use edsquare_lib::{Axis, SquareHeader, new_default_tree, vector_root};
use std::{path::PathBuf, process::exit};

pub fn handle_verify_command(square_dir_path: &PathBuf) {
    if !square_dir_path.is_dir() {
        eprintln!("{:?} is not a directory", square_dir_path);
        exit(1);
    }

    let square_header_path = square_dir_path.join(SQUARE_HEADER_FILE_NAME);

    println!("Looking for extended data square header file {:?}...", square_header_path);
    let square_header = read_square_header(&square_header_path);

    println!("Codec: {}", square_header.get_codec_name());
    println!("Extended square: {0}x{0} chunks of {1}", square_header.get_width(), format_bytes(square_header.get_chunk_size()));

    verify_square_vectors_and_report(square_dir_path, &square_header);
}

fn verify_square_vectors_and_report(square_dir: &PathBuf, square_header: &SquareHeader) {
    let width = square_header.get_width();
    let cells = read_present_cells(square_dir, square_header);

    let num_present_cells = cells.iter().filter(|cell| cell.is_some()).count();
    let mut num_valid_vectors = 0;
    let mut num_complete_vectors = 0;

    println!("Verifying rows and columns against their committed roots...\n");
    println!("{}", square_dir.display());

    for axis in Axis::ALL {
        for index in 0..width {
            let vector = (0..width)
                .map(|position| {
                    let (row, col) = axis.cell(index, position);
                    cells[row * width + col].as_deref()
                })
                .collect::<Option<Vec<&[u8]>>>();

            let Some(vector) = vector else {
                let num_absent = (0..width)
                    .filter(|&position| {
                        let (row, col) = axis.cell(index, position);
                        cells[row * width + col].is_none()
                    })
                    .count();
                println!("\t- {} {}\t⏳\t{} of {} cells absent", axis, index, num_absent, width);
                continue;
            };

            num_complete_vectors += 1;

            let expected_root = square_header.get_root(axis, index).unwrap_or_default();
            match vector_root(new_default_tree, axis, index, &vector) {
                Ok(root) if root == expected_root => {
                    num_valid_vectors += 1;
                    println!("\t- {} {}\t✅", axis, index);
                }
                Ok(root) => {
                    println!(
                        "\t- {} {}\t🚫\tError: root {} does not match committed {}",
                        axis,
                        index,
                        const_hex::encode(root),
                        const_hex::encode(expected_root)
                    );
                }
                Err(e) => {
                    println!("\t- {} {}\t🚫\tError: {}", axis, index, e);
                }
            }
        }
    }

    println!(
        "\nFound {}/{} cells, {}/{} complete rows and columns match their roots.",
        num_present_cells,
        width * width,
        num_valid_vectors,
        num_complete_vectors
    );
}
