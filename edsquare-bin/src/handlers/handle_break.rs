use crate::utils::{SQUARE_HEADER_FILE_NAME, blob_to_original_square, cell_file_name, format_bytes, get_target_directory_path};
use edsquare_lib::{CodecRegistry, ExtendedDataSquare, SquareHeader, new_default_tree};
use std::{
    path::{Path, PathBuf},
    process::exit,
};

pub fn handle_break_command(blob_path: &PathBuf, opt_target_dir: &Option<PathBuf>, codec_name: &str, chunk_size: usize) {
    if chunk_size == 0 {
        eprintln!("Error: chunk size must be non-zero");
        exit(1);
    }

    let codec = match CodecRegistry::default().get(codec_name) {
        Ok(codec) => codec,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };

    match std::fs::read(blob_path) {
        Ok(blob_bytes) => {
            println!("Read {:?}", blob_path);
            println!("Size {}", format_bytes(blob_bytes.len()));
            println!("BLAKE3 Digest: {}", blake3::hash(&blob_bytes));

            let original = blob_to_original_square(blob_bytes, chunk_size);

            match ExtendedDataSquare::compute(original, codec, new_default_tree) {
                Ok(eds) => {
                    let header = match eds.header() {
                        Ok(header) => header,
                        Err(e) => {
                            eprintln!("Error: {}", e);
                            exit(1);
                        }
                    };

                    println!("Codec: {}", header.get_codec_name());
                    println!("Original square: {0}x{0} chunks of {1}", eds.original_width(), format_bytes(chunk_size));
                    println!("Extended square: {0}x{0} chunks", eds.width());

                    let mut rng = rand::rng();
                    let target_dir_path = get_target_directory_path(blob_path, opt_target_dir, &mut rng);

                    if let Err(e) = std::fs::DirBuilder::new().recursive(true).create(&target_dir_path) {
                        eprintln!("Error: {}", e);
                        exit(1);
                    }

                    println!("Writing square header and extended data square cells...");

                    write_square_header(&target_dir_path, &header);
                    write_square_cells(&target_dir_path, &eds);

                    println!("Extended data square cells placed in {:?}", &target_dir_path);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }
}

fn write_square_header(target_dir: &Path, header: &SquareHeader) {
    let square_header_path = target_dir.join(SQUARE_HEADER_FILE_NAME);

    match header.to_bytes() {
        Ok(bytes) => {
            if let Err(e) = std::fs::write(square_header_path, bytes) {
                eprintln!("Error: {}", e);
                exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    }
}

fn write_square_cells(target_dir: &Path, eds: &ExtendedDataSquare) {
    for row in 0..eds.width() {
        for col in 0..eds.width() {
            let cell = match eds.cell(row, col) {
                Ok(cell) => cell,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    exit(1);
                }
            };

            if let Err(e) = std::fs::write(target_dir.join(cell_file_name(row, col)), cell) {
                eprintln!("Error: {}", e);
                exit(1);
            }
        }
    }
}
