use crate::utils::{SQUARE_HEADER_FILE_NAME, format_bytes, get_target_directory_path, read_present_cells, read_square_header, strip_end_of_data_marker};
use edsquare_lib::{CodecRegistry, new_default_tree, repair_extended_data_square};
use std::{io::Write, path::PathBuf, process::exit};

pub fn handle_repair_command(cell_dir_path: &PathBuf, opt_target_dir: &Option<PathBuf>) {
    if !cell_dir_path.is_dir() {
        eprintln!("{:?} is not a directory", cell_dir_path);
        exit(1);
    }

    let square_header_path = cell_dir_path.join(SQUARE_HEADER_FILE_NAME);

    println!("Looking for extended data square header file {:?}...", square_header_path);
    let square_header = read_square_header(&square_header_path);

    let width = square_header.get_width();
    println!("Codec: {}", square_header.get_codec_name());
    println!("Extended square: {0}x{0} chunks of {1}", width, format_bytes(square_header.get_chunk_size()));

    let codec = match CodecRegistry::default().get(square_header.get_codec_name()) {
        Ok(codec) => codec,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };

    let cells = read_present_cells(cell_dir_path, &square_header);
    println!("Found {}/{} cells", cells.iter().filter(|cell| cell.is_some()).count(), width * width);

    let mut rng = rand::rng();
    let target_dir_path = get_target_directory_path(cell_dir_path, opt_target_dir, &mut rng);

    if let Err(e) = std::fs::DirBuilder::new().recursive(true).create(&target_dir_path) {
        eprintln!("Error: {}", e);
        exit(1);
    }

    println!("Repairing extended data square in {:?}...", target_dir_path);

    let repaired_blob = match repair_extended_data_square(square_header.get_row_roots(), square_header.get_col_roots(), cells, codec, new_default_tree)
        .and_then(|eds| eds.flattened_original())
    {
        Ok(original) => match strip_end_of_data_marker(original.concat()) {
            Ok(blob) => blob,
            Err(e) => {
                eprintln!("Error: {}", e);
                exit(1);
            }
        },
        Err(e) => {
            eprintln!("Failed to repair extended data square: {}", e);
            exit(1);
        }
    };

    let repaired_blob_path = target_dir_path.join("repaired.data");

    match std::fs::OpenOptions::new().create_new(true).write(true).open(&repaired_blob_path) {
        Ok(fd) => {
            let mut buffered_fd = std::io::BufWriter::new(fd);

            if let Err(e) = buffered_fd.write_all(&repaired_blob).and_then(|_| buffered_fd.flush()) {
                eprintln!("Error: {}", e);
                exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(1);
        }
    };

    println!("Repaired blob @ {:?}", repaired_blob_path);
    println!("Size {}", format_bytes(repaired_blob.len()));
    println!("BLAKE3 Digest of {:?}: {}", repaired_blob_path, blake3::hash(&repaired_blob));
}
