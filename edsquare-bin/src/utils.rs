use crate::errors::EdsquareCLIError;
use edsquare_lib::SquareHeader;
use rand::Rng;
use std::{
    path::{Path, PathBuf},
    process::exit,
};

/// Appended right after the last byte of a blob, before zero padding.
pub const END_OF_DATA_MARKER: u8 = 0x80;

pub const SQUARE_HEADER_FILE_NAME: &str = "header.commit";

pub fn format_bytes(bytes: usize) -> String {
    let suffixes = ["B", "KB", "MB", "GB"];
    let mut index = 0;
    let mut size = bytes as f64;

    while size >= 1024.0 && index < suffixes.len() - 1 {
        size /= 1024.0;
        index += 1;
    }

    format!("{:.1}{}", size, suffixes[index])
}

pub fn cell_file_name(row: usize, col: usize) -> String {
    format!("cell.{}.{}.data", row, col)
}

/// Marks the end of `blob` and zero pads it, then splits it into the `k²` chunks of the smallest
/// power-of-two width `k` square able to hold it.
pub fn blob_to_original_square(mut blob: Vec<u8>, chunk_size: usize) -> Vec<Vec<u8>> {
    blob.push(END_OF_DATA_MARKER);

    let num_chunks = blob.len().div_ceil(chunk_size);
    let mut original_width = 1;
    while original_width * original_width < num_chunks {
        original_width *= 2;
    }

    blob.resize(original_width * original_width * chunk_size, 0);
    blob.chunks_exact(chunk_size).map(|chunk| chunk.to_vec()).collect()
}

/// Inverse of [`blob_to_original_square`], over the concatenated original chunks.
pub fn strip_end_of_data_marker(mut data: Vec<u8>) -> Result<Vec<u8>, EdsquareCLIError> {
    match data.iter().rposition(|&byte| byte != 0) {
        Some(marker_at) if data[marker_at] == END_OF_DATA_MARKER => {
            data.truncate(marker_at);
            Ok(data)
        }
        _ => Err(EdsquareCLIError::MissingEndOfDataMarker),
    }
}

pub fn read_square_header(square_header_path: &Path) -> SquareHeader {
    match std::fs::read(square_header_path) {
        Ok(bytes) => match SquareHeader::from_bytes(&bytes) {
            Ok((square_header, n)) => {
                if n != bytes.len() {
                    eprintln!(
                        "Extended data square header file {:?} is {} bytes longer than it should be",
                        square_header_path,
                        bytes.len() - n
                    );
                    exit(1);
                }

                square_header
            }
            Err(e) => {
                eprintln!("Error: {}", EdsquareCLIError::FailedToReadSquareHeader(e.to_string()));
                exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", EdsquareCLIError::FailedToReadSquareHeader(e.to_string()));
            exit(1);
        }
    }
}

/// Reads a single cell of the square, which must be exactly `chunk_size` bytes long.
pub fn read_cell(cell_path: &Path, chunk_size: usize) -> Result<Vec<u8>, EdsquareCLIError> {
    match std::fs::read(cell_path) {
        Ok(bytes) => {
            if bytes.len() != chunk_size {
                Err(EdsquareCLIError::FailedToReadCell(format!(
                    "Extended data square cell file {:?} is {} bytes long, expected {}",
                    cell_path,
                    bytes.len(),
                    chunk_size
                )))
            } else {
                Ok(bytes)
            }
        }
        Err(e) => Err(EdsquareCLIError::FailedToReadCell(e.to_string())),
    }
}

/// Reads every cell file present under `square_dir`, in row-major order, absent ones being `None`.
pub fn read_present_cells(square_dir: &Path, header: &SquareHeader) -> Vec<Option<Vec<u8>>> {
    let width = header.get_width();

    (0..width * width)
        .map(|idx| {
            let cell_path = square_dir.join(cell_file_name(idx / width, idx % width));
            if !cell_path.is_file() {
                return None;
            }

            match read_cell(&cell_path, header.get_chunk_size()) {
                Ok(cell) => Some(cell),
                Err(e) => {
                    tracing::warn!(path = ?cell_path, "skipping unreadable cell: {}", e);
                    None
                }
            }
        })
        .collect()
}

pub fn get_target_directory_path<R: Rng + ?Sized>(source_path: &Path, opt_target_dir: &Option<PathBuf>, rng: &mut R) -> PathBuf {
    match opt_target_dir {
        Some(path) => match path.try_exists() {
            Ok(ok) => {
                if ok {
                    prepare_random_target_directory_name(&path.to_string_lossy(), rng)
                } else {
                    path.clone()
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                exit(1);
            }
        },
        None => {
            let prefix = source_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "edsquare".to_string());
            prepare_random_target_directory_name(&prefix, rng)
        }
    }
}

fn prepare_random_target_directory_name<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> PathBuf {
    let mut rand_suffix = [0u8; 4];
    rng.fill_bytes(&mut rand_suffix);

    let mut res = String::new();
    res.push_str(prefix);
    res.push('-');
    res.push_str(&const_hex::encode(rand_suffix));

    PathBuf::from(res)
}
