//! BLAKE3 checksums for downloaded model artifacts.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// BLAKE3 hex digest of a file's contents.
///
/// Streams the file so multi-hundred-megabyte ONNX graphs are never held in
/// memory at once.
pub fn file_blake3(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Whether a file's BLAKE3 digest equals `expected` (case-insensitive hex).
pub fn matches_blake3(path: &Path, expected: &str) -> std::io::Result<bool> {
    Ok(file_blake3(path)?.eq_ignore_ascii_case(expected.trim()))
}
