//! SHA-256 checksums for manifests and promotion metadata.

use crate::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Hex SHA-256 digest of a file, read in 1 MiB chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// One line of a `sha256sum`-compatible listing: `<digest>  <name>`.
pub fn checksum_line(digest: &str, name: &str) -> String {
    format!("{}  {}", digest, name)
}
