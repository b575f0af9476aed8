//! Content digest helpers.
//!
//! MD5 is the endpoint's placement and integrity digest (the `XueHai-MD5`
//! header and the manifest `md5` field); it is not used for any security
//! purpose here.

use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

/// Computes MD5 of `data` and returns the hex-encoded digest.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes MD5 of an entire file and returns the hex-encoded digest.
///
/// Reads in fixed-size blocks, so memory use is independent of file size.
/// Fails if the file cannot be read to completion; never returns a digest
/// of a partial read.
pub fn file_md5(path: &Path) -> Result<String, std::io::Error> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
