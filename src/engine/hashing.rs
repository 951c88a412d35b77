//! Content checksums for conflict comparison

use anyhow::{Context, Result};
use blake3::Hasher;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::utils::config::HashingConsts;

/// Blake3 of a file's contents. Large files are memory-mapped, smaller ones read in chunks.
pub fn hash_file(path: &Path, size: u64) -> Result<[u8; 32]> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Hasher::new();

    if size > HashingConsts::HASH_MMAP_THRESHOLD {
        // SAFETY: read-only map; a concurrent writer can only change the hash we report.
        let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.display()))?;
        hasher.update(&mmap);
    } else {
        let mut reader = std::io::BufReader::with_capacity(HashingConsts::HASH_READ_CHUNK_SIZE, file);
        let mut buffer = vec![0u8; HashingConsts::HASH_READ_CHUNK_SIZE];
        loop {
            let n = reader
                .read(&mut buffer)
                .with_context(|| format!("read {}", path.display()))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
    }

    Ok(*hasher.finalize().as_bytes())
}

/// True when both files have identical contents.
pub fn same_contents(a: &Path, a_size: u64, b: &Path, b_size: u64) -> Result<bool> {
    if a_size != b_size {
        return Ok(false);
    }
    Ok(hash_file(a, a_size)? == hash_file(b, b_size)?)
}
