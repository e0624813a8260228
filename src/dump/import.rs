//! Shard Importer
//!
//! Reads one shard of a dump back into memory, preserving the exported
//! order. Each shard is self-contained: ids, vectors, and metadata line up
//! by position without reading any other shard.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{FlatError, Result};

/// Load a shard's ids and raw vector bytes
pub fn import_ids_vectors(dump_path: &Path, shard: usize) -> Result<(Vec<String>, Vec<Vec<u8>>)> {
    let shard_dir = shard_dir(dump_path, shard)?;
    let ids = read_ids(&shard_dir.join("ids"))?;
    let vectors = read_framed(&shard_dir.join("vectors"), ids.len())?;
    Ok((ids, vectors))
}

/// Load a shard's ids and metadata blobs
pub fn import_metas(dump_path: &Path, shard: usize) -> Result<(Vec<String>, Vec<Vec<u8>>)> {
    let shard_dir = shard_dir(dump_path, shard)?;
    let ids = read_ids(&shard_dir.join("ids"))?;
    let metas = read_framed(&shard_dir.join("metas"), ids.len())?;
    Ok((ids, metas))
}

fn shard_dir(dump_path: &Path, shard: usize) -> Result<PathBuf> {
    let dir = dump_path.join(shard.to_string());
    if !dir.is_dir() {
        return Err(FlatError::Storage(format!(
            "dump at {} has no shard {}",
            dump_path.display(),
            shard
        )));
    }
    Ok(dir)
}

fn read_ids(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut ids = Vec::new();
    for line in reader.lines() {
        ids.push(line?);
    }
    Ok(ids)
}

/// Read `expected` length-prefixed blobs (u32 big-endian prefix)
fn read_framed(path: &Path, expected: usize) -> Result<Vec<Vec<u8>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut blobs = Vec::with_capacity(expected);

    for _ in 0..expected {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;

        let mut blob = vec![0u8; len];
        reader.read_exact(&mut blob)?;
        blobs.push(blob);
    }

    let mut trailing = [0u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(FlatError::Storage(format!(
            "shard file {} has trailing bytes past its {} entries",
            path.display(),
            expected
        )));
    }

    Ok(blobs)
}
