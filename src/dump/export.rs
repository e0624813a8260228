//! Shard Exporter
//!
//! Writes `(id, vector, metadata)` triples into per-shard files, consuming
//! its input lazily so the caller can stream entries straight off the read
//! handle without materializing the whole store.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{FlatError, Result};

use super::shard_sizes;

/// Export `size` entries into `shard_count` shard directories under
/// `destination`.
///
/// `entries` must yield exactly `size` `(id, vector_bytes, metadata_bytes)`
/// triples; the positional split is computed up front from `size`, so a
/// short or over-long stream is reported as a validation error.
pub fn export<I>(destination: &Path, shard_count: usize, size: usize, entries: I) -> Result<()>
where
    I: IntoIterator<Item = Result<(String, Vec<u8>, Vec<u8>)>>,
{
    if shard_count == 0 {
        return Err(FlatError::Validation(
            "export requires a shard count of at least 1".to_string(),
        ));
    }

    let sizes = shard_sizes(size, shard_count);
    let mut entries = entries.into_iter();

    tracing::info!(
        "dumping {} entries into {} shards under {}",
        size,
        shard_count,
        destination.display()
    );

    for (shard_id, &shard_size) in sizes.iter().enumerate() {
        let shard_dir = destination.join(shard_id.to_string());
        fs::create_dir_all(&shard_dir)?;

        let mut ids_file = BufWriter::new(File::create(shard_dir.join("ids"))?);
        let mut vectors_file = BufWriter::new(File::create(shard_dir.join("vectors"))?);
        let mut metas_file = BufWriter::new(File::create(shard_dir.join("metas"))?);

        for _ in 0..shard_size {
            let (id, vector, meta) = entries.next().ok_or_else(|| {
                FlatError::Validation(format!(
                    "dump stream ended early: expected {} entries",
                    size
                ))
            })??;

            ids_file.write_all(id.as_bytes())?;
            ids_file.write_all(b"\n")?;
            write_framed(&mut vectors_file, &vector)?;
            write_framed(&mut metas_file, &meta)?;
        }

        ids_file.flush()?;
        vectors_file.flush()?;
        metas_file.flush()?;
    }

    if entries.next().is_some() {
        return Err(FlatError::Validation(format!(
            "dump stream produced more than the declared {} entries",
            size
        )));
    }

    Ok(())
}

/// Length-prefixed blob framing; the prefix is big-endian for dump-format
/// compatibility, unlike the little-endian store internals.
fn write_framed(writer: &mut impl Write, blob: &[u8]) -> Result<()> {
    writer.write_all(&(blob.len() as u32).to_be_bytes())?;
    writer.write_all(blob)?;
    Ok(())
}
