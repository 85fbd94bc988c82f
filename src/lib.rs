pub mod config;
pub mod debtor;
pub mod engine;
pub mod error;
pub mod header;
pub mod portfolio;
pub mod reader;
pub mod store;
pub mod validate;

use crate::error::IngestError;
use crate::reader::{check_size, decode, FileKind, RawTable};
use std::fs;
use std::path::Path;

/// Reads a `.csv` or `.xlsx` debtor file from disk, refusing files over
/// `max_file_mb` before decoding.
pub fn read_table(path: &Path, max_file_mb: u64) -> Result<RawTable, IngestError> {
    let kind = FileKind::from_file_name(&path.to_string_lossy())?;
    check_size(fs::metadata(path)?.len(), max_file_mb)?;

    let bytes = fs::read(path)?;
    decode(kind, &bytes)
}

/// Loads an upload's bytes, checking extension and size from the file
/// metadata before anything is read.
pub async fn read_upload(path: &Path, max_file_mb: u64) -> Result<Vec<u8>, IngestError> {
    FileKind::from_file_name(&path.to_string_lossy())?;
    check_size(tokio::fs::metadata(path).await?.len(), max_file_mb)?;

    Ok(tokio::fs::read(path).await?)
}
