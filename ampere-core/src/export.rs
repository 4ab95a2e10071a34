use std::io::Write;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize export: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `documents` as a pretty-printed JSON array followed by a newline.
pub fn export_json<'a, T, I, W>(
    documents: I,
    mut writer: W,
) -> Result<usize, ExportError>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
    W: Write,
{
    let documents: Vec<&T> = documents.into_iter().collect();
    serde_json::to_writer_pretty(&mut writer, &documents)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(documents.len())
}
