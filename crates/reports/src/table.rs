//! CSV encoding for `/export/download` endpoints.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("csv write failed: {0}")]
    Write(#[from] csv::Error),

    #[error("csv buffer error: {0}")]
    Buffer(String),
}

/// Encode a header line plus one line per row, each terminated by `\n`.
///
/// Zero rows yields the header line alone.
pub fn encode_csv<I>(header: &[&str], rows: I) -> Result<String, CsvError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CsvError::Buffer(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CsvError::Buffer(e.to_string()))
}
