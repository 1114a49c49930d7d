//! Input record loading.

use std::fs;
use std::io;
use std::path::Path;

use engine_core::{Error, Record, Result};
use serde_json::Value;
use tracing::{error, info};

/// Reads the input file as a JSON array of records.
///
/// Any problem here aborts the run: without the input there is nothing to
/// enrich and nothing to reorder the output by.
pub fn load_input(path: &Path) -> Result<Vec<Record>> {
    info!(path = %path.display(), "Loading products");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            error!(path = %path.display(), "Input file not found");
            return Err(Error::InputMissing {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read input file");
            return Err(Error::InputRead {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let records = parse_records(path, &content).map_err(|e| {
        error!(path = %path.display(), error = %e, "Input file is not usable");
        e
    })?;

    info!(count = records.len(), "Found products to enrich");
    Ok(records)
}

fn parse_records(path: &Path, content: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| Error::input_invalid(path, format!("malformed JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(Error::input_invalid(path, "top level is not an array"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(Error::input_invalid(
                path,
                format!("element {} is not an object: {}", index, other),
            )),
        })
        .collect()
}
