//! Atomic temp-file-then-rename writes.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use engine_core::Record;
use tempfile::NamedTempFile;

/// Writes `records` as a pretty-printed JSON array to `path`.
///
/// The array is written to a temporary file in the same directory and then
/// renamed over `path`, so readers only ever see the old or the new complete
/// content. On error the temporary file is removed and `path` is untouched.
pub fn write_records_atomic<'a, I>(path: &Path, records: I) -> io::Result<()>
where
    I: IntoIterator<Item = &'a Record>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let records: Vec<&Record> = records.into_iter().collect();
    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
