//! Fixed-size chunk files (`chunk-<i>.json`).
//!
//! Chunks are always addressed by index. Callers derive the index range from
//! row or chunk counts, never from a directory listing.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConvertError;

/// On-disk shape of one chunk: `{"data": [...]}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChunkFile<T> {
    pub data: Vec<T>,
}

#[derive(Serialize)]
struct ChunkRef<'a, T> {
    data: &'a [T],
}

/// Path of chunk `index` inside `dir`.
pub fn chunk_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("chunk-{index}.json"))
}

/// Number of chunks needed for `total` rows.
///
/// # Panics
///
/// Panics if `chunk_size` is zero.
pub fn chunk_count(total: usize, chunk_size: usize) -> usize {
    assert!(chunk_size > 0, "chunk_size must be > 0");
    total.div_ceil(chunk_size)
}

/// Row ranges covered by each chunk, in order.
///
/// Every range holds `chunk_size` rows except possibly the last.
///
/// # Examples
///
/// ```
/// use simdata::chunk::chunk_ranges;
///
/// let ranges: Vec<_> = chunk_ranges(1500, 1440).collect();
/// assert_eq!(ranges, vec![0..1440, 1440..1500]);
/// ```
pub fn chunk_ranges(total: usize, chunk_size: usize) -> impl Iterator<Item = Range<usize>> {
    (0..chunk_count(total, chunk_size)).map(move |i| {
        let start = i * chunk_size;
        start..total.min(start + chunk_size)
    })
}

/// Writes `value` as pretty-printed JSON (two-space indent) to `path`.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), ConvertError> {
    let file = File::create(path).map_err(|e| ConvertError::io(path, e))?;
    let mut buf = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut buf, value).map_err(|e| ConvertError::json(path, e))?;
    buf.flush().map_err(|e| ConvertError::io(path, e))
}

/// Reads and deserializes a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConvertError> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| ConvertError::json(path, e))
}

/// Partitions `rows` into chunk files inside `dir`, creating `dir` if needed.
///
/// Returns the number of chunk files written. Progress is logged every ten
/// chunks and after the last one.
///
/// # Errors
///
/// Returns a `ConvertError` if the directory or any chunk file cannot be written.
pub fn write_chunks<T: Serialize>(
    dir: &Path,
    rows: &[T],
    chunk_size: usize,
) -> Result<usize, ConvertError> {
    fs::create_dir_all(dir).map_err(|e| ConvertError::io(dir, e))?;

    let num_chunks = chunk_count(rows.len(), chunk_size);
    for (i, range) in chunk_ranges(rows.len(), chunk_size).enumerate() {
        let path = chunk_path(dir, i);
        debug!(chunk = i, rows = range.len(), "writing {}", path.display());
        write_json(&path, &ChunkRef { data: &rows[range] })?;

        let done = i + 1;
        if done % 10 == 0 || done == num_chunks {
            let pct = done as f64 / num_chunks as f64 * 100.0;
            info!("  progress: {done}/{num_chunks} ({pct:.1}%)");
        }
    }
    Ok(num_chunks)
}

/// Reads chunk `index` from `dir`.
///
/// # Errors
///
/// Returns a `ConvertError` if the file is missing or is not a chunk of `T`.
pub fn read_chunk<T: DeserializeOwned>(dir: &Path, index: usize) -> Result<Vec<T>, ConvertError> {
    let chunk: ChunkFile<T> = read_json(&chunk_path(dir, index))?;
    Ok(chunk.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(chunk_count(0, 1440), 0);
        assert_eq!(chunk_count(1, 1440), 1);
        assert_eq!(chunk_count(1440, 1440), 1);
        assert_eq!(chunk_count(1441, 1440), 2);
    }

    #[test]
    fn ranges_are_contiguous_and_cover_everything() {
        for (total, size) in [(0, 3), (1, 3), (9, 3), (10, 3), (1500, 1440)] {
            let ranges: Vec<_> = chunk_ranges(total, size).collect();
            assert_eq!(ranges.len(), total.div_ceil(size));
            let mut next = 0;
            for (i, r) in ranges.iter().enumerate() {
                assert_eq!(r.start, next);
                if i + 1 < ranges.len() {
                    assert_eq!(r.len(), size);
                }
                next = r.end;
            }
            assert_eq!(next, total);
            if let Some(last) = ranges.last() {
                assert_eq!(last.len(), total - size * (ranges.len() - 1));
            }
        }
    }

    #[test]
    fn written_chunks_read_back_in_order() -> Result<(), ConvertError> {
        let tmp = TempDir::new().map_err(|e| ConvertError::io(Path::new("tmp"), e))?;
        let dir = tmp.path().join("case");
        let rows: Vec<u32> = (0..25).collect();

        let n = write_chunks(&dir, &rows, 10)?;
        assert_eq!(n, 3);

        let mut all = Vec::new();
        for i in 0..n {
            all.extend(read_chunk::<u32>(&dir, i)?);
        }
        assert_eq!(all, rows);
        assert!(!chunk_path(&dir, 3).exists());
        Ok(())
    }

    #[test]
    fn chunk_json_uses_data_envelope() -> Result<(), ConvertError> {
        let tmp = TempDir::new().map_err(|e| ConvertError::io(Path::new("tmp"), e))?;
        write_chunks(tmp.path(), &[1, 2], 5)?;
        let text = fs::read_to_string(chunk_path(tmp.path(), 0))
            .map_err(|e| ConvertError::io(tmp.path(), e))?;
        assert_eq!(text, "{\n  \"data\": [\n    1,\n    2\n  ]\n}");
        Ok(())
    }

    #[test]
    fn empty_rows_write_no_chunks() -> Result<(), ConvertError> {
        let tmp = TempDir::new().map_err(|e| ConvertError::io(Path::new("tmp"), e))?;
        let rows: Vec<u8> = Vec::new();
        assert_eq!(write_chunks(tmp.path(), &rows, 4)?, 0);
        assert!(!chunk_path(tmp.path(), 0).exists());
        Ok(())
    }
}
