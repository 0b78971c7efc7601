//! # The Courier: Fact Stream Ingestion
//!
//! **Role**: Delivers per-unit method facts from the front end's NDJSON
//! export (optionally gzip-compressed) one unit at a time.
//!
//! A malformed line is logged and skipped; the rest of the stream is still
//! delivered. Only failing to open or read the file is an error.

use common::UnitFacts;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read {path} at line {line}: {source}")]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Counters for one delivered stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub units: usize,
    pub malformed: usize,
}

/// Opens `path`, transparently decompressing files ending in `.gz`.
pub fn open_facts(path: &Path) -> Result<Box<dyn BufRead>, CourierError> {
    let file = File::open(path).map_err(|source| CourierError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Streams every unit in `path` to `deliver`, in file order.
pub fn deliver_units(
    path: &Path,
    mut deliver: impl FnMut(UnitFacts),
) -> Result<DeliveryStats, CourierError> {
    let mut reader = open_facts(path)?;
    let mut stats = DeliveryStats::default();
    let mut buf: Vec<u8> = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| CourierError::Read {
                path: path.to_path_buf(),
                line: line_no + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let parsed = std::str::from_utf8(&buf)
            .map_err(|e| e.to_string())
            .and_then(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    serde_json::from_str::<UnitFacts>(trimmed)
                        .map(Some)
                        .map_err(|e| e.to_string())
                }
            });

        match parsed {
            Ok(Some(unit)) => {
                stats.units += 1;
                deliver(unit);
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(
                    file = %path.display(),
                    line = line_no,
                    error = %error,
                    "skipping malformed unit"
                );
                stats.malformed += 1;
            }
        }
    }

    tracing::debug!(
        file = %path.display(),
        units = stats.units,
        malformed = stats.malformed,
        "fact stream delivered"
    );
    Ok(stats)
}

/// Collects every unit of `path` into memory.
pub fn read_units(path: &Path) -> Result<(Vec<UnitFacts>, DeliveryStats), CourierError> {
    let mut units = Vec::new();
    let stats = deliver_units(path, |unit| units.push(unit))?;
    Ok((units, stats))
}
