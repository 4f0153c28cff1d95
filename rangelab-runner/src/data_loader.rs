//! Series loading for the runner.
//!
//! A series is a CSV file with one market data point per row:
//!
//! ```text
//! timestamp,tick,token0_price,low,high,fee_growth_global0_x128,fee_growth_global1_x128,tvl_usd,liquidity
//! ```
//!
//! `low` and `high` may be empty. Timestamps must be strictly increasing:
//! fee deltas are taken against the previous row, so a reordered series would
//! silently corrupt every fee after the swap.

use std::io::Read;
use std::path::Path;

use rangelab_core::domain::MarketDataPoint;
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("series has no data points")]
    Empty,

    #[error(
        "timestamps must be strictly increasing: row {row} has {timestamp} after {previous}"
    )]
    OutOfOrder {
        row: usize,
        previous: i64,
        timestamp: i64,
    },
}

/// A validated, ordered series plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub points: Vec<MarketDataPoint>,
    /// BLAKE3 hash of every field of every point, in order.
    pub dataset_hash: String,
    pub synthetic: bool,
}

impl LoadedSeries {
    /// Validate ordering and hash the points.
    pub fn new(points: Vec<MarketDataPoint>, synthetic: bool) -> Result<Self, LoadError> {
        validate_order(&points)?;
        let dataset_hash = dataset_hash(&points);
        Ok(Self {
            points,
            dataset_hash,
            synthetic,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Load a series from a CSV file.
pub fn load_series(path: &Path) -> Result<LoadedSeries, LoadError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let points = collect_points(reader)?;
    tracing::debug!(path = %path.display(), rows = points.len(), "loaded series");
    LoadedSeries::new(points, false)
}

/// Read a series from any CSV source.
pub fn read_series<R: Read>(source: R) -> Result<LoadedSeries, LoadError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    LoadedSeries::new(collect_points(reader)?, false)
}

fn collect_points<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<MarketDataPoint>, LoadError> {
    reader
        .deserialize()
        .collect::<Result<Vec<MarketDataPoint>, csv::Error>>()
        .map_err(LoadError::from)
}

/// Reject empty series and any non-increasing timestamp.
pub fn validate_order(points: &[MarketDataPoint]) -> Result<(), LoadError> {
    if points.is_empty() {
        return Err(LoadError::Empty);
    }
    for (row, pair) in points.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(LoadError::OutOfOrder {
                row: row + 1,
                previous: pair[0].timestamp,
                timestamp: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// Deterministic content hash of a series.
pub fn dataset_hash(points: &[MarketDataPoint]) -> String {
    let mut hasher = blake3::Hasher::new();
    for point in points {
        hasher.update(&point.timestamp.to_le_bytes());
        hasher.update(point.tick.as_bytes());
        hasher.update(&point.token0_price.to_le_bytes());
        for bound in [point.low, point.high] {
            match bound {
                Some(value) => hasher.update(&value.to_le_bytes()),
                None => hasher.update(b"-"),
            };
        }
        hasher.update(point.fee_growth_global0_x128.as_bytes());
        hasher.update(b"/");
        hasher.update(point.fee_growth_global1_x128.as_bytes());
        hasher.update(&point.tvl_usd.to_le_bytes());
        hasher.update(&point.liquidity.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
