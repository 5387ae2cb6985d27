//! Row-band partitioning and column→thread placement.
//!
//! With `base = H div P`, partition `p < P-1` owns rows
//! `[p·base, (p+1)·base)` and the last partition also absorbs the
//! remainder, owning `[(P-1)·base, H)`. When `H < P` every partition but
//! the last is empty.

use std::ops::Range;

use crate::error::{Axis, ConfigError, Error, Result};
use crate::GridSpec;

/// One contiguous row band, the unit of independent construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    pub index: usize,
    /// First owned row.
    pub row_start: i64,
    /// One past the last owned row.
    pub row_end: i64,
}

impl Partition {
    pub fn rows(&self) -> Range<i64> {
        self.row_start..self.row_end
    }

    pub fn contains_row(&self, row: i64) -> bool {
        self.rows().contains(&row)
    }

    pub fn row_count(&self) -> i64 {
        self.row_end - self.row_start
    }

    pub fn is_empty(&self) -> bool {
        self.row_end <= self.row_start
    }
}

/// Maps rows to partitions for a fixed `(H, P)`.
///
/// Deserialization goes through [`Partitioning::new`]; a serialized
/// `base` is recomputed, never trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "PartitioningFields")
)]
pub struct Partitioning {
    height: i64,
    count: usize,
    base: i64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PartitioningFields {
    height: i64,
    count: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<PartitioningFields> for Partitioning {
    type Error = ConfigError;

    fn try_from(f: PartitioningFields) -> std::result::Result<Self, ConfigError> {
        Self::new(f.height, f.count)
    }
}

impl Partitioning {
    /// Split `height` rows into `count` bands.
    pub fn new(height: i64, count: usize) -> std::result::Result<Self, ConfigError> {
        if height <= 0 {
            return Err(ConfigError::Height(height));
        }
        if count == 0 {
            return Err(ConfigError::NoPartitions);
        }
        Ok(Self {
            height,
            count,
            base: height / count as i64,
        })
    }

    /// Partitioning of `spec`'s rows.
    pub fn for_grid(spec: &GridSpec, count: usize) -> std::result::Result<Self, ConfigError> {
        Self::new(spec.height(), count)
    }

    #[inline]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub const fn height(&self) -> i64 {
        self.height
    }

    /// Rows owned by every partition except possibly the last.
    #[inline]
    pub const fn base_rows(&self) -> i64 {
        self.base
    }

    /// Partition owning `row`.
    pub fn partition_of(&self, row: i64) -> Result<usize> {
        if !(0..self.height).contains(&row) {
            return Err(Error::addressing(Axis::Row, row, self.height));
        }
        if self.base == 0 {
            return Ok(self.count - 1);
        }
        Ok(((row / self.base) as usize).min(self.count - 1))
    }

    /// Half-open row range `[start, end)` owned by partition `p`.
    pub fn row_range(&self, p: usize) -> Result<Range<i64>> {
        self.partition(p).map(|part| part.rows())
    }

    /// Partition `p` with its row range.
    pub fn partition(&self, p: usize) -> Result<Partition> {
        if p >= self.count {
            return Err(Error::addressing(
                Axis::Partition,
                p as i64,
                self.count as i64,
            ));
        }
        let row_start = p as i64 * self.base;
        let row_end = if p + 1 == self.count {
            self.height
        } else {
            row_start + self.base
        };
        Ok(Partition {
            index: p,
            row_start,
            row_end,
        })
    }

    /// All partitions in index order.
    pub fn partitions(&self) -> impl Iterator<Item = Partition> + '_ {
        (0..self.count).filter_map(move |p| self.partition(p).ok())
    }

    /// Check that a ring of `spec`'s radius never skips over a partition.
    ///
    /// Border edges must only join adjacent partitions, so the radius may
    /// not exceed the row span of a band. With a single partition, or when
    /// `H < P` puts every row in the last partition, there are no borders
    /// and any radius is accepted.
    pub fn check_radius(&self, spec: &GridSpec) -> std::result::Result<(), ConfigError> {
        if self.count > 1 && self.base > 0 && spec.radius() > self.base {
            return Err(ConfigError::RadiusExceedsSpan {
                radius: spec.radius(),
                rows: self.base,
            });
        }
        Ok(())
    }
}

/// Assigns the columns of every row to threads within a partition.
///
/// The first thread carries `imbalance` more of the row than each other
/// thread: with `T` threads and factor `f`, the first bucket's share is
/// `(1 + (T-1)·f) / T` and every other bucket's share is that minus `f`.
/// `f = 0` is a balanced split; `f = 1` puts every column on thread 0.
///
/// Serialize-only: the bucket bounds are derived state, rebuild with
/// [`ThreadMap::new`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ThreadMap {
    width: i64,
    bounds: Vec<f64>,
}

impl ThreadMap {
    pub fn new(width: i64, threads: usize, imbalance: f64) -> std::result::Result<Self, ConfigError> {
        if width <= 0 {
            return Err(ConfigError::Width(width));
        }
        if threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if !(0.0..=1.0).contains(&imbalance) {
            return Err(ConfigError::Imbalance(imbalance));
        }

        let t = threads as f64;
        let first = (1.0 + (t - 1.0) * imbalance) / t;
        let other = first - imbalance;

        let mut bounds = Vec::with_capacity(threads + 1);
        bounds.push(0.0);
        let mut edge = 0.0;
        for share in std::iter::once(first).chain(std::iter::repeat(other).take(threads - 1)) {
            edge += share * width as f64;
            bounds.push(edge);
        }

        Ok(Self { width, bounds })
    }

    /// A single thread owning every column.
    pub fn single(width: i64) -> std::result::Result<Self, ConfigError> {
        Self::new(width, 1, 0.0)
    }

    pub fn threads(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Thread owning column `col`.
    pub fn thread_of(&self, col: i64) -> Result<usize> {
        if !(0..self.width).contains(&col) {
            return Err(Error::addressing(Axis::Column, col, self.width));
        }
        let c = col as f64;
        Ok(self
            .bounds
            .windows(2)
            .position(|w| w[0] <= c && c < w[1])
            .unwrap_or(self.threads() - 1))
    }
}
