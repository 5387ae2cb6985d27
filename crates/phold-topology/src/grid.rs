//! Grid dimensions and the ring filter.

use crate::error::{Axis, ConfigError, Error, Result};
use crate::{Coord, Offset, OffsetCodec};

/// Global grid parameters shared by every partition.
///
/// Height `H` and width `W` are positive, the ring radius `R` lies in
/// `[0, OffsetCodec::MAX_RADIUS]`, `H · W` fits `i64` and a border
/// multiport of `R · W · S²` slots fits `u64`. [`GridSpec::new`] enforces
/// this, including when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "GridSpecFields")
)]
pub struct GridSpec {
    height: i64,
    width: i64,
    radius: i64,
    self_links: bool,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct GridSpecFields {
    height: i64,
    width: i64,
    radius: i64,
    self_links: bool,
}

#[cfg(feature = "serde")]
impl TryFrom<GridSpecFields> for GridSpec {
    type Error = ConfigError;

    fn try_from(f: GridSpecFields) -> std::result::Result<Self, ConfigError> {
        Self::new(f.height, f.width, f.radius, f.self_links)
    }
}

impl GridSpec {
    /// Validate and create a grid specification.
    pub fn new(
        height: i64,
        width: i64,
        radius: i64,
        self_links: bool,
    ) -> std::result::Result<Self, ConfigError> {
        if height <= 0 {
            return Err(ConfigError::Height(height));
        }
        if width <= 0 {
            return Err(ConfigError::Width(width));
        }
        let codec = OffsetCodec::new(radius)?;

        let too_large = ConfigError::GridTooLarge {
            height,
            width,
            radius,
        };
        let nodes = height.checked_mul(width);
        let rows = height.checked_add(radius);
        let cols = width.checked_add(radius);
        let slots = (width as u64)
            .checked_mul(codec.port_count())
            .and_then(|s| s.checked_mul(radius.max(1) as u64));
        if nodes.is_none() || rows.is_none() || cols.is_none() || slots.is_none() {
            return Err(too_large);
        }

        Ok(Self {
            height,
            width,
            radius,
            self_links,
        })
    }

    #[inline]
    pub const fn height(&self) -> i64 {
        self.height
    }

    #[inline]
    pub const fn width(&self) -> i64 {
        self.width
    }

    #[inline]
    pub const fn radius(&self) -> i64 {
        self.radius
    }

    #[inline]
    pub const fn self_links(&self) -> bool {
        self.self_links
    }

    /// Total number of nodes, `H · W`.
    pub const fn node_count(&self) -> u64 {
        self.height as u64 * self.width as u64
    }

    /// The offset codec for this grid's radius.
    pub const fn codec(&self) -> OffsetCodec {
        OffsetCodec::from_validated(self.radius)
    }

    /// Whether `coord` lies inside `[0, H) × [0, W)`.
    pub fn contains(&self, coord: Coord) -> bool {
        (0..self.height).contains(&coord.row) && (0..self.width).contains(&coord.col)
    }

    /// Fail with an addressing error when `coord` lies outside the grid.
    pub fn check(&self, coord: Coord) -> Result<()> {
        if !(0..self.height).contains(&coord.row) {
            return Err(Error::addressing(Axis::Row, coord.row, self.height));
        }
        if !(0..self.width).contains(&coord.col) {
            return Err(Error::addressing(Axis::Column, coord.col, self.width));
        }
        Ok(())
    }

    /// The ring filter: `1 ≤ max(|di|, |dj|) ≤ R`, or the self-offset when
    /// self-links are enabled.
    pub fn admits(&self, offset: Offset) -> bool {
        match offset.chebyshev() {
            0 => self.self_links,
            d => d <= self.radius,
        }
    }

    /// Offsets passing the ring filter, in ascending port order.
    pub fn ring_offsets(&self) -> Vec<Offset> {
        self.codec().lattice().filter(|o| self.admits(*o)).collect()
    }

    /// Every node of the grid in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Coord::new(row, col)))
    }
}

impl std::fmt::Display for GridSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} grid, radius {}{}",
            self.height,
            self.width,
            self.radius,
            if self.self_links { ", self-links" } else { "" }
        )
    }
}
