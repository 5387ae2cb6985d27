//! Grid coordinates, relative offsets and the offset ↔ port bijection.
//!
//! Every node sees the same `(2R+1)²` square lattice of relative offsets
//! around itself. Offsets are numbered row-major from `(R, R)` down to
//! `(-R, -R)`:
//!
//! ```text
//! port = (R - di) · S + (R - dj),   S = 2R + 1
//! ```
//!
//! This places the self-offset `(0, 0)` at the center port `(S² - 1) / 2`
//! and makes the port of `-o` the mirror image of the port of `o`:
//! `encode(-o) = S² - 1 - encode(o)`. Two endpoints of one edge therefore
//! agree on their pairing without consulting each other.

use std::ops::{Add, Neg, Sub};

use crate::error::{Error, Result};
use crate::ConfigError;

/// A node position: row `i`, column `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coord {
    pub row: i64,
    pub col: i64,
}

impl Coord {
    pub const ORIGIN: Self = Self { row: 0, col: 0 };

    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Component name handed to the simulation engine.
    pub fn name(&self) -> String {
        format!("comp_{}_{}", self.row, self.col)
    }
}

impl Add<Offset> for Coord {
    type Output = Self;

    #[inline]
    fn add(self, offset: Offset) -> Self {
        Self {
            row: self.row + offset.di,
            col: self.col + offset.dj,
        }
    }
}

impl Sub for Coord {
    type Output = Offset;

    #[inline]
    fn sub(self, other: Self) -> Offset {
        Offset {
            di: self.row - other.row,
            dj: self.col - other.col,
        }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A relative neighbor offset `(di, dj)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    pub di: i64,
    pub dj: i64,
}

impl Offset {
    /// The self-offset.
    pub const ZERO: Self = Self { di: 0, dj: 0 };

    pub const fn new(di: i64, dj: i64) -> Self {
        Self { di, dj }
    }

    /// Chebyshev length: `max(|di|, |dj|)`.
    pub fn chebyshev(&self) -> i64 {
        self.di.abs().max(self.dj.abs())
    }

    pub fn is_zero(&self) -> bool {
        self.di == 0 && self.dj == 0
    }

    /// True when the offset points to an earlier node in row-major order
    /// (`di < 0`, or `di == 0 && dj < 0`).
    ///
    /// Exactly one of `o` and `-o` satisfies this for every non-zero `o`.
    pub fn is_backward(&self) -> bool {
        self.di < 0 || (self.di == 0 && self.dj < 0)
    }
}

impl Neg for Offset {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            di: -self.di,
            dj: -self.dj,
        }
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:+}, {:+})", self.di, self.dj)
    }
}

/// A port number on a node, derived from an [`Offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Port(pub u32);

impl Port {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Port name handed to the simulation engine.
    pub fn name(&self) -> String {
        format!("port{}", self.0)
    }
}

impl From<u32> for Port {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Port> for u32 {
    fn from(value: Port) -> Self {
        value.0
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "port{}", self.0)
    }
}

/// Bijection between offsets in `[-R, R]²` and ports in `[0, S²)`.
///
/// The ring filter is not applied here; callers decide which offsets
/// are connected. `R` is capped at [`OffsetCodec::MAX_RADIUS`], which
/// keeps every port inside `u32` and every lattice small enough to
/// enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "OffsetCodecFields")
)]
pub struct OffsetCodec {
    radius: i64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct OffsetCodecFields {
    radius: i64,
}

#[cfg(feature = "serde")]
impl TryFrom<OffsetCodecFields> for OffsetCodec {
    type Error = ConfigError;

    fn try_from(fields: OffsetCodecFields) -> std::result::Result<Self, ConfigError> {
        Self::new(fields.radius)
    }
}

impl OffsetCodec {
    /// Largest accepted ring radius. `S² = 2049²` ports.
    pub const MAX_RADIUS: i64 = 1024;

    /// Create a codec for ring radius `radius` in `[0, MAX_RADIUS]`.
    pub fn new(radius: i64) -> std::result::Result<Self, ConfigError> {
        if !(0..=Self::MAX_RADIUS).contains(&radius) {
            return Err(ConfigError::Radius(radius));
        }
        Ok(Self { radius })
    }

    /// Radius already checked by [`GridSpec::new`](crate::GridSpec::new).
    pub(crate) const fn from_validated(radius: i64) -> Self {
        Self { radius }
    }

    #[inline]
    pub const fn radius(&self) -> i64 {
        self.radius
    }

    /// Lattice side length `S = 2R + 1`.
    #[inline]
    pub const fn side(&self) -> i64 {
        2 * self.radius + 1
    }

    /// Number of ports in the lattice, `S²`.
    #[inline]
    pub const fn port_count(&self) -> u64 {
        let s = self.side() as u64;
        s * s
    }

    /// The port of the self-offset.
    #[inline]
    pub const fn self_port(&self) -> Port {
        Port((self.radius * self.side() + self.radius) as u32)
    }

    /// Whether `offset` lies inside the lattice.
    pub fn contains(&self, offset: Offset) -> bool {
        offset.chebyshev() <= self.radius
    }

    /// Port for `offset`. Rejects offsets beyond the radius.
    pub fn encode(&self, offset: Offset) -> Result<Port> {
        if !self.contains(offset) {
            return Err(Error::OffsetOutOfRange {
                offset,
                radius: self.radius,
            });
        }
        let r = self.radius;
        Ok(Port(((r - offset.di) * self.side() + (r - offset.dj)) as u32))
    }

    /// Offset for `port`. Rejects ports outside `[0, S²)`.
    pub fn decode(&self, port: Port) -> Result<Offset> {
        let index = u64::from(port.0);
        if index >= self.port_count() {
            return Err(Error::PortOutOfRange {
                port,
                count: self.port_count(),
            });
        }
        let index = index as i64;
        let side = self.side();
        Ok(Offset {
            di: self.radius - index / side,
            dj: self.radius - index % side,
        })
    }

    /// Port of the negated offset, computed by reflection through the center.
    pub fn reciprocal(&self, port: Port) -> Result<Port> {
        let count = self.port_count();
        if u64::from(port.0) >= count {
            return Err(Error::PortOutOfRange { port, count });
        }
        Ok(Port((count - 1) as u32 - port.0))
    }

    /// Every offset of the lattice, in ascending port order.
    pub fn lattice(&self) -> impl Iterator<Item = Offset> {
        let r = self.radius;
        (-r..=r)
            .rev()
            .flat_map(move |di| (-r..=r).rev().map(move |dj| Offset { di, dj }))
    }
}
