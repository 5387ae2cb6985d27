//! Error types for phold-topology.

use thiserror::Error;

use crate::{Coord, Offset, Port};

/// Result type for topology construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Invalid grid, partition or placement parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Grid height must be at least one row.
    #[error("grid height must be positive, got {0}")]
    Height(i64),

    /// Grid width must be at least one column.
    #[error("grid width must be positive, got {0}")]
    Width(i64),

    /// Ring radius must lie in `[0, OffsetCodec::MAX_RADIUS]`.
    #[error("ring radius must lie in [0, {max}], got {0}", max = crate::OffsetCodec::MAX_RADIUS)]
    Radius(i64),

    /// Node count or border multiport size would not fit the index types.
    #[error("{height}x{width} grid with radius {radius} is too large to index")]
    GridTooLarge { height: i64, width: i64, radius: i64 },

    /// At least one partition is required.
    #[error("partition count must be positive")]
    NoPartitions,

    /// A ring would reach past the partition adjacent to its origin.
    #[error("ring radius {radius} exceeds the {rows}-row span of a partition")]
    RadiusExceedsSpan { radius: i64, rows: i64 },

    /// At least one thread per partition is required.
    #[error("thread count must be positive")]
    NoThreads,

    /// Imbalance factor must lie in [0, 1].
    #[error("imbalance factor must lie in [0, 1], got {0}")]
    Imbalance(f64),
}

/// Which coordinate an addressing query ran out of bounds on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
    Partition,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
            Axis::Partition => f.write_str("partition"),
        }
    }
}

/// Errors raised while building a topology.
///
/// Every variant is detected eagerly. Construction is deterministic, so
/// retrying a failed build fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid grid or partition parameters.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A row, column or partition was queried outside its valid range.
    #[error("{axis} {value} is outside [0, {bound})")]
    Addressing { axis: Axis, value: i64, bound: i64 },

    /// An offset lies outside the `[-R, R]²` lattice.
    #[error("offset {offset} lies outside the radius-{radius} lattice")]
    OffsetOutOfRange { offset: Offset, radius: i64 },

    /// A port lies outside the `S²`-port lattice.
    #[error("{port} lies outside the {count}-port lattice")]
    PortOutOfRange { port: Port, count: u64 },

    /// A border index or lane lies outside the multiport.
    #[error("border slot {index} lies outside a multiport of {count} slots")]
    SlotOutOfRange { index: u64, count: u64 },

    /// A link handed to the border codec does not cross the given boundary.
    #[error("link from {node} along {offset} does not cross the boundary above row {boundary}")]
    BorderGeometry {
        node: Coord,
        offset: Offset,
        boundary: i64,
    },

    /// Two border links were bound to the same multiport slot.
    #[error("border slot {index} is already bound")]
    SlotCollision { index: u64 },

    /// A reciprocity or border-agreement check failed.
    ///
    /// This is always a defect in the codecs, never a valid runtime state.
    #[error("codec invariant violated in partition {partition} at node {node}, offset {offset}: {reason}")]
    CodecInvariant {
        partition: usize,
        node: Coord,
        offset: Offset,
        reason: String,
    },
}

impl Error {
    pub(crate) fn addressing(axis: Axis, value: i64, bound: i64) -> Self {
        Error::Addressing { axis, value, bound }
    }

    pub(crate) fn invariant(
        partition: usize,
        node: Coord,
        offset: Offset,
        reason: impl Into<String>,
    ) -> Self {
        Error::CodecInvariant {
            partition,
            node,
            offset,
            reason: reason.into(),
        }
    }

    /// Attach the (partition, node, offset) triple to a lower-level codec failure.
    pub(crate) fn in_context(self, partition: usize, node: Coord, offset: Offset) -> Self {
        match self {
            Error::CodecInvariant { .. } => self,
            other => Error::invariant(partition, node, offset, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_lower_level_failures() {
        let err = Error::addressing(Axis::Column, 9, 4).in_context(2, Coord::new(5, 3), Offset::new(-1, 0));
        assert_eq!(
            err,
            Error::invariant(2, Coord::new(5, 3), Offset::new(-1, 0), "column 9 is outside [0, 4)")
        );
    }

    #[test]
    fn context_keeps_an_existing_invariant() {
        let inner = Error::invariant(1, Coord::new(0, 0), Offset::new(1, 1), "x");
        let outer = inner.clone().in_context(2, Coord::new(7, 7), Offset::new(0, 1));
        assert_eq!(outer, inner);
    }

    #[test]
    fn radius_message_names_the_limit() {
        let msg = ConfigError::Radius(40_000).to_string();
        assert_eq!(msg, "ring radius must lie in [0, 1024], got 40000");
    }
}
