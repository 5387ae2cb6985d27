//! Edge records shared by the planner, the border codec and the assembler.

use std::sync::Arc;

use crate::border::BorderSlot;
use crate::{Coord, Port};

/// Link latency, carried opaquely to the simulation engine (e.g. `"1ns"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkDelay(Arc<str>);

impl LinkDelay {
    pub fn new(delay: impl AsRef<str>) -> Self {
        Self(Arc::from(delay.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LinkDelay {
    fn default() -> Self {
        Self::new("1ns")
    }
}

impl From<&str> for LinkDelay {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for LinkDelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One side of an edge: a port on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Endpoint {
    pub node: Coord,
    pub port: Port,
}

impl Endpoint {
    pub const fn new(node: Coord, port: Port) -> Self {
        Self { node, port }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.node.name(), self.port)
    }
}

/// An undirected edge between two endpoints.
///
/// Endpoints are stored in ascending order, so the same logical edge
/// always compares equal regardless of which side built it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub a: Endpoint,
    pub b: Endpoint,
    pub delay: LinkDelay,
}

impl Edge {
    pub fn new(x: Endpoint, y: Endpoint, delay: LinkDelay) -> Self {
        let (a, b) = if y < x { (y, x) } else { (x, y) };
        Self { a, b, delay }
    }

    /// A self-edge joins a node's self port to itself.
    pub fn is_self(&self) -> bool {
        self.a == self.b
    }

    pub fn endpoints(&self) -> (Endpoint, Endpoint) {
        (self.a, self.b)
    }

    /// Link name handed to the simulation engine.
    pub fn name(&self) -> String {
        format!(
            "link_{}_{}_to_{}_{}",
            self.a.node.row, self.a.node.col, self.b.node.row, self.b.node.col
        )
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <-> {} ({})", self.a, self.b, self.delay)
    }
}

/// Which neighboring partition a border edge leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Toward partition `p - 1` (`di < 0`).
    North,
    /// Toward partition `p + 1` (`di > 0`).
    South,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::North => f.write_str("north"),
            Direction::South => f.write_str("south"),
        }
    }
}

/// The locally known half of an edge that crosses into a neighbor partition.
///
/// The remote endpoint is stood in for by `slot`, which the neighbor
/// partition computes identically for the same logical edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderLink {
    pub direction: Direction,
    pub slot: BorderSlot,
    pub local: Endpoint,
}

/// An edge record as emitted by one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRecord<'a> {
    Internal(&'a Edge),
    Border(&'a BorderLink),
}
