//! Per-partition node and port enumeration.
//!
//! A node's port set depends only on the global grid bounds, never on
//! partition bounds. The same node therefore exposes the same ports no
//! matter how many partitions exist, and both sides of a border edge
//! agree on the port set without asking each other.

use crate::error::Result;
use crate::{Coord, GridSpec, Offset, Partition, Port, ThreadMap};

/// One node of a partition: its position, thread and connected ports.
///
/// A pure topology descriptor; it carries no simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeDescriptor {
    pub coord: Coord,
    /// Thread within the owning partition.
    pub thread: usize,
    /// Ports in ascending order.
    pub ports: Vec<Port>,
}

impl NodeDescriptor {
    pub fn name(&self) -> String {
        self.coord.name()
    }

    pub fn has_port(&self, port: Port) -> bool {
        self.ports.binary_search(&port).is_ok()
    }
}

/// Instantiates the nodes of one partition.
#[derive(Debug, Clone)]
pub struct PartitionBuilder {
    spec: GridSpec,
    ring: Vec<Offset>,
    threads: ThreadMap,
}

impl PartitionBuilder {
    pub fn new(spec: GridSpec, threads: ThreadMap) -> Self {
        Self {
            ring: spec.ring_offsets(),
            spec,
            threads,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Ring offsets whose target from `coord` lies inside the grid,
    /// in ascending port order.
    pub fn valid_offsets(&self, coord: Coord) -> Result<Vec<Offset>> {
        self.spec.check(coord)?;
        Ok(self
            .ring
            .iter()
            .copied()
            .filter(|&o| self.spec.contains(coord + o))
            .collect())
    }

    /// Ports of the node at `coord`.
    pub fn ports_of(&self, coord: Coord) -> Result<Vec<Port>> {
        let codec = self.spec.codec();
        self.valid_offsets(coord)?
            .into_iter()
            .map(|o| codec.encode(o))
            .collect()
    }

    /// Every node owned by `partition`, row-major.
    ///
    /// An empty partition yields no nodes.
    pub fn nodes(&self, partition: &Partition) -> Result<Vec<NodeDescriptor>> {
        let width = self.spec.width();
        let mut nodes = Vec::with_capacity((partition.row_count().max(0) * width) as usize);
        for row in partition.rows() {
            for col in 0..width {
                let coord = Coord::new(row, col);
                nodes.push(NodeDescriptor {
                    coord,
                    thread: self.threads.thread_of(col)?,
                    ports: self.ports_of(coord)?,
                });
            }
        }
        Ok(nodes)
    }
}
