//! Edge planning for one partition.
//!
//! For each owned node `n` and each ring offset `o` with `n + o` inside the
//! grid, the planner emits exactly one record:
//!
//! - **Internal**: the neighbor lies in this partition. The edge is emitted
//!   from the endpoint for which `o` points backward (`di < 0`, or `di = 0`
//!   and `dj < 0`), so each internal pair appears once. A self-edge is
//!   emitted once from its node.
//! - **Border**: the neighbor lies in the partition above (`di < 0`) or
//!   below (`di > 0`). Only the local endpoint is known; it is bound to a
//!   border multiport slot that the neighbor partition computes
//!   identically (see [`crate::border`]).
//!
//! Every emitted edge is checked for reciprocity before it is recorded.

use tracing::debug;

use crate::border::{BorderCodec, BorderMultiport};
use crate::error::{Error, Result};
use crate::link::{BorderLink, Direction, Edge, Endpoint, LinkDelay, LinkRecord};
use crate::observer::LinkObserver;
use crate::{Coord, GridSpec, Offset, OffsetCodec, Partition, Partitioning, Port};

/// Every edge record touching the nodes of one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkPlan {
    pub partition: Partition,
    internal: Vec<Edge>,
    north: BorderMultiport,
    south: BorderMultiport,
}

impl LinkPlan {
    /// Edges with both endpoints in this partition, in emission order.
    pub fn internal(&self) -> &[Edge] {
        &self.internal
    }

    /// Slots facing partition `p - 1`.
    pub fn north(&self) -> &BorderMultiport {
        &self.north
    }

    /// Slots facing partition `p + 1`.
    pub fn south(&self) -> &BorderMultiport {
        &self.south
    }

    pub fn border(&self, direction: Direction) -> &BorderMultiport {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
        }
    }

    /// Border half-edges in both directions.
    pub fn border_links(&self) -> impl Iterator<Item = &BorderLink> {
        self.north.links().chain(self.south.links())
    }

    pub fn internal_count(&self) -> usize {
        self.internal.len()
    }

    pub fn border_count(&self) -> usize {
        self.north.len() + self.south.len()
    }

    /// Edge records emitted by this partition.
    pub fn edge_count(&self) -> usize {
        self.internal_count() + self.border_count()
    }

    /// Local port bindings: two per internal edge, one per self-edge or
    /// border half-edge.
    pub fn endpoint_count(&self) -> usize {
        let internal: usize = self
            .internal
            .iter()
            .map(|e| if e.is_self() { 1 } else { 2 })
            .sum();
        internal + self.border_count()
    }
}

/// Classifies and emits the edges of one partition.
#[derive(Debug, Clone)]
pub struct LinkPlanner {
    spec: GridSpec,
    partitioning: Partitioning,
    ring: Vec<Offset>,
    border: BorderCodec,
    delay: LinkDelay,
}

impl LinkPlanner {
    /// Planner for `spec` split into `partitions` row bands.
    ///
    /// Fails when a ring could skip over an adjacent partition.
    pub fn new(spec: GridSpec, partitions: usize, delay: LinkDelay) -> Result<Self> {
        let partitioning = Partitioning::for_grid(&spec, partitions)?;
        partitioning.check_radius(&spec)?;
        Ok(Self {
            ring: spec.ring_offsets(),
            border: BorderCodec::new(&spec),
            spec,
            partitioning,
            delay,
        })
    }

    /// Replace the delay carried on every edge.
    #[must_use]
    pub fn with_delay(mut self, delay: LinkDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn partitioning(&self) -> &Partitioning {
        &self.partitioning
    }

    pub fn border_codec(&self) -> &BorderCodec {
        &self.border
    }

    pub fn delay(&self) -> &LinkDelay {
        &self.delay
    }

    /// Plan every edge touching partition `index`.
    ///
    /// `observer` is called once per emitted record.
    pub fn plan<O>(&self, index: usize, observer: &O) -> Result<LinkPlan>
    where
        O: LinkObserver + ?Sized,
    {
        let partition = self.partitioning.partition(index)?;
        let codec = self.spec.codec();

        let mut plan = LinkPlan {
            partition,
            internal: Vec::new(),
            north: BorderMultiport::new(
                Direction::North,
                partition.row_start,
                self.north_capacity(&partition),
            ),
            south: BorderMultiport::new(
                Direction::South,
                partition.row_end,
                self.south_capacity(&partition),
            ),
        };

        for row in partition.rows() {
            for col in 0..self.spec.width() {
                let node = Coord::new(row, col);
                for &offset in &self.ring {
                    let neighbor = node + offset;
                    if !self.spec.contains(neighbor) {
                        continue;
                    }
                    let port = codec
                        .encode(offset)
                        .map_err(|e| e.in_context(index, node, offset))?;

                    if partition.contains_row(neighbor.row) {
                        if !(offset.is_backward() || offset.is_zero()) {
                            continue;
                        }
                        let remote = reciprocal_port(&codec, index, node, port, offset)?;
                        let edge = Edge::new(
                            Endpoint::new(node, port),
                            Endpoint::new(neighbor, remote),
                            self.delay.clone(),
                        );
                        observer.on_link(index, LinkRecord::Internal(&edge));
                        plan.internal.push(edge);
                    } else {
                        let link = self.border_link(&partition, node, offset, port)?;
                        let multiport = match link.direction {
                            Direction::North => &mut plan.north,
                            Direction::South => &mut plan.south,
                        };
                        let bound = multiport
                            .bind(self.border.flat(link.slot), link)
                            .map_err(|e| e.in_context(index, node, offset))?;
                        observer.on_link(index, LinkRecord::Border(bound));
                    }
                }
            }
        }

        debug!(
            partition = index,
            rows = ?partition.rows(),
            internal = plan.internal_count(),
            north = plan.north.len(),
            south = plan.south.len(),
            "planned partition"
        );
        Ok(plan)
    }

    /// Half-edge for a link leaving this partition.
    fn border_link(
        &self,
        partition: &Partition,
        node: Coord,
        offset: Offset,
        port: Port,
    ) -> Result<BorderLink> {
        let index = partition.index;
        let (direction, boundary, expected) = if offset.di < 0 {
            (Direction::North, partition.row_start, index.checked_sub(1))
        } else {
            (Direction::South, partition.row_end, Some(index + 1))
        };

        let neighbor = node + offset;
        let owner = self
            .partitioning
            .partition_of(neighbor.row)
            .map_err(|e| e.in_context(index, node, offset))?;
        if Some(owner) != expected {
            return Err(Error::invariant(
                index,
                node,
                offset,
                format!("neighbor {} lies in non-adjacent partition {}", neighbor, owner),
            ));
        }

        let slot = self
            .border
            .slot(boundary, node, offset)
            .map_err(|e| e.in_context(index, node, offset))?;

        // The slot alone must name this endpoint on our side of the boundary.
        let (upper, lower) = self
            .border
            .endpoints(boundary, slot)
            .map_err(|e| e.in_context(index, node, offset))?;
        let local = Endpoint::new(node, port);
        let (mine, theirs) = match direction {
            Direction::South => (upper, lower),
            Direction::North => (lower, upper),
        };
        if mine != local || theirs.node != neighbor {
            return Err(Error::invariant(
                index,
                node,
                offset,
                format!(
                    "border slot (lane {}, index {}) resolves to {} <-> {}",
                    slot.lane, slot.index, mine, theirs
                ),
            ));
        }

        Ok(BorderLink {
            direction,
            slot,
            local,
        })
    }

    fn north_capacity(&self, partition: &Partition) -> u64 {
        if partition.index == 0 || partition.is_empty() {
            0
        } else {
            self.border.capacity()
        }
    }

    fn south_capacity(&self, partition: &Partition) -> u64 {
        if partition.index + 1 == self.partitioning.count() || partition.is_empty() {
            0
        } else {
            self.border.capacity()
        }
    }
}

/// Port at the far end of `offset`, checked against the reflection identity.
fn reciprocal_port(
    codec: &OffsetCodec,
    index: usize,
    node: Coord,
    port: Port,
    offset: Offset,
) -> Result<Port> {
    let ctx = |e: Error| e.in_context(index, node, offset);
    let remote = codec.encode(-offset).map_err(ctx)?;
    let reflected = codec.reciprocal(port).map_err(ctx)?;
    let back = codec.decode(remote).map_err(ctx)?;
    if reflected != remote || back != -offset {
        return Err(Error::invariant(
            index,
            node,
            offset,
            format!("{} reflects to {} but the reverse offset encodes to {}", port, reflected, remote),
        ));
    }
    Ok(remote)
}
