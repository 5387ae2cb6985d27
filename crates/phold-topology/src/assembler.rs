//! Whole-graph assembly from independently built partitions.
//!
//! Each partition's fragment depends only on the grid, its own row range
//! and arithmetic, so fragments are built in parallel without locks. The
//! assembler then pairs every partition's southward border multiport with
//! the next partition's northward one, slot by slot, and unions the result
//! with all internal edges.

use rayon::prelude::*;
use tracing::info;

use crate::builder::{NodeDescriptor, PartitionBuilder};
use crate::error::{Error, Result};
use crate::link::{BorderLink, Edge, LinkDelay};
use crate::observer::{LinkObserver, NoopObserver};
use crate::planner::{LinkPlan, LinkPlanner};
use crate::reference::{self, ReferenceDiff};
use crate::{Coord, GridSpec, Partition, Partitioning, ThreadMap};

/// Everything one partition contributes: its nodes with their ports, its
/// internal edges and its border multiports.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionFragment {
    pub partition: Partition,
    pub nodes: Vec<NodeDescriptor>,
    pub links: LinkPlan,
}

impl PartitionFragment {
    pub fn index(&self) -> usize {
        self.partition.index
    }

    pub fn internal(&self) -> &[Edge] {
        self.links.internal()
    }

    pub fn border_links(&self) -> impl Iterator<Item = &BorderLink> {
        self.links.border_links()
    }

    /// Total ports across this fragment's nodes.
    pub fn port_count(&self) -> usize {
        self.nodes.iter().map(|n| n.ports.len()).sum()
    }

    fn node(&self, width: i64, coord: Coord) -> Option<&NodeDescriptor> {
        if !self.partition.contains_row(coord.row) {
            return None;
        }
        let slot = (coord.row - self.partition.row_start) * width + coord.col;
        self.nodes.get(usize::try_from(slot).ok()?)
    }
}

/// The assembled topology handed to the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Graph {
    spec: GridSpec,
    partitioning: Partitioning,
    delay: LinkDelay,
    fragments: Vec<PartitionFragment>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn partitioning(&self) -> &Partitioning {
        &self.partitioning
    }

    pub fn delay(&self) -> &LinkDelay {
        &self.delay
    }

    pub fn fragments(&self) -> &[PartitionFragment] {
        &self.fragments
    }

    pub fn fragment(&self, partition: usize) -> Option<&PartitionFragment> {
        self.fragments.get(partition)
    }

    /// All nodes, row-major.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.fragments.iter().flat_map(|f| f.nodes.iter())
    }

    pub fn node_count(&self) -> usize {
        self.fragments.iter().map(|f| f.nodes.len()).sum()
    }

    /// Every edge exactly once, sorted by endpoints.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn internal_edge_count(&self) -> usize {
        self.fragments.iter().map(|f| f.links.internal_count()).sum()
    }

    /// Edges crossing a partition boundary.
    pub fn border_edge_count(&self) -> usize {
        self.fragments.iter().map(|f| f.links.south().len()).sum()
    }

    /// Compare against the exhaustive centralized enumeration.
    pub fn verify(&self) -> Result<ReferenceDiff> {
        reference::compare(&self.spec, &self.edges)
    }
}

/// Build the whole graph for `spec` split into `partitions` row bands.
pub fn build(spec: GridSpec, partitions: usize) -> Result<Graph> {
    TopologyAssembler::new(spec, partitions)?.build()
}

/// Builds partition fragments and stitches them into a [`Graph`].
#[derive(Debug, Clone)]
pub struct TopologyAssembler<O = NoopObserver> {
    builder: PartitionBuilder,
    planner: LinkPlanner,
    observer: O,
    parallel: bool,
}

impl TopologyAssembler<NoopObserver> {
    /// Assembler for `spec` split into `partitions` row bands, one thread
    /// per partition and a `1ns` link delay.
    pub fn new(spec: GridSpec, partitions: usize) -> Result<Self> {
        Ok(Self {
            builder: PartitionBuilder::new(spec, ThreadMap::single(spec.width())?),
            planner: LinkPlanner::new(spec, partitions, LinkDelay::default())?,
            observer: NoopObserver,
            parallel: true,
        })
    }
}

impl<O: LinkObserver> TopologyAssembler<O> {
    /// Delay carried on every edge.
    #[must_use]
    pub fn with_delay(mut self, delay: LinkDelay) -> Self {
        self.planner = self.planner.with_delay(delay);
        self
    }

    /// Spread each row over `threads` threads with the given imbalance.
    pub fn with_threads(mut self, threads: usize, imbalance: f64) -> Result<Self> {
        let spec = *self.builder.spec();
        self.builder = PartitionBuilder::new(spec, ThreadMap::new(spec.width(), threads, imbalance)?);
        Ok(self)
    }

    /// Observer invoked once per emitted edge record.
    pub fn with_observer<P: LinkObserver>(self, observer: P) -> TopologyAssembler<P> {
        TopologyAssembler {
            builder: self.builder,
            planner: self.planner,
            observer,
            parallel: self.parallel,
        }
    }

    /// Build partitions one after another instead of on the rayon pool.
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn spec(&self) -> &GridSpec {
        self.planner.spec()
    }

    pub fn partitioning(&self) -> &Partitioning {
        self.planner.partitioning()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Build one partition's fragment without touching any other partition.
    pub fn build_partition(&self, partition: usize) -> Result<PartitionFragment> {
        let part = self.partitioning().partition(partition)?;
        let nodes = self.builder.nodes(&part)?;
        let links = self.planner.plan(partition, &self.observer)?;
        let fragment = PartitionFragment {
            partition: part,
            nodes,
            links,
        };
        self.check_ports(&fragment)?;
        Ok(fragment)
    }

    /// Build every partition and stitch them into one graph.
    pub fn build(&self) -> Result<Graph> {
        let count = self.partitioning().count();
        let fragments: Vec<PartitionFragment> = if self.parallel {
            (0..count)
                .into_par_iter()
                .map(|p| self.build_partition(p))
                .collect::<Result<_>>()?
        } else {
            (0..count)
                .map(|p| self.build_partition(p))
                .collect::<Result<_>>()?
        };

        let edges = self.stitch(&fragments)?;
        let graph = Graph {
            spec: *self.spec(),
            partitioning: *self.partitioning(),
            delay: self.planner.delay().clone(),
            fragments,
            edges,
        };

        info!(
            grid = %graph.spec,
            partitions = count,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            border = graph.border_edge_count(),
            "assembled topology"
        );
        Ok(graph)
    }

    /// Union internal edges with matched border slots.
    fn stitch(&self, fragments: &[PartitionFragment]) -> Result<Vec<Edge>> {
        let border = self.planner.border_codec();
        let codec = border.codec();
        let delay = self.planner.delay();

        let mut edges: Vec<Edge> = fragments
            .iter()
            .flat_map(|f| f.internal().iter().cloned())
            .collect();

        for pair in fragments.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            let south = upper.links.south();
            let north = lower.links.north();

            for (position, link) in south.iter() {
                let offset = codec.decode(link.local.port).unwrap_or_default();
                let fail = |reason: String| {
                    Error::invariant(upper.index(), link.local.node, offset, reason)
                };

                let remote = north.get(position).ok_or_else(|| {
                    fail(format!(
                        "border slot {} has no counterpart in partition {}",
                        position,
                        lower.index()
                    ))
                })?;
                let (a, b) = border
                    .endpoints(south.boundary(), link.slot)
                    .map_err(|e| e.in_context(upper.index(), link.local.node, offset))?;
                if remote.slot != link.slot || a != link.local || b != remote.local {
                    return Err(fail(format!(
                        "slot {} pairs {} with {}, but resolves to {} <-> {}",
                        position, link.local, remote.local, a, b
                    )));
                }
                edges.push(Edge::new(link.local, remote.local, delay.clone()));
            }

            if let Some((position, orphan)) = north.iter().find(|(pos, _)| south.get(*pos).is_none()) {
                return Err(Error::invariant(
                    lower.index(),
                    orphan.local.node,
                    codec.decode(orphan.local.port).unwrap_or_default(),
                    format!(
                        "border slot {} has no counterpart in partition {}",
                        position,
                        upper.index()
                    ),
                ));
            }
        }

        edges.sort_unstable();
        Ok(edges)
    }

    /// Every endpoint a fragment binds must be a port its node exposes.
    fn check_ports(&self, fragment: &PartitionFragment) -> Result<()> {
        let width = self.spec().width();
        let codec = self.spec().codec();
        let internal = fragment.internal().iter().flat_map(|e| [e.a, e.b]);
        let border = fragment.border_links().map(|l| l.local);
        for endpoint in internal.chain(border) {
            let exposed = fragment
                .node(width, endpoint.node)
                .is_some_and(|n| n.has_port(endpoint.port));
            if !exposed {
                return Err(Error::invariant(
                    fragment.index(),
                    endpoint.node,
                    codec.decode(endpoint.port).unwrap_or_default(),
                    format!("{} is not a port of {}", endpoint.port, endpoint.node),
                ));
            }
        }
        Ok(())
    }
}
