//! PHOLD Ring-Grid Topology
//!
//! Partition-independent construction of a 2-D ring-grid graph for
//! distributed discrete-event simulation.
//!
//! # Layout
//!
//! Nodes sit on an `H × W` grid. Each node links to every node within
//! Chebyshev distance `R`, and optionally to itself. The grid is cut into
//! `P` horizontal bands of rows, one per partition. Every partition builds
//! its own nodes and edges from arithmetic alone: no partition reads
//! another's state, and the same node exposes the same ports whatever `P`
//! is.
//!
//! # Ports
//!
//! The offset `(di, dj)` maps to port `(R - di)·S + (R - dj)` with
//! `S = 2R + 1`. The opposite offset maps to `S² - 1 - port`, so both ends
//! of an edge can compute each other's port without talking.
//!
//! # Borders
//!
//! An edge crossing a partition boundary is split into two half-edges
//! bound to the same slot of a border multiport, one on each side. Both
//! sides derive the slot from the southward originator of the edge; see
//! [`border`] for the keying.
//!
//! # Example
//!
//! ```
//! use phold_topology::{GridSpec, TopologyAssembler};
//!
//! let spec = GridSpec::new(8, 8, 1, false)?;
//! let graph = TopologyAssembler::new(spec, 2)?.build()?;
//! assert_eq!(graph.edge_count(), 210);
//! assert!(graph.verify()?.is_clean());
//! # Ok::<(), phold_topology::Error>(())
//! ```

mod assembler;
pub mod border;
mod builder;
mod error;
mod grid;
mod link;
mod observer;
mod offset;
mod partition;
mod planner;
pub mod reference;

pub use assembler::{build, Graph, PartitionFragment, TopologyAssembler};
pub use border::{BorderCodec, BorderMultiport, BorderSlot};
pub use builder::{NodeDescriptor, PartitionBuilder};
pub use error::{Axis, ConfigError, Error, Result};
pub use grid::GridSpec;
pub use link::{BorderLink, Direction, Edge, Endpoint, LinkDelay, LinkRecord};
pub use observer::{LinkObserver, NoopObserver, TracingObserver};
pub use offset::{Coord, Offset, OffsetCodec, Port};
pub use partition::{Partition, Partitioning, ThreadMap};
pub use planner::{LinkPlan, LinkPlanner};

/// Grid height used when none is configured.
pub const DEFAULT_HEIGHT: i64 = 10;

/// Grid width used when none is configured.
pub const DEFAULT_WIDTH: i64 = 10;

/// Ring radius used when none is configured.
pub const DEFAULT_RADIUS: i64 = 1;
