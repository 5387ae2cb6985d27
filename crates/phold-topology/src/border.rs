//! Border slot indexing shared by adjacent partitions.
//!
//! Partitions are built without communicating, so an edge crossing from
//! partition `p` into `p + 1` cannot name its remote endpoint. Instead both
//! sides bind their local endpoint to a slot of a *border multiport*, and
//! the slot number is computed from each side's local view alone.
//!
//! # Keying
//!
//! Every crossing edge is keyed by its **southward originator**: the
//! endpoint in the upper partition, together with the offset pointing
//! down into the lower one (`di > 0`). The canonical index is
//!
//! ```text
//! border_index(j, o) = j · S² + encode(o)
//! ```
//!
//! The upper side sees the originator directly. The lower side, holding
//! node `(i', j')` and offset `o' = (di', dj')` with `di' < 0`, reconstructs
//! it by inverting the step: originator column `j = j' + dj'`, originator
//! offset `o = -o'`.
//!
//! # Lanes
//!
//! For `R ≥ 2`, originators on different rows above the boundary share
//! `(j, o)`: row `b-1` with `(2, 0)` and row `b-2` with `(2, 0)` both cross.
//! The multiport is therefore split into `R` lanes by *depth*, the
//! originator's distance above the boundary row `b`:
//!
//! ```text
//! lane = b - 1 - i,   0 ≤ lane < di ≤ R
//! ```
//!
//! The upper side knows `i`; the lower side computes `i = i' + di'`. Both
//! obtain the same `(lane, index)` pair, and distinct crossing edges
//! obtain distinct pairs because `(lane, j, o)` determines the originator
//! `(b - 1 - lane, j)` and its offset.

use std::collections::BTreeMap;

use crate::error::{Axis, Error, Result};
use crate::link::{BorderLink, Direction, Endpoint};
use crate::{Coord, GridSpec, Offset, OffsetCodec};

/// A slot of a border multiport: a depth lane and the canonical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderSlot {
    pub lane: u32,
    pub index: u64,
}

/// Computes border slots from either side of a partition boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderCodec {
    codec: OffsetCodec,
    width: i64,
}

impl BorderCodec {
    pub fn new(spec: &GridSpec) -> Self {
        Self {
            codec: spec.codec(),
            width: spec.width(),
        }
    }

    pub fn codec(&self) -> OffsetCodec {
        self.codec
    }

    /// Slots reserved per column, `S²`.
    #[inline]
    pub fn slots_per_column(&self) -> u64 {
        self.codec.port_count()
    }

    /// Slots in one depth lane, `W · S²`.
    #[inline]
    pub fn lane_width(&self) -> u64 {
        self.width as u64 * self.slots_per_column()
    }

    /// Number of depth lanes, `R`.
    #[inline]
    pub fn lanes(&self) -> u32 {
        self.codec.radius() as u32
    }

    /// Total slots of a multiport, `R · W · S²`.
    #[inline]
    pub fn capacity(&self) -> u64 {
        u64::from(self.lanes()) * self.lane_width()
    }

    /// Canonical index `column · S² + encode(offset)`.
    pub fn border_index(&self, column: i64, offset: Offset) -> Result<u64> {
        if !(0..self.width).contains(&column) {
            return Err(Error::addressing(Axis::Column, column, self.width));
        }
        let port = self.codec.encode(offset)?;
        Ok(column as u64 * self.slots_per_column() + u64::from(port.0))
    }

    /// Invert [`border_index`](Self::border_index) to `(column, offset)`.
    pub fn decode_index(&self, index: u64) -> Result<(i64, Offset)> {
        if index >= self.lane_width() {
            return Err(Error::SlotOutOfRange {
                index,
                count: self.lane_width(),
            });
        }
        let per_column = self.slots_per_column();
        let column = (index / per_column) as i64;
        let offset = self.codec.decode(crate::Port((index % per_column) as u32))?;
        Ok((column, offset))
    }

    /// Southward originator `(node, offset)` of the edge leaving `local`
    /// along `offset`.
    pub fn originator(local: Coord, offset: Offset) -> (Coord, Offset) {
        if offset.di < 0 {
            (local + offset, -offset)
        } else {
            (local, offset)
        }
    }

    /// Slot of the edge leaving `local` along `offset` across the boundary
    /// whose first lower row is `boundary`.
    ///
    /// Works from either side: the upper partition passes a southward
    /// offset, the lower partition a northward one.
    pub fn slot(&self, boundary: i64, local: Coord, offset: Offset) -> Result<BorderSlot> {
        let (origin, down) = Self::originator(local, offset);
        let lane = boundary - 1 - origin.row;
        if down.di <= 0 || lane < 0 || lane >= down.di {
            return Err(Error::BorderGeometry {
                node: local,
                offset,
                boundary,
            });
        }
        Ok(BorderSlot {
            lane: lane as u32,
            index: self.border_index(origin.col, down)?,
        })
    }

    /// Both endpoints of the edge behind `slot`, upper first.
    ///
    /// Reconstructed from the slot alone; used to cross-check what each
    /// side bound.
    pub fn endpoints(&self, boundary: i64, slot: BorderSlot) -> Result<(Endpoint, Endpoint)> {
        if slot.lane >= self.lanes() {
            return Err(Error::SlotOutOfRange {
                index: self.flat(slot),
                count: self.capacity(),
            });
        }
        let (column, down) = self.decode_index(slot.index)?;
        let origin = Coord::new(boundary - 1 - i64::from(slot.lane), column);
        if down.di <= i64::from(slot.lane) {
            return Err(Error::BorderGeometry {
                node: origin,
                offset: down,
                boundary,
            });
        }
        let upper = Endpoint::new(origin, self.codec.encode(down)?);
        let lower = Endpoint::new(origin + down, self.codec.encode(-down)?);
        Ok((upper, lower))
    }

    /// Flat position `lane · W · S² + index` of `slot` in a multiport.
    pub fn flat(&self, slot: BorderSlot) -> u64 {
        u64::from(slot.lane) * self.lane_width() + slot.index
    }
}

/// Partition-local array of border slots facing one neighbor.
///
/// Each bound slot stands in for the neighbor partition's endpoint of one
/// crossing edge until the fragments are stitched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BorderMultiport {
    direction: Direction,
    /// First row of the lower partition at this boundary.
    boundary: i64,
    capacity: u64,
    slots: BTreeMap<u64, BorderLink>,
}

impl BorderMultiport {
    pub fn new(direction: Direction, boundary: i64, capacity: u64) -> Self {
        Self {
            direction,
            boundary,
            capacity,
            slots: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn boundary(&self) -> i64 {
        self.boundary
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bind `link` at flat position `position`. Each slot binds once.
    pub fn bind(&mut self, position: u64, link: BorderLink) -> Result<&BorderLink> {
        if position >= self.capacity {
            return Err(Error::SlotOutOfRange {
                index: position,
                count: self.capacity,
            });
        }
        match self.slots.entry(position) {
            std::collections::btree_map::Entry::Occupied(_) => {
                Err(Error::SlotCollision { index: position })
            }
            std::collections::btree_map::Entry::Vacant(entry) => Ok(entry.insert(link)),
        }
    }

    pub fn get(&self, position: u64) -> Option<&BorderLink> {
        self.slots.get(&position)
    }

    /// Bound slots in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &BorderLink)> {
        self.slots.iter().map(|(&pos, link)| (pos, link))
    }

    pub fn links(&self) -> impl Iterator<Item = &BorderLink> {
        self.slots.values()
    }
}
