//! Centralized reference enumeration.
//!
//! Walks every node and every ring offset of the whole grid in one place,
//! `O(H · W · S²)`, and deduplicates symmetric pairs. A partitioned build
//! must reproduce this edge set exactly.

use std::collections::BTreeMap;

use crate::link::Endpoint;
use crate::{Edge, GridSpec, Result};

/// Unordered endpoint pair, lower endpoint first.
pub type EndpointPair = (Endpoint, Endpoint);

/// Every edge of `spec`'s grid, sorted and without duplicates.
pub fn enumerate(spec: &GridSpec) -> Result<Vec<EndpointPair>> {
    let codec = spec.codec();
    let ring = spec.ring_offsets();
    let mut pairs = Vec::new();
    for node in spec.coords() {
        for &offset in &ring {
            let neighbor = node + offset;
            if !spec.contains(neighbor) {
                continue;
            }
            let here = Endpoint::new(node, codec.encode(offset)?);
            let there = Endpoint::new(neighbor, codec.encode(-offset)?);
            pairs.push(if there < here { (there, here) } else { (here, there) });
        }
    }
    pairs.sort_unstable();
    pairs.dedup();
    Ok(pairs)
}

/// Differences between a built edge list and the reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceDiff {
    /// In the reference but not built.
    pub missing: Vec<EndpointPair>,
    /// Built but not in the reference.
    pub unexpected: Vec<EndpointPair>,
    /// Built more than once, with the number of copies.
    pub duplicated: Vec<(EndpointPair, usize)>,
}

impl ReferenceDiff {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.duplicated.is_empty()
    }
}

impl std::fmt::Display for ReferenceDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} missing, {} unexpected, {} duplicated",
            self.missing.len(),
            self.unexpected.len(),
            self.duplicated.len()
        )
    }
}

/// Compare `edges` against the reference enumeration of `spec`.
pub fn compare<'a>(
    spec: &GridSpec,
    edges: impl IntoIterator<Item = &'a Edge>,
) -> Result<ReferenceDiff> {
    let mut built: BTreeMap<EndpointPair, usize> = BTreeMap::new();
    for edge in edges {
        *built.entry(edge.endpoints()).or_default() += 1;
    }

    let mut diff = ReferenceDiff::default();
    for pair in enumerate(spec)? {
        match built.remove(&pair) {
            None => diff.missing.push(pair),
            Some(1) => {}
            Some(n) => diff.duplicated.push((pair, n)),
        }
    }
    diff.unexpected.extend(built.into_keys());
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Coord, LinkDelay, Port};

    #[test]
    fn counts_for_small_grids() {
        // 8x8, radius 1: 56 horizontal + 56 vertical + 98 diagonal.
        let spec = GridSpec::new(8, 8, 1, false).unwrap();
        assert_eq!(enumerate(&spec).unwrap().len(), 210);

        let spec = GridSpec::new(8, 8, 1, true).unwrap();
        assert_eq!(enumerate(&spec).unwrap().len(), 210 + 64);
    }

    #[test]
    fn radius_zero() {
        let spec = GridSpec::new(5, 7, 0, false).unwrap();
        assert!(enumerate(&spec).unwrap().is_empty());

        let spec = GridSpec::new(5, 7, 0, true).unwrap();
        let pairs = enumerate(&spec).unwrap();
        assert_eq!(pairs.len(), 35);
        assert!(pairs.iter().all(|(a, b)| a == b));
    }

    #[test]
    fn diff_reports_each_kind() {
        let spec = GridSpec::new(1, 2, 1, false).unwrap();
        let pairs = enumerate(&spec).unwrap();
        assert_eq!(pairs.len(), 1);

        let delay = LinkDelay::default();
        let (a, b) = pairs[0];
        let good = Edge::new(a, b, delay.clone());
        let stray = Edge::new(
            Endpoint::new(Coord::new(0, 0), Port(4)),
            Endpoint::new(Coord::new(0, 0), Port(4)),
            delay,
        );

        assert!(compare(&spec, [&good]).unwrap().is_clean());
        assert_eq!(compare(&spec, Vec::<&Edge>::new()).unwrap().missing, pairs);

        let diff = compare(&spec, [&good, &good, &stray]).unwrap();
        assert_eq!(diff.duplicated, vec![(pairs[0], 2)]);
        assert_eq!(diff.unexpected, vec![stray.endpoints()]);
    }
}
