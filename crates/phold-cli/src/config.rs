//! Run configuration for `phold-topo`.

use std::fmt::Display;
use std::str::FromStr;

use phold_topology::{GridSpec, LinkDelay, TopologyAssembler, TracingObserver};
use thiserror::Error;

/// An environment variable that is set but cannot be parsed.
#[derive(Debug, Error)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct EnvError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Topology configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyConfig {
    /// Grid rows
    pub height: i64,

    /// Grid columns
    pub width: i64,

    /// Ring radius
    pub rings: i64,

    /// Whether every node links to itself
    pub self_links: bool,

    /// Partitions (ranks)
    pub ranks: usize,

    /// Threads per rank
    pub threads: usize,

    /// Column skew toward thread 0, in [0, 1]
    pub imbalance: f64,

    /// Delay carried on every link
    pub link_delay: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            height: phold_topology::DEFAULT_HEIGHT,
            width: phold_topology::DEFAULT_WIDTH,
            rings: phold_topology::DEFAULT_RADIUS,
            self_links: true,
            ranks: 1,
            threads: 1,
            imbalance: 0.0,
            link_delay: "1ns".to_string(),
        }
    }
}

impl TopologyConfig {
    /// Create config from environment variables, falling back to defaults
    /// for unset ones.
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`TopologyConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EnvError> {
        let defaults = Self::default();
        Ok(Self {
            height: parse(&lookup, "PHOLD_HEIGHT", defaults.height)?,
            width: parse(&lookup, "PHOLD_WIDTH", defaults.width)?,
            rings: parse(&lookup, "PHOLD_RINGS", defaults.rings)?,
            self_links: match lookup("PHOLD_SELF_LINKS") {
                Some(value) => parse_flag("PHOLD_SELF_LINKS", value)?,
                None => defaults.self_links,
            },
            ranks: parse(&lookup, "PHOLD_RANKS", defaults.ranks)?,
            threads: parse(&lookup, "PHOLD_THREADS", defaults.threads)?,
            imbalance: parse(&lookup, "PHOLD_IMBALANCE", defaults.imbalance)?,
            link_delay: lookup("PHOLD_LINK_DELAY").unwrap_or(defaults.link_delay),
        })
    }

    pub fn grid(&self) -> phold_topology::Result<GridSpec> {
        Ok(GridSpec::new(self.height, self.width, self.rings, self.self_links)?)
    }

    /// Assembler for this configuration with per-edge trace logging.
    pub fn assembler(&self) -> phold_topology::Result<TopologyAssembler<TracingObserver>> {
        Ok(TopologyAssembler::new(self.grid()?, self.ranks)?
            .with_delay(LinkDelay::new(&self.link_delay))
            .with_threads(self.threads, self.imbalance)?
            .with_observer(TracingObserver))
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| EnvError {
                var,
                reason: e.to_string(),
                value,
            })
        }
    }
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, EnvError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EnvError {
            var,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = TopologyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TopologyConfig::default());
        assert_eq!(config.height, 10);
        assert_eq!(config.link_delay, "1ns");
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = TopologyConfig::from_lookup(lookup(&[
            ("PHOLD_HEIGHT", "64"),
            ("PHOLD_RINGS", " 3 "),
            ("PHOLD_SELF_LINKS", "off"),
            ("PHOLD_RANKS", "4"),
            ("PHOLD_LINK_DELAY", "2ns"),
        ]))
        .unwrap();
        assert_eq!(config.height, 64);
        assert_eq!(config.width, 10);
        assert_eq!(config.rings, 3);
        assert!(!config.self_links);
        assert_eq!(config.ranks, 4);
        assert_eq!(config.link_delay, "2ns");
    }

    #[test]
    fn malformed_values_are_reported() {
        let err = TopologyConfig::from_lookup(lookup(&[("PHOLD_WIDTH", "wide")])).unwrap_err();
        assert_eq!(err.var, "PHOLD_WIDTH");
        assert_eq!(err.value, "wide");

        let err = TopologyConfig::from_lookup(lookup(&[("PHOLD_SELF_LINKS", "maybe")])).unwrap_err();
        assert_eq!(err.var, "PHOLD_SELF_LINKS");
    }

    #[test]
    fn default_config_assembles() {
        let graph = TopologyConfig::default().assembler().unwrap().build().unwrap();
        assert_eq!(graph.node_count(), 100);
    }

    #[test]
    fn invalid_grid_is_rejected() {
        let config = TopologyConfig {
            rings: -1,
            ..TopologyConfig::default()
        };
        assert!(config.assembler().is_err());
    }
}
