//! phold-topo binary
//!
//! Builds PHOLD ring-grid topologies partition by partition.
//!
//! Usage:
//!   phold-topo build [--json]        Summary per partition, or the whole graph as JSON
//!   phold-topo fragment --rank <p>   One rank's fragment as JSON
//!   phold-topo verify                Compare a partitioned build with the reference
//!
//! Grid flags override the PHOLD_* environment variables.

mod config;

use std::io::Write;

use clap::{ArgAction, Args, Parser, Subcommand};
use phold_topology::{Graph, TopologyAssembler, TracingObserver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TopologyConfig;

#[derive(Parser, Debug)]
#[command(name = "phold-topo", version, about = "Partitioned ring-grid topology builder")]
struct Cli {
    #[command(flatten)]
    grid: GridArgs,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Grid rows [env: PHOLD_HEIGHT]
    #[arg(long, global = true)]
    height: Option<i64>,

    /// Grid columns [env: PHOLD_WIDTH]
    #[arg(long, global = true)]
    width: Option<i64>,

    /// Ring radius [env: PHOLD_RINGS]
    #[arg(short, long, global = true)]
    rings: Option<i64>,

    /// Link every node to itself [env: PHOLD_SELF_LINKS]
    #[arg(long, global = true, overrides_with = "no_self_links")]
    self_links: bool,

    /// Drop self links [env: PHOLD_SELF_LINKS]
    #[arg(long, global = true, overrides_with = "self_links")]
    no_self_links: bool,

    /// Partitions [env: PHOLD_RANKS]
    #[arg(short = 'p', long, global = true)]
    ranks: Option<usize>,

    /// Threads per rank [env: PHOLD_THREADS]
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    /// Column skew toward thread 0 [env: PHOLD_IMBALANCE]
    #[arg(long, global = true)]
    imbalance: Option<f64>,

    /// Link delay [env: PHOLD_LINK_DELAY]
    #[arg(long, global = true)]
    delay: Option<String>,
}

impl GridArgs {
    fn apply(self, config: &mut TopologyConfig) {
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(rings) = self.rings {
            config.rings = rings;
        }
        if self.self_links {
            config.self_links = true;
        } else if self.no_self_links {
            config.self_links = false;
        }
        if let Some(ranks) = self.ranks {
            config.ranks = ranks;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(imbalance) = self.imbalance {
            config.imbalance = imbalance;
        }
        if let Some(delay) = self.delay {
            config.link_delay = delay;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every partition and stitch the graph
    Build {
        /// Dump the whole graph as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a single rank's fragment and dump it as JSON
    Fragment {
        #[arg(long)]
        rank: usize,
    },
    /// Compare a partitioned build against the centralized enumeration
    Verify,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let mut config = TopologyConfig::from_env()?;
    cli.grid.apply(&mut config);
    tracing::debug!(?config, "resolved configuration");

    let assembler = config.assembler()?;

    match cli.command {
        Commands::Build { json } => build(&assembler, json),
        Commands::Fragment { rank } => fragment(&assembler, rank),
        Commands::Verify => verify(&assembler),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "phold_topo=warn,phold_topology=warn",
        (false, 0) => "phold_topo=info,phold_topology=info",
        (false, 1) => "phold_topo=debug,phold_topology=debug",
        (false, _) => "phold_topo=trace,phold_topology=trace",
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build(
    assembler: &TopologyAssembler<TracingObserver>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = assembler.build()?;
    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &graph)?;
        writeln!(out)?;
    } else {
        summarize(&mut out, &graph)?;
    }
    Ok(())
}

fn summarize(out: &mut impl Write, graph: &Graph) -> std::io::Result<()> {
    writeln!(out, "grid {}, delay {}", graph.spec(), graph.delay())?;
    for fragment in graph.fragments() {
        let links = &fragment.links;
        writeln!(
            out,
            "  rank {:>3}  rows {:>5}..{:<5} nodes {:>7}  ports {:>8}  internal {:>8}  north {:>6}  south {:>6}",
            fragment.index(),
            fragment.partition.row_start,
            fragment.partition.row_end,
            fragment.nodes.len(),
            fragment.port_count(),
            links.internal_count(),
            links.north().len(),
            links.south().len(),
        )?;
    }
    writeln!(
        out,
        "{} nodes, {} edges ({} internal, {} across ranks)",
        graph.node_count(),
        graph.edge_count(),
        graph.internal_edge_count(),
        graph.border_edge_count(),
    )
}

fn fragment(
    assembler: &TopologyAssembler<TracingObserver>,
    rank: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let fragment = assembler.build_partition(rank)?;
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &fragment)?;
    writeln!(out)?;
    Ok(())
}

fn verify(assembler: &TopologyAssembler<TracingObserver>) -> Result<(), Box<dyn std::error::Error>> {
    let graph = assembler.build()?;
    let diff = graph.verify()?;
    if diff.is_clean() {
        println!("ok: {} edges match the centralized enumeration", graph.edge_count());
        return Ok(());
    }

    for (a, b) in diff.missing.iter().take(10) {
        eprintln!("missing     {} <-> {}", a, b);
    }
    for (a, b) in diff.unexpected.iter().take(10) {
        eprintln!("unexpected  {} <-> {}", a, b);
    }
    for ((a, b), n) in diff.duplicated.iter().take(10) {
        eprintln!("duplicated  {} <-> {} ({}x)", a, b, n);
    }
    Err(format!("verification failed: {}", diff).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["phold-topo", "--height", "32", "-r", "2", "-p", "4", "--no-self-links", "verify"]);
        let mut config = TopologyConfig::default();
        cli.grid.apply(&mut config);
        assert_eq!(config.height, 32);
        assert_eq!(config.width, 10);
        assert_eq!(config.rings, 2);
        assert_eq!(config.ranks, 4);
        assert!(!config.self_links);
        assert!(matches!(cli.command, Commands::Verify));
    }

    #[test]
    fn self_links_flag_restores_what_the_environment_dropped() {
        let mut config = TopologyConfig {
            self_links: false,
            ..TopologyConfig::default()
        };
        Cli::parse_from(["phold-topo", "--self-links", "build"]).grid.apply(&mut config);
        assert!(config.self_links);

        let mut config = TopologyConfig::default();
        Cli::parse_from(["phold-topo", "build"]).grid.apply(&mut config);
        assert!(config.self_links);
    }

    #[test]
    fn last_self_links_flag_wins() {
        let mut config = TopologyConfig::default();
        Cli::parse_from(["phold-topo", "--self-links", "--no-self-links", "build"]).grid.apply(&mut config);
        assert!(!config.self_links);

        Cli::parse_from(["phold-topo", "--no-self-links", "build", "--self-links"]).grid.apply(&mut config);
        assert!(config.self_links);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["phold-topo", "fragment", "--rank", "1", "--width", "6", "-vv"]);
        assert_eq!(cli.grid.width, Some(6));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Fragment { rank: 1 }));
    }

    #[test]
    fn summary_lists_every_rank() {
        let config = TopologyConfig {
            height: 8,
            width: 8,
            ranks: 2,
            self_links: false,
            ..TopologyConfig::default()
        };
        let graph = config.assembler().unwrap().build().unwrap();
        let mut buf = Vec::new();
        summarize(&mut buf, &graph).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().filter(|l| l.trim_start().starts_with("rank")).count(), 2);
        assert!(text.ends_with("64 nodes, 210 edges (188 internal, 22 across ranks)\n"));
    }
}
