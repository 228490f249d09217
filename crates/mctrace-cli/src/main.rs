// crates/mctrace-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mctrace_cli::{
    listing::{loopback_positions, print_plain, print_state, resolve_label},
    model::ModelFile,
    profile::ListingProfile,
};
use mctrace_core::TraceLabel;
use mctrace_trace::Trace;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "mctrace",
    about = "Model-checker execution traces",
    long_about = "Model-checker execution traces.\n\nBuild traces from JSON model descriptions, then list, check or splice them.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Listing options shared by the printing commands. Flags override the
/// profile file.
#[derive(clap::Args, Debug, Default)]
struct ListingArgs {
    /// TOML listing profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Also print defines
    #[arg(long)]
    defines: bool,

    /// With --defines, also print defines over next-state variables
    #[arg(long)]
    defines_with_next: bool,

    /// Only print values that changed since last printed
    #[arg(long)]
    changes_only: bool,

    /// Hide symbols starting with this prefix
    #[arg(long)]
    hide: Option<String>,

    /// First 1-based step to print
    #[arg(long)]
    from: Option<usize>,

    /// Last 1-based step to print
    #[arg(long)]
    to: Option<usize>,
}

impl ListingArgs {
    fn resolve(self) -> Result<ListingProfile> {
        let mut p = match &self.profile {
            Some(path) => ListingProfile::load(path)?,
            None => ListingProfile::default(),
        };
        p.show_defines |= self.defines;
        p.show_defines_with_next |= self.defines_with_next;
        p.changes_only |= self.changes_only;
        if self.hide.is_some() {
            p.hiding_prefix = self.hide;
        }
        if self.from.is_some() {
            p.from = self.from;
        }
        if self.to.is_some() {
            p.to = self.to;
        }
        Ok(p)
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print a trace as a state/input listing
    Show {
        /// JSON model description
        model: PathBuf,

        #[command(flatten)]
        listing: ListingArgs,
    },

    /// Print the 1-based positions of the loopback steps
    Loops {
        /// JSON model description
        model: PathBuf,
    },

    /// Check that every variable is assigned at every step
    Check {
        /// JSON model description
        model: PathBuf,
    },

    /// Print one state, addressed by label (`1.3`, `1.-1` for the last)
    State {
        /// JSON model description
        model: PathBuf,

        /// State label `TRACE.STATE`
        label: TraceLabel,

        #[command(flatten)]
        listing: ListingArgs,
    },

    /// Splice two traces over the same language and print the result
    Concat {
        /// Leading trace
        first: PathBuf,

        /// Trailing trace; its first state must agree with the last state
        /// of the leading one
        second: PathBuf,

        #[command(flatten)]
        listing: ListingArgs,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Show { model, listing } => show(&model, listing),
        Cmd::Loops { model } => loops(&model),
        Cmd::Check { model } => check(&model),
        Cmd::State {
            model,
            label,
            listing,
        } => state(&model, label, listing),
        Cmd::Concat {
            first,
            second,
            listing,
        } => concat(&first, &second, listing),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn load_trace(path: &Path) -> Result<Trace> {
    ModelFile::load(path)?
        .build()
        .with_context(|| format!("building trace from {}", path.display()))
}

fn show(model: &Path, listing: ListingArgs) -> Result<()> {
    let profile = listing.resolve()?;
    let trace = load_trace(model)?;

    let mut out = BufWriter::new(io::stdout().lock());
    print_plain(&mut out, &trace, &profile)?;
    out.flush()?;
    Ok(())
}

fn loops(model: &Path) -> Result<()> {
    let trace = load_trace(model)?;
    let positions = loopback_positions(&trace);
    info!(loopbacks = positions.len(), "loopbacks computed");

    let mut out = BufWriter::new(io::stdout().lock());
    for p in positions {
        writeln!(out, "{p}")?;
    }
    out.flush()?;
    Ok(())
}

fn check(model: &Path) -> Result<()> {
    let trace = load_trace(model)?;
    let vars: Vec<_> = trace
        .state_frozen_vars()
        .iter()
        .chain(trace.input_vars())
        .copied()
        .collect();

    let report = trace.is_complete_vars(&vars, true);
    if !report.is_complete() {
        bail!(
            "{} is incomplete: {} gap(s)",
            model.display(),
            report.gaps().len()
        );
    }
    info!(vars = vars.len(), steps = trace.length() + 1, "trace is complete");
    println!("✔ complete");
    Ok(())
}

fn state(model: &Path, label: TraceLabel, listing: ListingArgs) -> Result<()> {
    let profile = listing.resolve()?;
    let trace = load_trace(model)?;
    let step = resolve_label(&trace, label).with_context(|| format!("resolving label {label}"))?;

    let mut out = BufWriter::new(io::stdout().lock());
    print_state(&mut out, &trace, step, &profile)?;
    out.flush()?;
    Ok(())
}

fn concat(first: &Path, second: &Path, listing: ListingArgs) -> Result<()> {
    let profile = listing.resolve()?;
    let head = load_trace(first)?;
    let mut tail = load_trace(second)?;
    tail.unregister();

    let (a, b) = (head.length(), tail.length());
    let mut joined = head
        .concat(tail)
        .with_context(|| format!("splicing {} onto {}", second.display(), first.display()))?;
    joined.freeze();
    info!(first = a, second = b, length = joined.length(), "traces spliced");

    let mut out = BufWriter::new(io::stdout().lock());
    print_plain(&mut out, &joined, &profile)?;
    out.flush()?;
    Ok(())
}
