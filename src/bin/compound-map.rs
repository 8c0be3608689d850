//! Build a compound triage map from a filtered descriptor table.
//!
//! ```bash
//! compound-map --input admet_filtered.csv \
//!     --output admet_umap_clusters.csv --exemplars cluster_medoids.csv --clusters 12
//! ```
//!
//! Logging goes through `tracing`; set `RUST_LOG=debug` for per-stage detail.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use compound_map::{io, Pipeline, TriageConfig, UmapInit};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "compound-map")]
#[command(about = "Standardize, embed, and cluster compounds; pick one exemplar per cluster")]
struct Args {
    /// Filtered compound table (CSV with header).
    #[arg(long, default_value = "admet_filtered.csv")]
    input: PathBuf,

    /// Full annotated output table.
    #[arg(long, default_value = "admet_umap_clusters.csv")]
    output: PathBuf,

    /// Exemplar-only output table.
    #[arg(long, default_value = "cluster_medoids.csv")]
    exemplars: PathBuf,

    /// JSON config file; CLI flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of clusters.
    #[arg(long)]
    clusters: Option<usize>,

    /// Embedding neighborhood size.
    #[arg(long)]
    neighbors: Option<usize>,

    /// Embedding minimum distance.
    #[arg(long)]
    min_dist: Option<f32>,

    /// Embedding scale.
    #[arg(long)]
    spread: Option<f32>,

    /// Embedding optimization epochs.
    #[arg(long)]
    epochs: Option<usize>,

    /// Starting layout of the embedding.
    #[arg(long, value_enum)]
    init: Option<InitArg>,

    /// K-means iteration cap.
    #[arg(long)]
    max_iter: Option<usize>,

    /// K-means convergence tolerance.
    #[arg(long)]
    tol: Option<f32>,

    /// K-means restarts; the lowest-inertia one is kept.
    #[arg(long)]
    restarts: Option<usize>,

    /// Random seed.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InitArg {
    Spectral,
    Random,
}

impl From<InitArg> for UmapInit {
    fn from(arg: InitArg) -> Self {
        match arg {
            InitArg::Spectral => UmapInit::Spectral,
            InitArg::Random => UmapInit::Random,
        }
    }
}

impl Args {
    fn config(&self) -> compound_map::Result<TriageConfig> {
        let mut config = match &self.config {
            Some(path) => TriageConfig::load(path)?,
            None => TriageConfig::default(),
        };
        if let Some(k) = self.clusters {
            config.n_clusters = k;
        }
        if let Some(n) = self.neighbors {
            config.n_neighbors = n;
        }
        if let Some(d) = self.min_dist {
            config.min_dist = d;
        }
        if let Some(s) = self.spread {
            config.spread = s;
        }
        if let Some(e) = self.epochs {
            config.n_epochs = Some(e);
        }
        if let Some(init) = self.init {
            config.init = init.into();
        }
        if let Some(m) = self.max_iter {
            config.max_iter = m;
        }
        if let Some(t) = self.tol {
            config.tol = t;
        }
        if let Some(r) = self.restarts {
            config.n_init = r;
        }
        if let Some(s) = self.seed {
            config.seed = s;
        }
        Ok(config)
    }
}

fn run(args: &Args) -> compound_map::Result<()> {
    let pipeline = Pipeline::new(args.config()?)?;
    let table = io::read_table_path(&args.input)?;
    let result = pipeline.run(table)?;
    io::write_outputs(&result, &args.output, &args.exemplars)
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_every_hyperparameter() {
        let args = Args::parse_from([
            "compound-map",
            "--clusters",
            "6",
            "--neighbors",
            "10",
            "--min-dist",
            "0.25",
            "--spread",
            "2",
            "--epochs",
            "50",
            "--init",
            "random",
            "--max-iter",
            "40",
            "--tol",
            "0.01",
            "--restarts",
            "3",
            "--seed",
            "7",
        ]);
        let config = args.config().unwrap();
        assert_eq!(config.n_clusters, 6);
        assert_eq!(config.n_neighbors, 10);
        assert_eq!(config.min_dist, 0.25);
        assert_eq!(config.spread, 2.0);
        assert_eq!(config.n_epochs, Some(50));
        assert_eq!(config.init, UmapInit::Random);
        assert_eq!(config.max_iter, 40);
        assert_eq!(config.tol, 0.01);
        assert_eq!(config.n_init, 3);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn defaults_come_from_config() {
        let args = Args::parse_from(["compound-map"]);
        assert_eq!(args.config().unwrap(), TriageConfig::default());
        assert_eq!(args.input, PathBuf::from("admet_filtered.csv"));
    }
}
