//! `relief` command-line entry point.

use clap::{Parser, Subcommand};
use relief_dem::{ReqwestTileSource, TileFetcher};
use relief_runner::{
    operator_for, Pipeline, PipelineConfig, PipelineContext, Plan, RunReport, EXIT_CONFIGURATION,
    EXIT_STAGE_FAILURE, EXIT_SUCCESS,
};
use relief_toolbox::{LocalToolbox, Project, ProjectDocument};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relief")]
#[command(about = "Build a styled relief map from USGS 1 arc-second elevation tiles", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        config: PathBuf,

        /// Never wait for the operator
        #[arg(long)]
        non_interactive: bool,

        /// Keep tiles that are already downloaded
        #[arg(long)]
        skip_existing: bool,

        /// Delete the raster store before starting
        #[arg(long)]
        clean: bool,

        /// Write the run report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the URLs, paths and object names a run would use
    Plan {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List the colour ramps available to the configured project
    Ramps {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let code = match cli.command {
        Commands::Run {
            config,
            non_interactive,
            skip_existing,
            clean,
            report,
        } => run(&config, non_interactive, skip_existing, clean, report.as_deref()),
        Commands::Plan { config } => plan(&config),
        Commands::Ramps { config } => ramps(&config),
    };
    ExitCode::from(code)
}

fn load_config(path: &Path) -> Result<PipelineConfig, u8> {
    PipelineConfig::load(path).map_err(|e| {
        error!(path = %path.display(), error = %e, "Could not load configuration");
        EXIT_CONFIGURATION
    })
}

fn run(config_path: &Path, non_interactive: bool, skip_existing: bool, clean: bool, report: Option<&Path>) -> u8 {
    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    if non_interactive {
        config.interactive = false;
    }
    if skip_existing {
        config.fetch.skip_existing = true;
    }
    if clean {
        config.clean_store = true;
    }

    let source = match ReqwestTileSource::with_timeout(config.fetch.timeout()) {
        Ok(source) => source,
        Err(e) => {
            error!(error = %e, "Could not create HTTP client");
            return EXIT_STAGE_FAILURE;
        }
    };
    let project = match ProjectDocument::open_or_create(config.project_path(), &config.map_name) {
        Ok(project) => project,
        Err(e) => {
            error!(path = %config.project_path().display(), error = %e, "Could not open project");
            return EXIT_CONFIGURATION;
        }
    };
    let toolbox = LocalToolbox::new(&config.project_root);
    let fetcher = TileFetcher::new(source, config.fetch.to_options(&config.archive_base_url));
    let operator = operator_for(config.interactive);

    let mut pipeline = Pipeline::new(PipelineContext::new(config, toolbox, project, operator), fetcher);
    match pipeline.run() {
        Ok(summary) => {
            info!(
                regions = summary.regions.len(),
                downloaded = summary.tiles_downloaded,
                warnings = summary.styling_warnings.len(),
                "Relief map ready"
            );
            match report {
                Some(path) => write_report(path, &summary),
                None => EXIT_SUCCESS,
            }
        }
        Err(failure) => {
            error!(state = %failure.state, "{}", failure);
            failure.exit_code()
        }
    }
}

fn write_report(path: &Path, report: &RunReport) -> u8 {
    let written = serde_json::to_string_pretty(report)
        .map_err(|e| e.to_string())
        .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
    match written {
        Ok(()) => {
            info!(path = %path.display(), "Wrote run report");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Could not write run report");
            EXIT_STAGE_FAILURE
        }
    }
}

fn plan(config_path: &Path) -> u8 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    match Plan::build(&config) {
        Ok(plan) => {
            println!("{}", plan);
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            EXIT_CONFIGURATION
        }
    }
}

fn ramps(config_path: &Path) -> u8 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let project = match ProjectDocument::open_or_create(config.project_path(), &config.map_name) {
        Ok(project) => project,
        Err(e) => {
            error!(error = %e, "Could not open project");
            return EXIT_CONFIGURATION;
        }
    };

    for name in project.ramp_names() {
        let preview = project
            .color_ramp(&name)
            .map(|ramp| {
                ramp.sample(5)
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        let marker = if name == config.symbology.elevation_ramp || name == config.symbology.hillshade_ramp {
            "*"
        } else {
            " "
        };
        println!("{} {:<16} {}", marker, name, preview);
    }
    EXIT_SUCCESS
}
