//! sctrends CLI

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

mod analysis_config;
mod pipeline;
mod report;

use analysis_config::AnalysisConfig;
use pipeline::{InputPaths, run_pipeline};

#[derive(Parser)]
#[command(name = "sctrends")]
#[command(about = "sctrends - search interest before and after the College Scorecard release")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
struct InputArgs {
    /// Directory holding the search-interest files
    #[arg(long)]
    trends_dir: PathBuf,

    /// Identifier crosswalk (institution name, UNITID, OPEID)
    #[arg(long)]
    crosswalk: PathBuf,

    /// Outcomes dataset (College Scorecard extract)
    #[arg(long)]
    scorecard: PathBuf,

    /// Analysis config (YAML). Defaults reproduce the published analysis.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl InputArgs {
    fn paths(&self) -> InputPaths {
        InputPaths {
            trends_dir: self.trends_dir.clone(),
            crosswalk: self.crosswalk.clone(),
            scorecard: self.scorecard.clone(),
        }
    }

    fn load_config(&self) -> Result<AnalysisConfig> {
        match &self.config {
            Some(path) => AnalysisConfig::read(path),
            None => Ok(AnalysisConfig::default()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis: audit, three models, Wald test, charts
    Report {
        #[command(flatten)]
        inputs: InputArgs,

        /// Write the two charts (and their artifact JSON) into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Split the trend chart by city / non-city institutions
        #[arg(long)]
        split_by_city: bool,

        /// Plot theme (sctrends, minimal, print)
        #[arg(long)]
        theme: Option<String>,

        /// Chart format
        #[arg(long, value_parser = ["svg", "png"])]
        format: Option<String>,

        /// Output file for the full results (pretty JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load, clean and join only; print the row accounting
    Audit {
        #[command(flatten)]
        inputs: InputArgs,

        /// Write the analysis table as CSV
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },

    /// Render a plot artifact JSON to SVG or PNG
    Render {
        /// Artifact JSON (as written by `report --out-dir`)
        #[arg(short, long)]
        input: PathBuf,

        /// Artifact kind
        #[arg(long, value_parser = ["density", "trend"])]
        kind: String,

        /// Output image; the extension selects the format
        #[arg(short, long)]
        output: PathBuf,

        /// Plot config overrides (YAML)
        #[arg(long)]
        viz_config: Option<PathBuf>,

        /// Base theme (sctrends, minimal, print)
        #[arg(long)]
        theme: Option<String>,
    },

    /// Print the default analysis config as YAML
    ConfigSchema,

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Report { inputs, out_dir, split_by_city, theme, format, output } => cmd_report(
            &inputs,
            out_dir.as_deref(),
            split_by_city,
            theme,
            format,
            output.as_deref(),
        ),
        Commands::Audit { inputs, export_csv } => cmd_audit(&inputs, export_csv.as_deref()),
        Commands::Render { input, kind, output, viz_config, theme } => {
            cmd_render(&input, &kind, &output, viz_config.as_deref(), theme.as_deref())
        }
        Commands::ConfigSchema => {
            print!("{}", AnalysisConfig::default().to_yaml()?);
            Ok(())
        }
        Commands::Version => {
            println!("sctrends {}", sct_core::VERSION);
            Ok(())
        }
    }
}

fn write_json(output: &Path, value: &impl Serialize) -> Result<()> {
    std::fs::write(output, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}

fn cmd_report(
    inputs: &InputArgs,
    out_dir: Option<&Path>,
    split_by_city: bool,
    theme: Option<String>,
    format: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let mut cfg = inputs.load_config()?;
    cfg.report.split_by_city |= split_by_city;
    if let Some(theme) = theme {
        cfg.report.theme = theme;
    }
    if let Some(format) = format {
        cfg.report.format = format;
    }
    cfg.validate()?;
    if cfg.report.format == "png" && out_dir.is_some() && !cfg!(feature = "png") {
        bail!("PNG charts need sctrends built with the `png` feature; use --format svg");
    }

    let out = run_pipeline(&inputs.paths(), &cfg.pipeline())?;
    let models = sct_inference::fit_models(&out.table, &cfg.models).context("fitting models")?;
    tracing::info!(
        p_value = models.wald.p_value,
        f_stat = models.wald.f_stat,
        "release-effect test complete"
    );

    let density = match sct_viz::earnings_density(&out.table, Some(cfg.derive.earnings_threshold)) {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!(error = %e, "earnings density skipped");
            None
        }
    };
    let means = out.table.mean_index_by_month(cfg.report.split_by_city);
    let trend = sct_viz::trend_artifact(&means, Some(cfg.derive.release_cutoff))
        .context("building trend artifact")?;

    print!(
        "{}",
        report::render_report(
            &out.cleaning,
            &out.join,
            &out.summary,
            &models,
            &cfg.models,
            cfg.report.alpha
        )
    );

    if let Some(dir) = out_dir {
        write_charts(dir, &cfg, density.as_ref(), &trend)?;
    }

    if let Some(path) = output {
        let results = report::Results {
            schema_version: report::RESULTS_V0,
            tool_version: sct_core::VERSION,
            config: &cfg,
            cleaning: &out.cleaning,
            join: &out.join,
            summary: &out.summary,
            models: &models,
            density: density.as_ref(),
            trend: Some(&trend),
        };
        write_json(path, &results)?;
        tracing::info!(path = %path.display(), "results written");
    }
    Ok(())
}

fn write_charts(
    dir: &Path,
    cfg: &AnalysisConfig,
    density: Option<&sct_viz::DensityArtifact>,
    trend: &sct_viz::TrendArtifact,
) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let viz = sct_viz_render::config::resolve_config(Some(&cfg.report.theme), None)?;
    let ext = cfg.report.format.as_str();

    let mut charts: Vec<(&str, &str, String)> = Vec::new();
    if let Some(d) = density {
        charts.push(("earnings_density", "density", serde_json::to_string_pretty(d)?));
    }
    charts.push(("search_trend", "trend", serde_json::to_string_pretty(trend)?));

    for (stem, kind, json) in charts {
        let artifact_path = dir.join(format!("{stem}.json"));
        std::fs::write(&artifact_path, &json)
            .with_context(|| format!("writing {}", artifact_path.display()))?;
        let image = dir.join(format!("{stem}.{ext}"));
        sct_viz_render::render_to_file(&json, kind, &image, &viz)
            .with_context(|| format!("rendering {}", image.display()))?;
    }
    Ok(())
}

fn cmd_audit(inputs: &InputArgs, export_csv: Option<&Path>) -> Result<()> {
    let cfg = inputs.load_config()?;
    let out = run_pipeline(&inputs.paths(), &cfg.pipeline())?;
    print!("{}", report::audit_section(&out.cleaning, &out.join, &out.summary));
    if let Some(path) = export_csv {
        out.table.write_csv(path).with_context(|| format!("exporting {}", path.display()))?;
    }
    Ok(())
}

fn cmd_render(
    input: &Path,
    kind: &str,
    output: &Path,
    viz_config: Option<&Path>,
    theme: Option<&str>,
) -> Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("reading artifact {}", input.display()))?;
    let user_yaml = viz_config
        .map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()?;
    let viz = sct_viz_render::config::resolve_config(theme, user_yaml.as_deref())?;
    sct_viz_render::render_to_file(&json, kind, output, &viz)
        .with_context(|| format!("rendering {}", output.display()))?;
    Ok(())
}
