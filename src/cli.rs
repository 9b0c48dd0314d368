//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::{CsvAdapter, write_export};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::format::{MISSING, count, currency, currency_opt, pct};
use crate::adapters::html_report_adapter::{HtmlReportAdapter, describe_filter};
use crate::adapters::pages::DatasetSummary;
use crate::domain::aggregate::by_sentiment;
use crate::domain::config::DashboardConfig;
use crate::domain::dataset::Dataset;
use crate::domain::error::DashboardError;
use crate::domain::explorer::{ExplorerOptions, explore};
use crate::domain::filter::TradeFilter;
use crate::logging;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "sentidash",
    about = "Market sentiment vs trader performance dashboard"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web dashboard
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print headline numbers and the per-sentiment table
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write the explorer view as CSV
    Export {
        #[arg(short, long)]
        config: PathBuf,
        /// Destination file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        explorer: ExplorerArgs,
    },
    /// Write a self-contained HTML report
    Render {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Trade filter flags, named like the dashboard query parameters.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// First trade date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// Last trade date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Sentiment bucket; repeat to select several
    #[arg(long = "sentiment")]
    pub sentiments: Vec<String>,
    /// BUY or SELL; repeat for both
    #[arg(long = "side")]
    pub sides: Vec<String>,
    /// all, profitable or unprofitable
    #[arg(long)]
    pub pnl: Option<String>,
}

impl FilterArgs {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "start", &self.start);
        push_opt(&mut pairs, "end", &self.end);
        pairs.extend(self.sentiments.iter().map(|s| ("sentiment".to_string(), s.clone())));
        pairs.extend(self.sides.iter().map(|s| ("side".to_string(), s.clone())));
        push_opt(&mut pairs, "pnl", &self.pnl);
        pairs
    }

    pub fn to_filter(&self) -> Result<TradeFilter, DashboardError> {
        TradeFilter::from_pairs(&self.to_pairs())
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct ExplorerArgs {
    /// Minimum absolute net PnL
    #[arg(long)]
    pub min_pnl: Option<String>,
    /// all, BUY or SELL
    #[arg(long)]
    pub side_view: Option<String>,
    /// net_pnl, size, fee or pnl_pct
    #[arg(long)]
    pub sort: Option<String>,
}

impl ExplorerArgs {
    pub fn to_options(&self, default_rows: usize) -> Result<ExplorerOptions, DashboardError> {
        let mut pairs = Vec::new();
        push_opt(&mut pairs, "min_pnl", &self.min_pnl);
        push_opt(&mut pairs, "side_view", &self.side_view);
        push_opt(&mut pairs, "sort", &self.sort);
        ExplorerOptions::from_pairs(&pairs, default_rows)
    }
}

fn push_opt(pairs: &mut Vec<(String, String)>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        pairs.push((key.to_string(), v.clone()));
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Summary { config, filter } => run_summary(&config, &filter),
        Command::Export {
            config,
            output,
            filter,
            explorer,
        } => run_export(&config, output.as_deref(), &filter, &explorer),
        Command::Render {
            config,
            output,
            filter,
        } => run_render(&config, &output, &filter),
    }
}

fn fail(err: &DashboardError) -> ExitCode {
    tracing::error!(error = %err, "command failed");
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Read and validate the INI file, then install the log subscriber it names.
pub fn build_config(path: &Path) -> Result<DashboardConfig, ExitCode> {
    let adapter = load_config(path)?;
    let config = DashboardConfig::from_port(&adapter).map_err(|e| fail(&e))?;
    logging::init(&config.log_filter);
    tracing::debug!(config = %path.display(), "config loaded");
    Ok(config)
}

pub fn data_port(config: &DashboardConfig) -> Arc<dyn DataPort + Send + Sync> {
    Arc::new(CsvAdapter::new(
        config.trades_csv.clone(),
        config.sentiment_csv.clone(),
    ))
}

fn load_dataset(config: &DashboardConfig) -> Result<Dataset, ExitCode> {
    data_port(config).load_dataset().map_err(|e| fail(&e))
}

fn run_summary(config_path: &Path, args: &FilterArgs) -> ExitCode {
    let result = build_config(config_path).and_then(|config| {
        let filter = args.to_filter().map_err(|e| fail(&e))?;
        let dataset = load_dataset(&config)?;
        let stdout = io::stdout();
        write_summary(stdout.lock(), &dataset, &filter).map_err(|e| fail(&DashboardError::from(e)))
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

/// Plain-text summary of the filtered selection.
pub fn write_summary<W: Write>(mut out: W, dataset: &Dataset, filter: &TradeFilter) -> io::Result<()> {
    let trades = filter.apply(&dataset.trades);
    let summary = DatasetSummary::compute(&trades);
    let overview = &summary.overview;

    writeln!(out, "Filter:        {}", describe_filter(filter))?;
    writeln!(
        out,
        "Date range:    {}",
        summary
            .date_range
            .map(|(a, b)| format!("{} to {}", a, b))
            .unwrap_or_else(|| MISSING.to_string())
    )?;
    writeln!(out, "Trades:        {}", count(overview.total_trades))?;
    writeln!(out, "Net PnL:       {}", currency(overview.total_pnl))?;
    writeln!(out, "Win rate:      {}", pct(overview.win_rate))?;
    writeln!(out, "Avg PnL:       {}", currency_opt(overview.avg_pnl))?;
    writeln!(out, "Volume:        {}", currency(overview.total_volume))?;
    writeln!(
        out,
        "Correlation:   {}",
        summary
            .correlation
            .map(|r| format!("{:.3}", r))
            .unwrap_or_else(|| MISSING.to_string())
    )?;
    writeln!(out)?;

    writeln!(
        out,
        "{:<14} {:>8} {:>16} {:>12} {:>9}",
        "Sentiment", "Trades", "Total PnL", "Avg PnL", "Win %"
    )?;
    for (sentiment, stats) in by_sentiment(&trades) {
        if stats.trade_count == 0 {
            continue;
        }
        writeln!(
            out,
            "{:<14} {:>8} {:>16} {:>12} {:>9}",
            sentiment.label(),
            count(stats.trade_count),
            currency(stats.total_pnl),
            currency_opt(stats.avg_pnl),
            pct(stats.win_rate)
        )?;
    }
    out.flush()
}

fn run_export(
    config_path: &Path,
    output: Option<&Path>,
    filter_args: &FilterArgs,
    explorer_args: &ExplorerArgs,
) -> ExitCode {
    let result = build_config(config_path).and_then(|config| {
        let filter = filter_args.to_filter().map_err(|e| fail(&e))?;
        let opts = explorer_args
            .to_options(config.explorer_rows)
            .map_err(|e| fail(&e))?;
        let dataset = load_dataset(&config)?;
        let rows = export(&dataset, &filter, &opts, output).map_err(|e| fail(&e))?;
        if let Some(path) = output {
            eprintln!("Wrote {} rows to {}", rows, path.display());
        }
        Ok(())
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

/// Write every explorer row for `filter` to `output` (stdout when `None`).
pub fn export(
    dataset: &Dataset,
    filter: &TradeFilter,
    opts: &ExplorerOptions,
    output: Option<&Path>,
) -> Result<usize, DashboardError> {
    let trades = filter.apply(&dataset.trades);
    let view = explore(&trades, opts);
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            write_export(BufWriter::new(File::create(path)?), &view)?;
        }
        None => write_export(io::stdout().lock(), &view)?,
    }
    tracing::info!(rows = view.len(), "explorer view exported");
    Ok(view.len())
}

fn run_render(config_path: &Path, output: &Path, args: &FilterArgs) -> ExitCode {
    let result = build_config(config_path).and_then(|config| {
        let filter = args.to_filter().map_err(|e| fail(&e))?;
        let dataset = load_dataset(&config)?;
        HtmlReportAdapter::new()
            .write(&dataset, &filter, &config, output)
            .map_err(|e| fail(&e))?;
        eprintln!("Report written to {}", output.display());
        Ok(())
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

fn run_serve(config_path: &Path) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{self, AppState};
        use crate::domain::cache::DatasetCache;
        use std::time::Duration;

        let config = match build_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let cache = Arc::new(DatasetCache::new(
            data_port(&config),
            Duration::from_secs(config.cache_ttl_secs),
        ));
        if config.preload {
            if let Err(e) = cache.preload() {
                return fail(&e);
            }
        }

        let listen = config.listen.clone();
        let state = AppState {
            cache,
            config: Arc::new(config),
        };

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return fail(&DashboardError::from(e)),
        };
        match runtime.block_on(web::serve(state, &listen)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&e),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
