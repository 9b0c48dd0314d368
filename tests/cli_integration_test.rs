//! CLI integration tests for config loading and the summary, export and render commands.

mod common;

use clap::Parser;
use common::*;
use sentidash::adapters::csv_adapter::CsvAdapter;
use sentidash::cli::{self, Cli, Command, ExplorerArgs, FilterArgs};
use sentidash::domain::dataset::Dataset;
use sentidash::domain::explorer::SortKey;
use sentidash::domain::filter::{PnlFilter, TradeFilter};
use sentidash::domain::sentiment::Sentiment;
use sentidash::domain::trade::Side;
use sentidash::ports::data_port::DataPort;
use std::fs;
use std::process::ExitCode;

fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{:?}", actual) == format!("{:?}", expected)
}

fn load(fx: &Fixture) -> Dataset {
    CsvAdapter::new(fx.trades_path.clone(), fx.sentiment_path.clone())
        .load_dataset()
        .unwrap()
}

fn run(args: &[&str]) -> ExitCode {
    cli::run(Cli::try_parse_from(args).unwrap())
}

mod config_loading {
    use super::*;

    #[test]
    fn build_config_reads_fixture() {
        let fx = Fixture::new();
        let config = cli::build_config(&fx.config_path).unwrap();
        assert_eq!(config.trades_csv, fx.trades_path);
        assert_eq!(config.sentiment_csv, fx.sentiment_path);
        assert_eq!(config.rolling_window, 3);
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.listen, "127.0.0.1:8501");
    }

    #[test]
    fn missing_config_file_is_config_exit_code() {
        let fx = Fixture::new();
        let missing = fx.dir.path().join("absent.ini");
        let code = cli::build_config(&missing).unwrap_err();
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn invalid_value_is_config_exit_code() {
        let fx = Fixture::with_extra_config("[cache]\nttl_secs = soon\n");
        let code = cli::build_config(&fx.config_path).unwrap_err();
        assert!(same_code(code, ExitCode::from(2)));
    }
}

mod argument_parsing {
    use super::*;

    #[test]
    fn filter_flags_build_trade_filter() {
        let cli = Cli::try_parse_from([
            "sentidash",
            "summary",
            "--config",
            "x.ini",
            "--start",
            "2024-01-02",
            "--sentiment",
            "fear",
            "--sentiment",
            "Extreme Greed",
            "--side",
            "sell",
            "--pnl",
            "profitable",
        ])
        .unwrap();
        let Command::Summary { filter, .. } = cli.command else {
            panic!("expected summary");
        };
        let filter = filter.to_filter().unwrap();
        assert_eq!(filter.start, Some(date(2024, 1, 2)));
        assert_eq!(filter.end, None);
        assert_eq!(
            filter.sentiments.into_iter().collect::<Vec<_>>(),
            vec![Sentiment::Fear, Sentiment::ExtremeGreed]
        );
        assert_eq!(filter.sides.into_iter().collect::<Vec<_>>(), vec![Side::Sell]);
        assert_eq!(filter.pnl, PnlFilter::ProfitableOnly);
    }

    #[test]
    fn no_filter_flags_select_everything() {
        let filter = FilterArgs::default().to_filter().unwrap();
        assert_eq!(filter, TradeFilter::default());
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let args = FilterArgs {
            start: Some("2024-01-05".into()),
            end: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(args.to_filter().is_err());
    }

    #[test]
    fn explorer_flags_build_options() {
        let args = ExplorerArgs {
            min_pnl: Some("25".into()),
            side_view: Some("BUY".into()),
            sort: Some("size".into()),
        };
        let opts = args.to_options(10).unwrap();
        assert_eq!(opts.min_pnl, 25.0);
        assert_eq!(opts.sort, SortKey::Size);
        assert_eq!(opts.rows, 10);
    }

    #[test]
    fn render_requires_output() {
        assert!(Cli::try_parse_from(["sentidash", "render", "--config", "x.ini"]).is_err());
    }
}

mod summary_command {
    use super::*;

    #[test]
    fn summary_lists_totals_and_buckets() {
        let fx = Fixture::new();
        let ds = load(&fx);
        let mut out = Vec::new();
        cli::write_summary(&mut out, &ds, &TradeFilter::default()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Trades:        24"));
        assert!(text.contains("Net PnL:       $947.25"));
        assert!(text.contains("Win rate:      50.0%"));
        assert!(text.contains("Date range:    2024-01-01 to 2024-01-06"));
        for s in Sentiment::ALL {
            assert!(text.contains(s.label()), "{}", s.label());
        }
    }

    #[test]
    fn summary_skips_empty_buckets() {
        let fx = Fixture::new();
        let ds = load(&fx);
        let filter = TradeFilter::from_pairs(&[("sentiment".to_string(), "neutral".to_string())]).unwrap();
        let mut out = Vec::new();
        cli::write_summary(&mut out, &ds, &filter).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Trades:        8"));
        assert!(!text.contains("Extreme Greed"));
    }

    #[test]
    fn summary_command_succeeds() {
        let fx = Fixture::new();
        let config = fx.config_path.to_str().unwrap();
        assert!(same_code(run(&["sentidash", "summary", "--config", config]), ExitCode::SUCCESS));
    }

    #[test]
    fn bad_filter_is_filter_exit_code() {
        let fx = Fixture::new();
        let config = fx.config_path.to_str().unwrap();
        let code = run(&["sentidash", "summary", "--config", config, "--start", "2024-13-01"]);
        assert!(same_code(code, ExitCode::from(4)));
    }

    #[test]
    fn missing_input_is_data_exit_code() {
        let fx = Fixture::new();
        fs::remove_file(&fx.trades_path).unwrap();
        let config = fx.config_path.to_str().unwrap();
        let code = run(&["sentidash", "summary", "--config", config]);
        assert!(same_code(code, ExitCode::from(3)));
    }
}

mod export_command {
    use super::*;

    #[test]
    fn export_sorts_by_requested_key() {
        let fx = Fixture::new();
        let ds = load(&fx);
        let opts = ExplorerArgs {
            sort: Some("size".into()),
            ..Default::default()
        }
        .to_options(5)
        .unwrap();
        let path = fx.dir.path().join("out").join("trades.csv");

        let rows = cli::export(&ds, &TradeFilter::default(), &opts, Some(&path)).unwrap();
        assert_eq!(rows, 24);

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 25);
        assert!(lines[0].starts_with("Timestamp IST,Sentiment,Side"));
        assert!(lines[1].starts_with("06-01-2024 21:15,Extreme Greed,SELL,675,"));
    }

    #[test]
    fn export_applies_threshold() {
        let fx = Fixture::new();
        let ds = load(&fx);
        let opts = ExplorerArgs {
            min_pnl: Some("100".into()),
            ..Default::default()
        }
        .to_options(10)
        .unwrap();
        let path = fx.dir.path().join("big.csv");
        let rows = cli::export(&ds, &TradeFilter::default(), &opts, Some(&path)).unwrap();
        assert_eq!(rows, 6);
    }

    #[test]
    fn export_command_writes_file() {
        let fx = Fixture::new();
        let config = fx.config_path.to_str().unwrap();
        let output = fx.dir.path().join("export.csv");
        let code = run(&[
            "sentidash",
            "export",
            "--config",
            config,
            "--output",
            output.to_str().unwrap(),
            "--side",
            "BUY",
        ]);
        assert!(same_code(code, ExitCode::SUCCESS));
        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(text.lines().count(), 13);
        assert!(text.lines().skip(1).all(|l| l.contains(",BUY,")));
    }
}

mod render_command {
    use super::*;

    #[test]
    fn render_writes_self_contained_report() {
        let fx = Fixture::new();
        let config = fx.config_path.to_str().unwrap();
        let output = fx.dir.path().join("reports").join("dashboard.html");
        let code = run(&[
            "sentidash",
            "render",
            "--config",
            config,
            "--output",
            output.to_str().unwrap(),
            "--sentiment",
            "neutral",
        ]);
        assert!(same_code(code, ExitCode::SUCCESS));

        let html = fs::read_to_string(&output).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Sentiment Performance Dashboard"));
        assert!(html.contains("Neutral"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("htmx.org"));
    }
}
