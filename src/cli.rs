use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand};

use crate::client::HttpCombatClient;
use crate::config::ViewerConfig;
use crate::export::{export_timeline_file, write_timeline_csv};
use crate::report::{load_report_file, validate_report, Report};
use crate::scene::{TextScene, TextSceneConfig};
use crate::view::derive_metrics;
use crate::viewer::{Viewer, ViewerError};

#[derive(Debug, Parser)]
#[command(name = "combat-viewer", version, about = "Terminal viewer for combat simulation reports")]
pub struct Cli {
    /// YAML config file (defaults to ./combat-viewer.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Plain output without ANSI colours or screen clearing.
    #[arg(long, global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run a simulation on the combat service and display the report.
    Simulate {
        /// Turn count; empty or zero uses the configured default.
        #[arg(long)]
        turns: Option<String>,
        #[arg(long)]
        replay: bool,
        #[arg(long)]
        log: bool,
    },
    /// Display a saved report.
    View {
        path: String,
        #[arg(long)]
        replay: bool,
        #[arg(long)]
        log: bool,
    },
    /// Print narrative metrics for a saved report as JSON.
    Metrics { path: String },
    /// Write a saved report's timeline as CSV.
    Export {
        path: String,
        #[arg(long)]
        out: Option<String>,
    },
    /// Check a saved report for ordering and actor issues.
    Validate { path: String },
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 2 } else { 0 };
            let _ = err.print();
            return code;
        }
    };

    let config = match ViewerConfig::load(cli.config.as_deref())
        .and_then(|config| config.with_env(|name| std::env::var(name).ok()))
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return 1;
        }
    };

    match cli.command {
        Command::Simulate { turns, replay, log } => {
            handle_simulate(&config, cli.no_color, turns.as_deref(), replay, log)
        }
        Command::View { path, replay, log } => {
            handle_view(&config, cli.no_color, &path, replay, log)
        }
        Command::Metrics { path } => handle_metrics(&config, &path),
        Command::Export { path, out } => handle_export(&path, out.as_deref()),
        Command::Validate { path } => handle_validate(&path),
    }
}

fn load_or_report(path: &str) -> Option<Report> {
    match load_report_file(path) {
        Ok(report) => Some(report),
        Err(err) => {
            eprintln!("{err}");
            None
        }
    }
}

fn terminal_viewer(
    config: &ViewerConfig,
    no_color: bool,
) -> Result<Viewer<TextScene<io::Stdout>>, ViewerError> {
    let interactive = io::stdout().is_terminal();
    let scene = TextScene::new(
        io::stdout(),
        TextSceneConfig {
            canvas_width: config.canvas_width,
            canvas_height: config.canvas_height,
            use_color: !no_color && interactive,
            clear_screen: !no_color && interactive,
            ..TextSceneConfig::default()
        },
    );
    Viewer::new(scene, config.clone())
}

fn runtime() -> Option<tokio::runtime::Runtime> {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => Some(runtime),
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            None
        }
    }
}

/// Replay and/or open the full log once a report is on screen.
async fn follow_up(
    viewer: &mut Viewer<TextScene<io::Stdout>>,
    replay: bool,
    log: bool,
) -> Result<(), ViewerError> {
    if replay {
        viewer.replay()?;
        if let Some(outcome) = viewer.wait_for_replay().await {
            tracing::info!(state = ?outcome.state, cursor = outcome.cursor, "replay finished");
        }
    }
    if log {
        viewer.show_log()?;
    }
    Ok(())
}

fn handle_simulate(
    config: &ViewerConfig,
    no_color: bool,
    turns: Option<&str>,
    replay: bool,
    log: bool,
) -> i32 {
    let Some(runtime) = runtime() else {
        return 1;
    };
    let client = match HttpCombatClient::new(config.base_url.clone(), config.request_timeout()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("client error: {err}");
            return 1;
        }
    };

    runtime.block_on(async {
        let mut viewer = match terminal_viewer(config, no_color) {
            Ok(viewer) => viewer,
            Err(err) => {
                eprintln!("{err}");
                return 1;
            }
        };
        if let Err(err) = viewer.simulate(&client, turns).await {
            // Already shown in the error widget.
            tracing::debug!(error = %err, "simulate returned an error");
            return 1;
        }
        match follow_up(&mut viewer, replay, log).await {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("{err}");
                1
            }
        }
    })
}

async fn view_report(
    config: &ViewerConfig,
    no_color: bool,
    report: Report,
    replay: bool,
    log: bool,
) -> Result<(), ViewerError> {
    let mut viewer = terminal_viewer(config, no_color)?;
    viewer.load_report(report)?;
    follow_up(&mut viewer, replay, log).await
}

fn handle_view(config: &ViewerConfig, no_color: bool, path: &str, replay: bool, log: bool) -> i32 {
    let Some(report) = load_or_report(path) else {
        return 1;
    };
    let Some(runtime) = runtime() else {
        return 1;
    };

    match runtime.block_on(view_report(config, no_color, report, replay, log)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn handle_metrics(config: &ViewerConfig, path: &str) -> i32 {
    let Some(report) = load_or_report(path) else {
        return 1;
    };
    let metrics = match derive_metrics(&report, config.low_health_threshold) {
        Ok(metrics) => metrics,
        Err(err) => {
            eprintln!("metrics unavailable: {err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&metrics) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize metrics: {err}");
            1
        }
    }
}

fn handle_export(path: &str, out: Option<&str>) -> i32 {
    let Some(report) = load_or_report(path) else {
        return 1;
    };
    let result = match out {
        Some(out) => export_timeline_file(&report, out),
        None => write_timeline_csv(&report, io::stdout().lock()),
    };
    match result {
        Ok(rows) => {
            if let Some(out) = out {
                println!("export complete: rows={rows}, path='{out}'");
            }
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

fn handle_validate(path: &str) -> i32 {
    let Some(report) = load_or_report(path) else {
        return 1;
    };
    let issues = validate_report(&report);
    if issues.is_empty() {
        println!("validation passed: {path}");
        return 0;
    }
    eprintln!("validation failed: {} issue(s)", issues.len());
    for issue in issues {
        eprintln!("- {issue}");
    }
    1
}
