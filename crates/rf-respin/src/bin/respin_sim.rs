//! respin-sim — play a scripted Stick-and-Win activation and print the report

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use rf_respin::{Preset, RespinConfig, Scenario, ScenarioReport, all_presets, preset_by_id, run_scenario};

#[derive(Parser, Debug)]
#[command(author, version, about = "Stick-and-Win respin feature simulator")]
struct Args {
    /// Feature configuration (.json, .yaml, .yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario to play (.json, .yaml, .yml)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Built-in preset id, used for whatever --config/--scenario leave out
    #[arg(short, long, default_value = "blackout_demo")]
    preset: String,

    /// List built-in presets and exit
    #[arg(long)]
    list: bool,

    /// Print the trace summary instead of the full report
    #[arg(long)]
    summary: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        for preset in all_presets() {
            println!("{:<16} {}", preset.scenario.id, preset.scenario.description);
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let preset: Option<Preset> = preset_by_id(&args.preset);
    if preset.is_none() && (args.config.is_none() || args.scenario.is_none()) {
        bail!("unknown preset '{}'", args.preset);
    }

    let config = match &args.config {
        Some(path) => RespinConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => preset
            .as_ref()
            .map(|p| p.config.clone())
            .context("no configuration")?,
    };
    let scenario = match &args.scenario {
        Some(path) => Scenario::from_file(path)
            .with_context(|| format!("Failed to load scenario {}", path.display()))?,
        None => preset
            .as_ref()
            .map(|p| p.scenario.clone())
            .context("no scenario")?,
    };

    let report = run_scenario(config, &scenario)
        .with_context(|| format!("Failed to play scenario '{}'", scenario.id))?;
    log::info!(
        "scenario '{}' {:?}, committed {}",
        report.scenario_id,
        report.outcome,
        report.committed_total
    );
    for warning in report.trace.validate().warnings() {
        log::warn!("trace: {}", warning);
    }

    println!("{}", render(&report, args).context("Failed to render report")?);
    Ok(())
}

fn render(report: &ScenarioReport, args: &Args) -> Result<String, serde_json::Error> {
    match (args.summary, args.pretty) {
        (true, true) => serde_json::to_string_pretty(&report.summary),
        (true, false) => serde_json::to_string(&report.summary),
        (false, true) => serde_json::to_string_pretty(report),
        (false, false) => serde_json::to_string(report),
    }
}
