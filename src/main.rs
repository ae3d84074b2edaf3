use anyhow::{bail, Context};
use lotbook::snapshot::{SnapshotEngine, SnapshotWindow};
use lotbook::tax::generate_tax_report;
use lotbook::{resolve_active, LedgerEvent, PricePoint, Settings};
use serde::Deserialize;

/// The JSON document the driver consumes: settings plus the raw event log
/// and any known price points.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplayInput {
    settings: Settings,
    events: Vec<LedgerEvent>,
    #[serde(default)]
    prices: Vec<PricePoint>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: lotbook <input.json> [snapshots | tax <year>]")?;
    let mode = args.next().unwrap_or_else(|| "snapshots".to_string());

    let data = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let input: ReplayInput = serde_json::from_str(&data).context("parsing input document")?;

    // Reject structurally invalid events before they reach the engine.
    for event in &input.events {
        event.validate()?;
        event.validate_reward_valuation(input.settings.rewards_basis)?;
    }

    let ledger = resolve_active(&input.events);
    tracing::info!(
        active = ledger.len(),
        superseded = ledger.superseded_by.len(),
        "resolved ledger"
    );

    match mode.as_str() {
        "snapshots" => {
            let engine = SnapshotEngine::new(input.settings);
            let report =
                engine.build(&ledger.events, input.prices, &SnapshotWindow::default())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "tax" => {
            let year: i32 = args
                .next()
                .context("tax mode requires a year")?
                .parse()
                .context("year must be an integer")?;
            let report = generate_tax_report(&ledger.events, &input.settings, year, None)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => bail!("unknown mode {other}; expected snapshots or tax"),
    }

    Ok(())
}
