//! sim-runner: headless runner for the investment simulation engine.
//!
//! Usage:
//!   sim-runner --seed 12345 --db run.db --client 7 --amount 10000 --months 12
//!   sim-runner --seed 12345 --ipc-mode

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use investsim_core::{
    catalog::ProductCatalog,
    config::SimConfig,
    error::SimError,
    history::{ClientHistory, Investment, ProductSnapshot},
    orchestrator::{SimulationOrchestrator, SimulationRequest},
    rng::RngBank,
    store::SimStore,
    types::{ClientId, ProductId},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Simulate {
        #[serde(flatten)]
        request: SimulationRequest,
    },
    Invest {
        client_id: ClientId,
        product_id: ProductId,
        amount: f64,
        #[serde(default)]
        invested_on: Option<NaiveDate>,
    },
    RiskProfile {
        client_id: ClientId,
    },
    Recommend {
        client_id: ClientId,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    History {
        client_id: ClientId,
    },
    Quit,
}

fn default_limit() -> usize {
    5
}

#[derive(serde::Serialize)]
struct ClientSummary {
    client_id: ClientId,
    investment_count: i64,
    total_invested: f64,
    simulations: Vec<investsim_core::history::SimulationRecord>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let client_id = parse_arg(&args, "--client", 1i64);
    let amount = parse_arg(&args, "--amount", 10_000.0f64);
    let months = parse_arg(&args, "--months", 12u32);
    let runs = parse_arg(&args, "--runs", 3u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("Investment simulator: sim-runner");
        println!("  seed:      {seed}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = SimConfig::load(data_dir)?;
    let store = SimStore::open(db)?;
    store.migrate()?;
    store.seed_catalog(&config.products)?;

    let orchestrator =
        SimulationOrchestrator::new(&store, &store, &store, &config.market).with_events(&store);
    let bank = RngBank::new(seed);

    if ipc_mode {
        run_ipc_loop(&orchestrator, &store, &bank)?;
    } else {
        for sequence in 0..runs {
            let request = SimulationRequest::for_months(client_id, amount, months);
            let mut rng = bank.for_request(sequence);
            let outcome = orchestrator.simulate(&request, &mut rng)?;
            println!(
                "  #{:<3} {:<24} rate {:>8.4}%  final {:>12.2}  {}",
                outcome.record.id.unwrap_or_default(),
                outcome.product.name,
                outcome.record.effective_rate,
                outcome.record.final_value,
                outcome.scenario.description
            );
        }
        print_summary(&orchestrator, &store, client_id)?;
    }

    Ok(())
}

fn run_ipc_loop(
    orchestrator: &SimulationOrchestrator<'_>,
    store: &SimStore,
    bank: &RngBank,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut sequence = 0u64;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Simulate { request } => {
                let mut rng = bank.for_request(sequence);
                sequence += 1;
                to_reply(orchestrator.simulate(&request, &mut rng))?
            }
            IpcCommand::Invest {
                client_id,
                product_id,
                amount,
                invested_on,
            } => to_reply(record_investment(
                store,
                client_id,
                product_id,
                amount,
                invested_on,
            ))?,
            IpcCommand::RiskProfile { client_id } => {
                to_reply(orchestrator.risk_profile(client_id))?
            }
            IpcCommand::Recommend { client_id, limit } => {
                to_reply(orchestrator.recommend_products(client_id, limit))?
            }
            IpcCommand::History { client_id } => to_reply(client_summary(store, client_id))?,
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

/// Business errors go back to the caller; only I/O and encoding abort
/// the loop.
fn to_reply<T: serde::Serialize>(result: Result<T, SimError>) -> Result<serde_json::Value> {
    match result {
        Ok(value) => Ok(serde_json::to_value(value)?),
        Err(e) => {
            log::warn!("ipc: {e}");
            Ok(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

fn record_investment(
    store: &SimStore,
    client_id: ClientId,
    product_id: ProductId,
    amount: f64,
    invested_on: Option<NaiveDate>,
) -> Result<Investment, SimError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SimError::InvalidAmount { amount });
    }
    let product = store
        .find_by_id(product_id)?
        .ok_or(SimError::NoProductAvailable)?;
    let mut investment = Investment {
        id: None,
        client_id,
        product_id,
        amount,
        invested_on: invested_on.unwrap_or_else(|| Utc::now().date_naive()),
        snapshot: ProductSnapshot::of(&product),
    };
    investment.id = Some(store.insert_investment(&investment)?);
    Ok(investment)
}

fn client_summary(store: &SimStore, client_id: ClientId) -> Result<ClientSummary, SimError> {
    Ok(ClientSummary {
        client_id,
        investment_count: store.investment_count(client_id)?,
        total_invested: store.total_invested(client_id)?,
        simulations: store.simulations_by_client(client_id)?,
    })
}

fn print_summary(
    orchestrator: &SimulationOrchestrator<'_>,
    store: &SimStore,
    client_id: ClientId,
) -> Result<()> {
    let summary = client_summary(store, client_id)?;

    println!();
    println!("=== CLIENT {client_id} ===");
    println!("  investments:    {}", summary.investment_count);
    println!("  total invested: {:.2}", summary.total_invested);
    println!("  simulations:    {}", summary.simulations.len());
    match orchestrator.risk_profile(client_id) {
        Ok(profile) => println!(
            "  risk profile:   {} ({})",
            profile.profile.as_str(),
            profile.score
        ),
        Err(e) => println!("  risk profile:   unavailable ({e})"),
    }

    println!();
    println!("=== SIMULATIONS PER PRODUCT PER DAY ===");
    let daily = store.simulations_per_product_per_day()?;
    if daily.is_empty() {
        println!("  (No simulations recorded)");
    } else {
        for d in &daily {
            println!(
                "  {} | {:<24} | count: {} | avg final: {:.2}",
                d.day, d.product_name, d.simulation_count, d.average_final_value
            );
        }
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
