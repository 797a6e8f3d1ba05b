//! Trip Planner - dish to budget-aware, store-specific shopping list
//!
//! CLI entry point: one-shot `plan`, the interactive shell, and config dump.

use std::fs;

use eyre::{Context, Result};
use tracing::{debug, info};

use tripplanner::cli::{Cli, Command, OutputFormat, PlanArgs, get_log_path};
use tripplanner::config::Config;
use tripplanner::domain::{FailureKind, GeoPoint};
use tripplanner::planner::TripPlanner;
use tripplanner::render;
use tripplanner::repl::ReplSession;
use tripplanner::session::Commit;

use clap::Parser;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(region = %config.region.code, backend = %config.services.backend_url, "Trip planner loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Plan(args)) => {
            debug!("main: matched Plan command");
            cmd_plan(&config, args).await
        }
        Some(Command::Config) => {
            debug!("main: matched Config command");
            cmd_config(&config)
        }
        Some(Command::Repl) | None => {
            debug!("main: launching shell");
            cmd_repl(&config).await
        }
    }
}

fn cmd_config(config: &Config) -> Result<()> {
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}

async fn cmd_repl(config: &Config) -> Result<()> {
    let planner = TripPlanner::from_config(config).context("Failed to build services")?;
    ReplSession::new(planner).run().await
}

fn step_failed(step: &str, kind: FailureKind, err: impl std::fmt::Display) -> eyre::Report {
    eyre::eyre!("{} failed [{}]: {}", step, kind, err)
}

fn require_applied<T>(step: &str, commit: Commit<T>) -> Result<T> {
    commit
        .applied()
        .ok_or_else(|| step_failed(step, FailureKind::Internal, "result was superseded"))
}

/// Run the pipeline once: inputs, location, ingredients, basket, prices
async fn cmd_plan(config: &Config, args: PlanArgs) -> Result<()> {
    debug!(dish = %args.dish, people = args.people, budget = args.budget, "cmd_plan: called");
    let mut planner = TripPlanner::from_config(config).context("Failed to build services")?;

    planner.set_dish(&args.dish).await?;
    planner.set_people_count(args.people).await?;
    planner.set_budget(args.budget).await?;

    let located = if let Some(query) = &args.address {
        planner.resolve_address(query).await
    } else if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        planner.resolve_point(GeoPoint::new(lat, lng)).await
    } else {
        planner.resolve_here().await
    };
    let address = require_applied("address", located.map_err(|e| step_failed("address", e.kind(), &e))?)?;
    info!(address = %address.text, "cmd_plan: location resolved");

    let generated = planner
        .generate_ingredients()
        .await
        .map_err(|e| step_failed("ingredients", e.kind(), &e))?;
    require_applied("ingredients", generated)?;

    if args.all || args.selects_nothing() {
        planner
            .select_all()
            .await
            .map_err(|e| step_failed("basket", e.kind(), &e))?;
    }
    for name in &args.items {
        planner
            .add_item(name)
            .await
            .map_err(|e| step_failed("basket", e.kind(), &e))?;
    }
    for (name, quantity) in &args.custom {
        planner
            .add_custom(name, quantity)
            .await
            .map_err(|e| step_failed("basket", e.kind(), &e))?;
    }

    let recommended = planner
        .recommend()
        .await
        .map_err(|e| step_failed("recommendation", e.kind(), &e))?;
    require_applied("recommendation", recommended)?;

    if let Some(store) = &args.store {
        planner
            .select_store(store)
            .await
            .map_err(|e| step_failed("store", e.kind(), &e))?;
    }

    let summary = planner.summary().await?;
    let breakdown = planner
        .breakdown()
        .await?
        .ok_or_else(|| step_failed("recommendation", FailureKind::Internal, "no breakdown available"))?;

    if let Some(path) = &args.export {
        breakdown.write_json(path)?;
    }

    match args.format {
        OutputFormat::Json => {
            let out = serde_json::json!({ "summary": summary, "breakdown": breakdown });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            render::print_summary(&summary);
            println!();
            render::print_breakdown(&breakdown);
            if let Some(path) = &args.export {
                println!();
                render::print_ok(&format!("Exported to {}", path.display()));
            }
        }
    }

    planner.shutdown().await?;
    Ok(())
}
