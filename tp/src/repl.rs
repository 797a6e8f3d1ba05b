//! Interactive planning shell
//!
//! One session per shell. Every failure prints a message and the shell
//! keeps going; `/restart` starts over.

use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::cli::parse_custom;
use crate::domain::{FailureKind, GeoPoint};
use crate::planner::TripPlanner;
use crate::render;
use crate::session::Commit;

/// Result of handling a slash command
#[derive(Debug, PartialEq, Eq)]
pub enum SlashResult {
    Continue,
    Quit,
}

/// A parsed shell line
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Dish(String),
    People(u32),
    Budget(f64),
    Address(String),
    Point(GeoPoint),
    Here,
    Generate,
    Add(String),
    Custom(String, String),
    Remove(String),
    Adjust(String, i64),
    All,
    None,
    Basket,
    Recommend,
    Store(String),
    Summary,
    Breakdown,
    Export(PathBuf),
    Restart,
    Help,
    Quit,
}

/// Parse one `/command args` line
pub fn parse_line(input: &str) -> Result<ShellCommand, String> {
    let input = input.trim();
    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };
    let need = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("{} needs {}", cmd, what))
        } else {
            Ok(rest.to_string())
        }
    };

    match cmd {
        "/dish" => Ok(ShellCommand::Dish(need("a dish name")?)),
        "/people" => need("a number")?
            .parse()
            .map(ShellCommand::People)
            .map_err(|_| format!("not a whole number: {}", rest)),
        "/budget" => need("an amount")?
            .parse()
            .map(ShellCommand::Budget)
            .map_err(|_| format!("not an amount: {}", rest)),
        "/address" => Ok(ShellCommand::Address(need("a place")?)),
        "/point" => {
            let parts: Vec<&str> = rest.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty()).collect();
            match parts.as_slice() {
                [lat, lng] => match (lat.parse::<f64>(), lng.parse::<f64>()) {
                    (Ok(lat), Ok(lng)) => Ok(ShellCommand::Point(GeoPoint::new(lat, lng))),
                    _ => Err(format!("not coordinates: {}", rest)),
                },
                _ => Err("/point needs LAT LNG".to_string()),
            }
        }
        "/here" => Ok(ShellCommand::Here),
        "/generate" | "/gen" => Ok(ShellCommand::Generate),
        "/add" => Ok(ShellCommand::Add(need("an ingredient name")?)),
        "/custom" => {
            let (name, quantity) = parse_custom(&need("NAME=QTY")?)?;
            Ok(ShellCommand::Custom(name, quantity))
        }
        "/rm" => Ok(ShellCommand::Remove(need("an item name")?)),
        "/inc" | "/dec" => {
            let target = need("an item name")?;
            let split = target
                .rsplit_once(char::is_whitespace)
                .and_then(|(name, n)| n.parse::<i64>().ok().map(|n| (name.trim().to_string(), n)));
            let (name, step) = split.unwrap_or((target, 1));
            let delta = if cmd == "/dec" { -step } else { step };
            Ok(ShellCommand::Adjust(name, delta))
        }
        "/all" => Ok(ShellCommand::All),
        "/none" => Ok(ShellCommand::None),
        "/basket" => Ok(ShellCommand::Basket),
        "/recommend" | "/rec" => Ok(ShellCommand::Recommend),
        "/store" => Ok(ShellCommand::Store(need("a store name")?)),
        "/summary" => Ok(ShellCommand::Summary),
        "/breakdown" => Ok(ShellCommand::Breakdown),
        "/export" => Ok(ShellCommand::Export(PathBuf::from(need("a file path")?))),
        "/restart" => Ok(ShellCommand::Restart),
        "/help" | "/h" => Ok(ShellCommand::Help),
        "/quit" | "/q" | "/exit" => Ok(ShellCommand::Quit),
        other => Err(format!("Unknown command: {}", other)),
    }
}

/// Interactive shell over one planner
pub struct ReplSession {
    planner: TripPlanner,
}

impl ReplSession {
    pub fn new(planner: TripPlanner) -> Self {
        Self { planner }
    }

    /// Run the shell main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", "tp>".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if !input.starts_with('/') {
                        println!("Commands start with {}. Type {} for the list.", "/".yellow(), "/help".yellow());
                        continue;
                    }

                    match parse_line(input) {
                        Ok(command) => {
                            if self.handle(command).await == SlashResult::Quit {
                                break;
                            }
                        }
                        Err(message) => render::print_failure(FailureKind::InputValidation, &message),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        let _ = self.planner.shutdown().await;
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Trip Planner".bright_cyan().bold());
        println!("Region: {}", self.planner.region().name);
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Run one command, printing its outcome
    pub async fn handle(&mut self, command: ShellCommand) -> SlashResult {
        debug!(?command, "handle: called");
        match command {
            ShellCommand::Dish(dish) => match self.planner.set_dish(&dish).await {
                Ok(()) => render::print_ok(&format!("Dish: {}", dish)),
                Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
            },
            ShellCommand::People(n) => match self.planner.set_people_count(n).await {
                Ok(()) => render::print_ok(&format!("People: {}", n)),
                Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
            },
            ShellCommand::Budget(b) => match self.planner.set_budget(b).await {
                Ok(()) => render::print_ok(&format!("Budget: {}", render::money(b))),
                Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
            },
            ShellCommand::Address(query) => {
                let result = self.planner.resolve_address(&query).await;
                self.report_address(result);
            }
            ShellCommand::Point(point) => {
                let result = self.planner.resolve_point(point).await;
                self.report_address(result);
            }
            ShellCommand::Here => {
                let result = self.planner.resolve_here().await;
                self.report_address(result);
            }
            ShellCommand::Generate => {
                println!("{}", "Generating ingredients...".dimmed());
                match self.planner.generate_ingredients().await {
                    Ok(Commit::Applied(list)) => {
                        render::print_ok(&format!("{} ingredients", list.len()));
                        if let Ok(record) = self.planner.snapshot().await {
                            render::print_ingredients(&record);
                        }
                    }
                    Ok(Commit::Stale) => println!("{}", "Result superseded.".dimmed()),
                    Err(e) => render::print_failure(e.kind(), &e.to_string()),
                }
            }
            ShellCommand::Add(name) => {
                let result = self.planner.add_item(&name).await;
                self.report_basket(result);
            }
            ShellCommand::Custom(name, quantity) => {
                let result = self.planner.add_custom(&name, &quantity).await;
                self.report_basket(result);
            }
            ShellCommand::Remove(name) => {
                let result = self.planner.remove_item(&name).await;
                self.report_basket(result);
            }
            ShellCommand::Adjust(name, delta) => {
                let result = self.planner.adjust_count(&name, delta).await;
                self.report_basket(result);
            }
            ShellCommand::All => {
                let result = self.planner.select_all().await;
                self.report_basket(result);
            }
            ShellCommand::None => {
                let result = self.planner.deselect_all().await;
                self.report_basket(result);
            }
            ShellCommand::Basket => match self.planner.snapshot().await {
                Ok(record) => {
                    render::print_ingredients(&record);
                    println!();
                    render::print_basket(&record.basket);
                }
                Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
            },
            ShellCommand::Recommend => {
                println!("{}", "Pricing basket...".dimmed());
                match self.planner.recommend().await {
                    Ok(Commit::Applied(_)) => self.show_breakdown().await,
                    Ok(Commit::Stale) => println!("{}", "Result superseded.".dimmed()),
                    Err(e) => render::print_failure(e.kind(), &e.to_string()),
                }
            }
            ShellCommand::Store(store) => match self.planner.select_store(&store).await {
                Ok(verdict) => render::print_verdict(&verdict),
                Err(e) => render::print_failure(e.kind(), &e.to_string()),
            },
            ShellCommand::Summary => match self.planner.summary().await {
                Ok(summary) => render::print_summary(&summary),
                Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
            },
            ShellCommand::Breakdown => self.show_breakdown().await,
            ShellCommand::Export(path) => match self.planner.breakdown().await {
                Ok(Some(breakdown)) => match breakdown.write_json(&path) {
                    Ok(()) => render::print_ok(&format!("Exported to {}", path.display())),
                    Err(e) => render::print_failure(FailureKind::Internal, &format!("{:#}", e)),
                },
                Ok(None) => render::print_failure(FailureKind::NotFound, "No recommendation to export yet"),
                Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
            },
            ShellCommand::Restart => match self.planner.restart().await {
                Ok(_) => render::print_ok("Started a new plan"),
                Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
            },
            ShellCommand::Help => self.print_help(),
            ShellCommand::Quit => return SlashResult::Quit,
        }
        SlashResult::Continue
    }

    fn report_address(&self, result: Result<Commit<crate::domain::Address>, crate::address::ResolveError>) {
        match result {
            Ok(Commit::Applied(address)) => {
                render::print_ok(&format!("Address: {} ({})", address.text, address.point()))
            }
            Ok(Commit::Stale) => println!("{}", "Result superseded by a newer lookup.".dimmed()),
            Err(e) => render::print_failure(e.kind(), &e.to_string()),
        }
    }

    fn report_basket(&self, result: Result<Vec<crate::domain::BasketItem>, crate::basket::BasketError>) {
        match result {
            Ok(items) => render::print_basket(&items),
            Err(e) => render::print_failure(e.kind(), &e.to_string()),
        }
    }

    async fn show_breakdown(&self) {
        match self.planner.breakdown().await {
            Ok(Some(breakdown)) => render::print_breakdown(&breakdown),
            Ok(None) => println!("{}", "No recommendation yet. Use /recommend.".dimmed()),
            Err(e) => render::print_failure(FailureKind::Internal, &e.to_string()),
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Plan:".bright_cyan());
        println!("  {:22} Set the dish", "/dish NAME".yellow());
        println!("  {:22} Set the number of people", "/people N".yellow());
        println!("  {:22} Set the budget", "/budget AMOUNT".yellow());
        println!("  {:22} Find a place by name", "/address TEXT".yellow());
        println!("  {:22} Use a map point", "/point LAT LNG".yellow());
        println!("  {:22} Use the device position", "/here".yellow());
        println!("  {:22} Show what has been entered", "/summary".yellow());
        println!();
        println!("{}", "Basket:".bright_cyan());
        println!("  {:22} Generate ingredients for the dish", "/generate".yellow());
        println!("  {:22} Add a generated ingredient", "/add NAME".yellow());
        println!("  {:22} Add your own item", "/custom NAME=QTY".yellow());
        println!("  {:22} Remove an item", "/rm NAME".yellow());
        println!("  {:22} Raise or lower a count", "/inc|/dec NAME [N]".yellow());
        println!("  {:22} Add or remove all generated items", "/all, /none".yellow());
        println!("  {:22} Show ingredients and basket", "/basket".yellow());
        println!();
        println!("{}", "Results:".bright_cyan());
        println!("  {:22} Price the basket across stores", "/recommend".yellow());
        println!("  {:22} Show totals for a store", "/store NAME".yellow());
        println!("  {:22} Show the price breakdown", "/breakdown".yellow());
        println!("  {:22} Save the breakdown as JSON", "/export PATH".yellow());
        println!();
        println!("  {:22} Start over", "/restart".yellow());
        println!("  {:22} Exit", "/quit".yellow());
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_line("/dish Chicken adobo"), Ok(ShellCommand::Dish("Chicken adobo".to_string())));
        assert_eq!(parse_line("/people 4"), Ok(ShellCommand::People(4)));
        assert_eq!(parse_line("/budget 499.50"), Ok(ShellCommand::Budget(499.5)));
        assert_eq!(parse_line("/all"), Ok(ShellCommand::All));
        assert_eq!(parse_line("/q"), Ok(ShellCommand::Quit));
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_line("/point 14.6, 121.0"),
            Ok(ShellCommand::Point(GeoPoint::new(14.6, 121.0)))
        );
        assert!(parse_line("/point 14.6").is_err());
        assert!(parse_line("/point a b").is_err());
    }

    #[test]
    fn test_parse_adjust_with_optional_step() {
        assert_eq!(
            parse_line("/inc Soy sauce"),
            Ok(ShellCommand::Adjust("Soy sauce".to_string(), 1))
        );
        assert_eq!(
            parse_line("/dec Soy sauce 3"),
            Ok(ShellCommand::Adjust("Soy sauce".to_string(), -3))
        );
    }

    #[test]
    fn test_parse_custom_item() {
        assert_eq!(
            parse_line("/custom Bay leaves = 3 pcs"),
            Ok(ShellCommand::Custom("Bay leaves".to_string(), "3 pcs".to_string()))
        );
        assert!(parse_line("/custom Bay leaves").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("/people four").is_err());
        assert!(parse_line("/dish").is_err());
        assert!(parse_line("/frobnicate").is_err());
    }
}
