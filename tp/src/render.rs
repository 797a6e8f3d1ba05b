//! Terminal rendering of session data and results

use colored::Colorize;

use crate::domain::{BasketItem, BudgetVerdict, FailureKind, SessionRecord, StoreLeaderboardEntry};
use crate::export::{Breakdown, PlanSummary};

pub fn money(amount: f64) -> String {
    format!("{:.2}", amount)
}

fn price_cell(price: Option<f64>) -> String {
    price.map(money).unwrap_or_else(|| "-".to_string())
}

pub fn print_failure(kind: FailureKind, message: &str) {
    let tag = match kind {
        FailureKind::InputValidation => "invalid".yellow(),
        FailureKind::NotFound => "not found".yellow(),
        FailureKind::OutOfRegion => "out of region".yellow(),
        FailureKind::LocationUnavailable => "no location".yellow(),
        FailureKind::ServiceError => "service".red(),
        FailureKind::Internal => "internal".red().bold(),
    };
    println!("{} [{}] {}", "✗".red(), tag, message);
    if kind.is_retryable() {
        println!("  {}", "You can try again.".dimmed());
    }
}

pub fn print_ok(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_summary(summary: &PlanSummary) {
    println!("{}", "Plan".bright_cyan().bold());
    if summary.points.is_empty() {
        println!("  {}", "Nothing entered yet.".dimmed());
        return;
    }
    for point in &summary.points {
        println!("  {:10} {}", point.label.dimmed(), point.value);
    }
}

/// Source ingredients, marking the ones already in the basket
pub fn print_ingredients(record: &SessionRecord) {
    println!("{}", "Ingredients".bright_cyan().bold());
    if record.generated_ingredients.is_empty() {
        println!("  {}", "None generated yet.".dimmed());
        return;
    }
    for ingredient in &record.generated_ingredients {
        let mark = if record.in_basket(&ingredient.name) {
            "●".green()
        } else {
            "○".dimmed()
        };
        println!("  {} {} {}", mark, ingredient.name, ingredient.quantity.dimmed());
    }
}

pub fn print_basket(items: &[BasketItem]) {
    println!("{}", "Basket".bright_cyan().bold());
    if items.is_empty() {
        println!("  {}", "Empty.".dimmed());
        return;
    }
    for item in items {
        println!("  {:>3} x {} {}", item.count, item.name, item.quantity.dimmed());
    }
}

pub fn print_leaderboard(leaderboard: &[StoreLeaderboardEntry], active: Option<&str>, recommended: &str) {
    println!("{}", "Stores".bright_cyan().bold());
    for (rank, entry) in leaderboard.iter().enumerate() {
        let marker = if Some(entry.store.as_str()) == active {
            "▶".green()
        } else {
            " ".normal()
        };
        let note = if entry.store == recommended {
            " (service pick)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {} {}. {:12} {:>10}{}", marker, rank + 1, entry.store, money(entry.total), note);
    }
}

pub fn print_verdict(verdict: &BudgetVerdict) {
    let status = if verdict.within_budget {
        "within budget".green().bold()
    } else {
        "over budget".red().bold()
    };
    println!(
        "{} at {}: {} of {} ({})",
        "Total".bold(),
        verdict.store,
        money(verdict.total),
        money(verdict.budget),
        status
    );
    match (verdict.remaining(), verdict.overage()) {
        (Some(left), _) => println!("  {} left", money(left)),
        (_, Some(over)) => println!("  {} over", money(over).red()),
        _ => {}
    }
}

pub fn print_breakdown(breakdown: &Breakdown) {
    println!("{}", "Breakdown".bright_cyan().bold());

    let mut header = format!("  {:20} {:>5}", "Item", "Qty");
    for store in &breakdown.stores {
        header.push_str(&format!(" {:>10}", store));
    }
    println!("{}", header.bold());

    for row in &breakdown.rows {
        let count = row.count.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        let mut line = format!("  {:20} {:>5}", row.name, count);
        for (store, price) in breakdown.stores.iter().zip(&row.prices) {
            let cell = format!(" {:>10}", price_cell(*price));
            if *store == row.cheapest_store {
                line.push_str(&cell.green().to_string());
            } else {
                line.push_str(&cell);
            }
        }
        println!("{}", line);
    }
    println!();

    print_leaderboard(
        &breakdown.leaderboard,
        breakdown.active_store.as_deref(),
        &breakdown.recommended_store,
    );
    if let Some(verdict) = &breakdown.verdict {
        println!();
        print_verdict(verdict);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_and_cells() {
        assert_eq!(money(27.0), "27.00");
        assert_eq!(money(1250.456), "1250.46");
        assert_eq!(price_cell(None), "-");
        assert_eq!(price_cell(Some(9.5)), "9.50");
    }
}
