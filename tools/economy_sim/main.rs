//! Economy Simulator - balance checks for the scenario economy
//!
//! Usage:
//!   economy_sim --strategy suggested
//!   economy_sim --strategy premium --days 14
//!   economy_sim --strategy bargain --seed 7
//!
//! Plays the lemonade-stand numbers against the real demand and expense
//! draws for a number of days and reports whether the profit target is
//! reachable. Outputs machine-readable JSON reports to
//! ./artifacts/simulations/

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use bvk_common::economy::{units_sold, EconomyParams};

// Lemonade-stand template, the balance reference for every tuning pass
const STARTING_BUDGET_CENTS: i64 = 5_000;
const TARGET_PROFIT_CENTS: i64 = 2_000;
const UNIT_COST_CENTS: i64 = 40;
const SUGGESTED_PRICE_CENTS: i64 = 100;
const RESTOCK_TO: i64 = 25;

#[derive(Debug, Clone, Serialize)]
struct DayRow {
    day: u32,
    bought: i64,
    sold: i64,
    revenue_cents: i64,
    expense_cents: i64,
    budget_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    strategy: String,
    price_cents: i64,
    demand_multiplier: f64,
    days: u32,
    seed: u64,
    starting_budget_cents: i64,
    final_budget_cents: i64,
    units_bought: i64,
    units_sold: i64,
    revenue_cents: i64,
    costs_cents: i64,
    profit_cents: i64,
    target_profit_cents: i64,
    target_met: bool,
    daily: Vec<DayRow>,
}

/// One shopkeeper day: restock up to the shelf target, offer the whole
/// shelf at the strategy price, pay overnight expenses.
fn simulate(strategy: &str, price_cents: i64, days: u32, seed: u64) -> SimulationReport {
    let params = EconomyParams::default();
    let mut rng = StdRng::seed_from_u64(seed);

    let multiplier = params.demand_multiplier(price_cents, SUGGESTED_PRICE_CENTS);

    let mut budget = STARTING_BUDGET_CENTS;
    let mut on_hand: i64 = 0;
    let mut revenue: i64 = 0;
    let mut costs: i64 = 0;
    let mut total_bought: i64 = 0;
    let mut total_sold: i64 = 0;
    let mut daily = Vec::new();

    for day in 1..=days {
        // Restock as far as the budget allows
        let shortfall = (RESTOCK_TO - on_hand).max(0);
        let affordable = (budget / UNIT_COST_CENTS).max(0);
        let bought = shortfall.min(affordable);
        let restock_cost = bought * UNIT_COST_CENTS;
        budget -= restock_cost;
        costs += restock_cost;
        on_hand += bought;
        total_bought += bought;

        // Offer everything on the shelf
        let draw = params.draw_demand(&mut rng);
        let sold = units_sold(on_hand, multiplier, draw).min(on_hand);
        let day_revenue = sold * price_cents;
        budget += day_revenue;
        revenue += day_revenue;
        on_hand -= sold;
        total_sold += sold;

        // Overnight expenses can push the budget negative
        let expense = params.draw_expense(&mut rng);
        budget -= expense;
        costs += expense;

        daily.push(DayRow {
            day,
            bought,
            sold,
            revenue_cents: day_revenue,
            expense_cents: expense,
            budget_cents: budget,
        });
    }

    let profit = revenue - costs;
    SimulationReport {
        strategy: strategy.to_string(),
        price_cents,
        demand_multiplier: multiplier,
        days,
        seed,
        starting_budget_cents: STARTING_BUDGET_CENTS,
        final_budget_cents: budget,
        units_bought: total_bought,
        units_sold: total_sold,
        revenue_cents: revenue,
        costs_cents: costs,
        profit_cents: profit,
        target_profit_cents: TARGET_PROFIT_CENTS,
        target_met: profit >= TARGET_PROFIT_CENTS,
        daily,
    }
}

fn dollars(cents: i64) -> String {
    format!("${:.2}", cents as f64 / 100.0)
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut days: u32 = 7;
    let mut seed: u64 = 42;
    let mut strategy = "suggested".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(7);
                    i += 2;
                } else {
                    eprintln!("Error: --days requires a value");
                    std::process::exit(1);
                }
            }
            "--seed" => {
                if i + 1 < args.len() {
                    seed = args[i + 1].parse().unwrap_or(42);
                    i += 2;
                } else {
                    eprintln!("Error: --seed requires a value");
                    std::process::exit(1);
                }
            }
            "--strategy" => {
                if i + 1 < args.len() {
                    strategy = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --strategy requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Economy Simulator - scenario balance checks");
                println!();
                println!("Usage:");
                println!("  economy_sim --strategy <strategy> [--days <N>] [--seed <N>]");
                println!();
                println!("Options:");
                println!("  --strategy <strategy> Pricing: suggested, premium, bargain");
                println!("  --days <N>            Days to play (1-30, default: 7)");
                println!("  --seed <N>            RNG seed (default: 42)");
                println!();
                println!("Examples:");
                println!("  economy_sim --strategy suggested");
                println!("  economy_sim --strategy premium --days 14");
                println!("  economy_sim --strategy bargain --seed 7");
                std::process::exit(0);
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                eprintln!("Run with --help for usage");
                std::process::exit(1);
            }
        }
    }

    if !(1..=30).contains(&days) {
        eprintln!("Error: days must be between 1 and 30");
        std::process::exit(1);
    }

    // Strategy sets the asking price relative to the suggested price
    let price_cents = match strategy.as_str() {
        "suggested" => SUGGESTED_PRICE_CENTS,
        "premium" => SUGGESTED_PRICE_CENTS * 3 / 2,
        "bargain" => SUGGESTED_PRICE_CENTS * 7 / 10,
        _ => {
            eprintln!("Error: Unknown strategy: {}", strategy);
            eprintln!("Valid strategies: suggested, premium, bargain");
            std::process::exit(1);
        }
    };

    let report = simulate(&strategy, price_cents, days, seed);

    let output_dir = PathBuf::from("./artifacts/simulations");
    fs::create_dir_all(&output_dir).unwrap();

    let output_file = output_dir.join(format!("economy_{}.json", strategy));
    let json = serde_json::to_string_pretty(&report).unwrap();
    fs::write(&output_file, json).unwrap();

    println!("\n=== Economy Simulation: {} ===\n", strategy);
    println!("Days:              {}", report.days);
    println!("Asking price:      {}", dollars(report.price_cents));
    println!("Demand multiplier: {:.1}", report.demand_multiplier);
    println!("Units bought:      {}", report.units_bought);
    println!("Units sold:        {}", report.units_sold);
    println!("Revenue:           {}", dollars(report.revenue_cents));
    println!("Costs:             {}", dollars(report.costs_cents));
    println!("Profit:            {}", dollars(report.profit_cents));
    println!(
        "Target:            {} ({})",
        dollars(report.target_profit_cents),
        if report.target_met { "met" } else { "missed" }
    );
    println!("Final budget:      {}", dollars(report.final_budget_cents));

    println!("\nReport saved to: {}\n", output_file.display());

    if report.target_met {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}
