//! Shared command utilities

use tally_core::{Config, Coordinator, HttpTransactionService, Stats, TransactionClient};

/// Build a coordinator against the configured transaction service
pub fn open_coordinator(config: &Config) -> Coordinator {
    let client = TransactionClient::Http(HttpTransactionService::new(&config.service.base_url));
    Coordinator::new(client, config.coordinator_options())
}

/// Print a statistics block
pub fn print_stats(stats: &Stats) {
    println!("  Income:   {:>12.2}  ({} transactions)", stats.total_income, stats.income_count);
    println!("  Expenses: {:>12.2}  ({} transactions)", stats.total_expenses, stats.expense_count);
    println!("  Balance:  {:>12.2}", stats.net_balance);
    println!("  Total:    {:>9} transactions", stats.transaction_count);
}
