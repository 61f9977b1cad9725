use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::Amount;

#[derive(Parser, Debug)]
#[command(name = "bilancio", version)]
#[command(about = "Household budget tracker over a CSV sheet")]
pub struct Cli {
    /// Backing sheet (also read from `BILANCIO_FILE`).
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Number of backups to keep.
    #[arg(long, global = true)]
    pub retention: Option<usize>,
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Income, spent so far and money left.
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Expected vs. actual for every expense line.
    Dashboard,
    /// Category totals and the largest variances.
    Analysis {
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Categories with their subcategories.
    Categories,
    /// Individuals with their monthly income.
    Individuals,
    /// Check that the sheet can be loaded.
    Verify,
    Expense(Expense),
    Category(Category),
    Income(Income),
    /// Zero every actual and mark every expense unpaid.
    Reset,
}

#[derive(Args, Debug)]
pub struct Expense {
    #[command(subcommand)]
    pub command: ExpenseCommand,
}

#[derive(Args, Debug)]
pub struct ExpenseRef {
    pub category: String,
    pub subcategory: String,
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    Add {
        #[command(flatten)]
        line: ExpenseRef,
        #[arg(long, default_value = "0")]
        expected: Amount,
        #[arg(long, default_value = "0")]
        actual: Amount,
    },
    Remove {
        #[command(flatten)]
        line: ExpenseRef,
    },
    /// Set the expected amount.
    Expected {
        #[command(flatten)]
        line: ExpenseRef,
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },
    /// Set the actual amount.
    Actual {
        #[command(flatten)]
        line: ExpenseRef,
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },
    /// Mark paid today.
    Paid {
        #[command(flatten)]
        line: ExpenseRef,
    },
    Unpaid {
        #[command(flatten)]
        line: ExpenseRef,
    },
    /// Set the due date (YYYY-MM-DD); without a date it is cleared.
    Due {
        #[command(flatten)]
        line: ExpenseRef,
        date: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
pub struct Category {
    #[command(subcommand)]
    pub command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    /// Create a category with an `Other` line.
    Add { category: String },
    /// Remove a category and all its lines.
    Remove { category: String },
}

#[derive(Args, Debug)]
pub struct Income {
    #[command(subcommand)]
    pub command: IncomeCommand,
}

#[derive(Subcommand, Debug)]
pub enum IncomeCommand {
    Add {
        individual: String,
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },
    Remove {
        individual: String,
    },
    /// Set the monthly income.
    Set {
        individual: String,
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },
}
