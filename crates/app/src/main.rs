use std::{
    io::{self, Write},
    process::ExitCode,
};

use chrono::{Local, NaiveDate};
use clap::Parser;
use engine::{Outcome, Persistence, RecordStore, Summary, UtilizationStatus};
use serde::Serialize;

use cli::{CategoryCommand, Cli, Command, ExpenseCommand, IncomeCommand};
use error::Result;
use settings::{Overrides, Settings};

mod cli;
mod error;
mod report;
mod settings;

/// `summary --json` payload.
#[derive(Serialize)]
struct SummaryReport<'a> {
    #[serde(flatten)]
    summary: &'a Summary,
    budget_utilization: Option<f64>,
    utilization_status: Option<UtilizationStatus>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match settings::load(Overrides {
        config: cli.config.clone(),
        file: cli.file.clone(),
        retention: cli.retention,
        level: cli.level.clone(),
    }) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(format!(
            "bilancio={level},engine={level}",
            level = settings.level
        ))
        .init();

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open(settings: &Settings) -> Result<RecordStore> {
    let store = RecordStore::builder()
        .path(&settings.file)
        .retention(settings.retention)
        .open()?;
    Ok(store)
}

fn run(command: Command, settings: &Settings) -> Result<()> {
    let mut out = io::stdout().lock();
    match command {
        Command::Verify => verify(&mut out, settings),
        command => run_on_store(&mut out, command, settings),
    }
}

fn run_on_store(out: &mut impl Write, command: Command, settings: &Settings) -> Result<()> {
    let mut store = open(settings)?;
    let today = today();

    let outcome = match command {
        Command::Summary { json } => {
            let metrics = store.metrics();
            let summary = metrics.summary(today);
            if json {
                let report = SummaryReport {
                    summary: &summary,
                    budget_utilization: metrics.budget_utilization(),
                    utilization_status: metrics.utilization_status(),
                };
                serde_json::to_writer_pretty(&mut *out, &report)?;
                writeln!(out)?;
            } else {
                report::summary(out, &summary)?;
            }
            return Ok(());
        }
        Command::Dashboard => {
            let metrics = store.metrics();
            report::dashboard(
                out,
                &metrics.dashboard(),
                metrics.budget_utilization(),
                metrics.utilization_status(),
                store.expenses(),
                today,
            )?;
            return Ok(());
        }
        Command::Analysis { top } => {
            let metrics = store.metrics();
            report::analysis(
                out,
                &metrics.category_totals(),
                &metrics.top_overspent(top),
                &metrics.top_underspent(top),
            )?;
            return Ok(());
        }
        Command::Categories => {
            let categories: Vec<_> = store
                .list_categories()
                .into_iter()
                .map(|category| {
                    let subcategories = store.list_subcategories(&category);
                    (category, subcategories)
                })
                .collect();
            report::categories(out, &categories)?;
            return Ok(());
        }
        Command::Individuals => {
            report::individuals(out, &store.metrics().income_summary())?;
            return Ok(());
        }
        Command::Verify => return verify(out, settings),
        Command::Expense(expense) => match expense.command {
            ExpenseCommand::Add {
                line,
                expected,
                actual,
            } => store.add_expense(&line.category, &line.subcategory, expected, actual)?,
            ExpenseCommand::Remove { line } => {
                store.remove_expense(&line.category, &line.subcategory)?
            }
            ExpenseCommand::Expected { line, amount } => {
                store.update_expected(&line.category, &line.subcategory, amount)?
            }
            ExpenseCommand::Actual { line, amount } => {
                store.update_actual(&line.category, &line.subcategory, amount)?
            }
            ExpenseCommand::Paid { line } => {
                store.set_paid_on(&line.category, &line.subcategory, true, today)?
            }
            ExpenseCommand::Unpaid { line } => {
                store.set_paid_on(&line.category, &line.subcategory, false, today)?
            }
            ExpenseCommand::Due { line, date } => {
                store.set_due_date(&line.category, &line.subcategory, date)?
            }
        },
        Command::Category(category) => match category.command {
            CategoryCommand::Add { category } => store.add_category(&category)?,
            CategoryCommand::Remove { category } => store.remove_category(&category)?,
        },
        Command::Income(income) => match income.command {
            IncomeCommand::Add { individual, amount } => store.add_income(&individual, amount)?,
            IncomeCommand::Remove { individual } => store.remove_income(&individual)?,
            IncomeCommand::Set { individual, amount } => {
                store.update_income_on(&individual, amount, today)?
            }
        },
        Command::Reset => store.reset_monthly()?,
    };

    print_outcome(out, &outcome)
}

fn print_outcome(out: &mut impl Write, outcome: &Outcome) -> Result<()> {
    writeln!(out, "{outcome}")?;
    tracing::debug!("{}", outcome.saved);
    Ok(())
}

/// Loads the sheet without building a store and reports what was found.
fn verify(out: &mut impl Write, settings: &Settings) -> Result<()> {
    let persistence = Persistence::csv(&settings.file).with_retention(settings.retention);
    let table = persistence.load().map_err(engine::EngineError::from)?;
    let backups = persistence.backups()?;

    writeln!(out, "{} is readable", settings.file.display())?;
    writeln!(out, "  rows:          {}", table.rows.len())?;
    writeln!(out, "  individuals:   {}", table.individuals().count())?;
    writeln!(out, "  expense lines: {}", table.expenses().count())?;
    if !table.extra_columns.is_empty() {
        writeln!(out, "  extra columns: {}", table.extra_columns.join(", "))?;
    }
    writeln!(
        out,
        "  backups:       {} (keeping {})",
        backups.len(),
        persistence.retention()
    )?;
    Ok(())
}
