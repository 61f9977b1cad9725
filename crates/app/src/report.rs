//! Plain text rendering of the engine figures.
use std::io::{self, Write};

use chrono::NaiveDate;
use engine::{
    CategoryTotals, Dashboard, ExpenseRecord, IncomeLine, Summary, UtilizationStatus, VarianceLine,
};

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| format!("{value:.1}%"))
}

fn date(value: Option<NaiveDate>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

pub fn summary(out: &mut impl Write, summary: &Summary) -> io::Result<()> {
    writeln!(out, "Summary for {}", summary.date)?;
    writeln!(out, "  Total income:           {:>12}", summary.total_income.to_string())?;
    writeln!(out, "  Spent so far:           {:>12}", summary.total_expenses.to_string())?;
    writeln!(out, "  Remaining money:        {:>12}", summary.remaining_money.to_string())?;
    writeln!(
        out,
        "  Expected money on hand: {:>12}",
        summary.expected_money_on_hand.to_string()
    )?;
    writeln!(
        out,
        "  Spent of income:        {:>12}",
        percent(summary.spent_percent_of_income)
    )
}

pub fn dashboard(
    out: &mut impl Write,
    dashboard: &Dashboard,
    utilization: Option<f64>,
    status: Option<UtilizationStatus>,
    expenses: &[ExpenseRecord],
    today: NaiveDate,
) -> io::Result<()> {
    writeln!(
        out,
        "{:<16} {:<20} {:>11} {:>11} {:>11} {:<5} {:<10}",
        "Category", "Subcategory", "Expected", "Actual", "Variance", "Paid", "Due"
    )?;
    for record in expenses {
        let paid = if record.is_paid() {
            "yes"
        } else if record.is_open_due(today) {
            "due"
        } else {
            "no"
        };
        writeln!(
            out,
            "{:<16} {:<20} {:>11} {:>11} {:>11} {:<5} {:<10}",
            record.category,
            record.subcategory,
            record.expected.to_string(),
            record.actual.to_string(),
            record.variance().to_string(),
            paid,
            date(record.due_date)
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Total expected: {}", dashboard.total_expected)?;
    writeln!(out, "Total actual:   {}", dashboard.total_actual)?;
    writeln!(out, "Total variance: {}", dashboard.total_variance)?;
    writeln!(out, "Overspent lines: {}", dashboard.overspent_count)?;
    let status = match status {
        Some(UtilizationStatus::Over) => " (over budget)",
        Some(UtilizationStatus::Approaching) => " (approaching budget)",
        Some(UtilizationStatus::Within) => " (within budget)",
        None => "",
    };
    writeln!(out, "Budget utilization: {}{status}", percent(utilization))
}

pub fn analysis(
    out: &mut impl Write,
    totals: &[CategoryTotals],
    overspent: &[VarianceLine],
    underspent: &[VarianceLine],
) -> io::Result<()> {
    writeln!(
        out,
        "{:<16} {:>11} {:>11} {:>11} {:>7}",
        "Category", "Expected", "Actual", "Variance", "Share"
    )?;
    for total in totals {
        writeln!(
            out,
            "{:<16} {:>11} {:>11} {:>11} {:>7}",
            total.category,
            total.expected.to_string(),
            total.actual.to_string(),
            total.variance.to_string(),
            percent(total.share_percent)
        )?;
    }

    variance_lines(out, "Overspent", overspent)?;
    variance_lines(out, "Underspent", underspent)
}

fn variance_lines(out: &mut impl Write, title: &str, lines: &[VarianceLine]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{title}:")?;
    if lines.is_empty() {
        return writeln!(out, "  none");
    }
    for line in lines {
        writeln!(
            out,
            "  {}/{}: {}",
            line.category, line.subcategory, line.variance
        )?;
    }
    Ok(())
}

pub fn categories(out: &mut impl Write, categories: &[(String, Vec<String>)]) -> io::Result<()> {
    for (category, subcategories) in categories {
        writeln!(out, "{category}")?;
        for subcategory in subcategories {
            writeln!(out, "  {subcategory}")?;
        }
    }
    Ok(())
}

pub fn individuals(out: &mut impl Write, lines: &[IncomeLine]) -> io::Result<()> {
    for line in lines {
        writeln!(
            out,
            "{:<20} {:>12}",
            line.individual,
            line.monthly_income.to_string()
        )?;
    }
    Ok(())
}
