//! Derived budget figures.
//!
//! Everything here is computed from the records on each call; nothing is
//! cached, so figures can never lag behind a mutation.
//!
//! Two lenses are kept apart:
//!
//! - *spent so far* ([`Metrics::total_expenses`], [`Metrics::remaining_money`])
//!   ignores the actual amount of open-due lines;
//! - *allocated* ([`Metrics::expected_money_on_hand`]) subtracts every
//!   expected amount whatever its due or paid state.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{Amount, ExpenseRecord, IncomeRecord};

/// Utilization above this percentage is reported as approaching the limit.
pub const APPROACHING_THRESHOLD: f64 = 90.0;

/// Open due: future due date and not paid yet.
pub fn is_open_due(record: &ExpenseRecord, today: NaiveDate) -> bool {
    record.is_open_due(today)
}

/// `actual - expected`; positive = overspent, negative = underspent.
pub fn variance(record: &ExpenseRecord) -> Amount {
    record.variance()
}

/// Headline figures.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub date: NaiveDate,
    pub total_income: Amount,
    pub total_expenses: Amount,
    pub remaining_money: Amount,
    pub expected_money_on_hand: Amount,
    /// Spent share of income, `None` without income.
    pub spent_percent_of_income: Option<f64>,
}

/// Budget vs. actual over all expense lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub total_expected: Amount,
    pub total_actual: Amount,
    pub total_variance: Amount,
    pub overspent_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryTotals {
    pub category: String,
    pub expected: Amount,
    pub actual: Amount,
    pub variance: Amount,
    /// Share of all actual amounts, `None` when nothing was spent.
    pub share_percent: Option<f64>,
}

/// One expense line with its variance, for rankings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VarianceLine {
    pub category: String,
    pub subcategory: String,
    pub variance: Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UtilizationStatus {
    Within,
    Approaching,
    Over,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IncomeLine {
    pub individual: String,
    pub monthly_income: Amount,
}

/// Read-only view over a store snapshot.
#[derive(Clone, Copy, Debug)]
pub struct Metrics<'a> {
    incomes: &'a [IncomeRecord],
    expenses: &'a [ExpenseRecord],
}

impl<'a> Metrics<'a> {
    pub fn new(incomes: &'a [IncomeRecord], expenses: &'a [ExpenseRecord]) -> Self {
        Self { incomes, expenses }
    }

    /// First income row per distinct non-empty name.
    fn distinct_incomes(&self) -> Vec<&'a IncomeRecord> {
        let mut seen: Vec<&'a IncomeRecord> = Vec::new();
        for income in self.incomes {
            if income.individual.is_empty()
                || seen.iter().any(|other| other.individual == income.individual)
            {
                continue;
            }
            seen.push(income);
        }
        seen
    }

    pub fn total_income(&self) -> Amount {
        self.distinct_incomes()
            .iter()
            .map(|income| income.monthly_income)
            .sum()
    }

    /// Actual amounts of every line that is not open due.
    pub fn total_expenses(&self, today: NaiveDate) -> Amount {
        self.expenses
            .iter()
            .filter(|record| !record.is_open_due(today))
            .map(|record| record.actual)
            .sum()
    }

    pub fn total_expected(&self) -> Amount {
        self.expenses.iter().map(|record| record.expected).sum()
    }

    /// Sum of actual amounts with no due-date exclusion.
    pub fn total_actual(&self) -> Amount {
        self.expenses.iter().map(|record| record.actual).sum()
    }

    /// Income minus every expected amount.
    pub fn expected_money_on_hand(&self) -> Amount {
        self.total_income() - self.total_expected()
    }

    pub fn remaining_money(&self, today: NaiveDate) -> Amount {
        self.total_income() - self.total_expenses(today)
    }

    /// `Σ actual / Σ expected * 100`, `None` when nothing is expected.
    pub fn budget_utilization(&self) -> Option<f64> {
        self.total_actual().percent_of(self.total_expected())
    }

    pub fn utilization_status(&self) -> Option<UtilizationStatus> {
        self.budget_utilization().map(|percent| {
            if percent > 100.0 {
                UtilizationStatus::Over
            } else if percent > APPROACHING_THRESHOLD {
                UtilizationStatus::Approaching
            } else {
                UtilizationStatus::Within
            }
        })
    }

    pub fn summary(&self, today: NaiveDate) -> Summary {
        let total_income = self.total_income();
        let total_expenses = self.total_expenses(today);
        Summary {
            date: today,
            total_income,
            total_expenses,
            remaining_money: total_income - total_expenses,
            expected_money_on_hand: self.expected_money_on_hand(),
            spent_percent_of_income: total_expenses.percent_of(total_income),
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        let total_expected = self.total_expected();
        let total_actual = self.total_actual();
        Dashboard {
            total_expected,
            total_actual,
            total_variance: total_actual - total_expected,
            overspent_count: self
                .expenses
                .iter()
                .filter(|record| record.variance().is_positive())
                .count(),
        }
    }

    /// Per category totals, largest actual first (ties by name).
    pub fn category_totals(&self) -> Vec<CategoryTotals> {
        let mut by_category: BTreeMap<&str, (Amount, Amount)> = BTreeMap::new();
        for record in self.expenses {
            let entry = by_category
                .entry(record.category.as_str())
                .or_insert((Amount::ZERO, Amount::ZERO));
            entry.0 += record.expected;
            entry.1 += record.actual;
        }

        let total_actual = self.total_actual();
        let mut totals: Vec<CategoryTotals> = by_category
            .into_iter()
            .map(|(category, (expected, actual))| CategoryTotals {
                category: category.to_string(),
                expected,
                actual,
                variance: actual - expected,
                share_percent: actual.percent_of(total_actual),
            })
            .collect();
        // Stable sort keeps the alphabetical order among equal actuals.
        totals.sort_by(|a, b| b.actual.cmp(&a.actual));
        totals
    }

    /// Up to `limit` lines over budget, largest variance first.
    pub fn top_overspent(&self, limit: usize) -> Vec<VarianceLine> {
        let mut lines: Vec<VarianceLine> = self
            .variance_lines()
            .filter(|line| line.variance.is_positive())
            .collect();
        lines.sort_by(|a, b| b.variance.cmp(&a.variance));
        lines.truncate(limit);
        lines
    }

    /// Up to `limit` lines under budget, most negative variance first.
    pub fn top_underspent(&self, limit: usize) -> Vec<VarianceLine> {
        let mut lines: Vec<VarianceLine> = self
            .variance_lines()
            .filter(|line| line.variance.is_negative())
            .collect();
        lines.sort_by(|a, b| a.variance.cmp(&b.variance));
        lines.truncate(limit);
        lines
    }

    fn variance_lines(&self) -> impl Iterator<Item = VarianceLine> + 'a {
        self.expenses.iter().map(|record| VarianceLine {
            category: record.category.clone(),
            subcategory: record.subcategory.clone(),
            variance: record.variance(),
        })
    }

    /// Distinct individuals, highest income first.
    pub fn income_summary(&self) -> Vec<IncomeLine> {
        let mut lines: Vec<IncomeLine> = self
            .distinct_incomes()
            .into_iter()
            .map(|income| IncomeLine {
                individual: income.individual.clone(),
                monthly_income: income.monthly_income,
            })
            .collect();
        lines.sort_by(|a, b| b.monthly_income.cmp(&a.monthly_income));
        lines
    }
}
