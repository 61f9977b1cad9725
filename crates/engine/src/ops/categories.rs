use std::collections::BTreeSet;

use crate::{
    Amount, EngineError, ExpenseRecord, ResultEngine, codec::TableCodec,
    util::normalize_required_name,
};

use super::{Outcome, RecordStore};

/// Subcategory created together with a new category.
pub const PLACEHOLDER_SUBCATEGORY: &str = "Other";

impl<C: TableCodec> RecordStore<C> {
    /// Distinct non-empty categories, sorted.
    pub fn list_categories(&self) -> Vec<String> {
        self.expenses
            .iter()
            .map(|record| record.category.as_str())
            .filter(|category| !category.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Distinct non-empty subcategories of `category`, sorted.
    pub fn list_subcategories(&self, category: &str) -> Vec<String> {
        self.expenses
            .iter()
            .filter(|record| record.category == category)
            .map(|record| record.subcategory.as_str())
            .filter(|subcategory| !subcategory.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Creates `category` with a zeroed [`PLACEHOLDER_SUBCATEGORY`] line.
    pub fn add_category(&mut self, category: &str) -> ResultEngine<Outcome> {
        let category = normalize_required_name(category, "category")?;
        if self.expenses.iter().any(|record| record.category == category) {
            return Err(EngineError::ExistingKey(category));
        }

        let message = format!(
            "Added new category '{category}' with placeholder '{PLACEHOLDER_SUBCATEGORY}' subcategory"
        );
        let mut record = ExpenseRecord::new(
            category,
            PLACEHOLDER_SUBCATEGORY.to_string(),
            Amount::ZERO,
            Amount::ZERO,
        );
        record.extras = self.blank_extras();
        self.expenses.push(record);
        self.commit(message, 0)
    }

    /// Removes every expense of `category`; [`Outcome::removed`] holds the count.
    pub fn remove_category(&mut self, category: &str) -> ResultEngine<Outcome> {
        let before = self.expenses.len();
        self.expenses.retain(|record| record.category != category);
        let removed = before - self.expenses.len();
        if removed == 0 {
            return Err(EngineError::KeyNotFound(category.to_string()));
        }

        self.commit(
            format!("Removed category '{category}' ({removed} subcategories deleted)"),
            removed,
        )
    }
}
