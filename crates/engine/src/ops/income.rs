use chrono::NaiveDate;

use crate::{
    Amount, EngineError, IncomeRecord, ResultEngine,
    codec::TableCodec,
    util::{normalize_required_name, today},
};

use super::{Outcome, RecordStore};

impl<C: TableCodec> RecordStore<C> {
    /// Distinct non-empty names in first-seen order.
    pub fn list_individuals(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for income in &self.incomes {
            if !income.individual.is_empty() && !names.contains(&income.individual) {
                names.push(income.individual.clone());
            }
        }
        names
    }

    /// First income row of `individual`.
    pub fn income(&self, individual: &str) -> Option<&IncomeRecord> {
        self.incomes
            .iter()
            .find(|income| income.individual == individual)
    }

    /// Sets the monthly income on every row of `individual`.
    pub fn update_income(&mut self, individual: &str, value: Amount) -> ResultEngine<Outcome> {
        self.update_income_on(individual, value, today())
    }

    /// [`update_income`](Self::update_income) with an explicit update date.
    pub fn update_income_on(
        &mut self,
        individual: &str,
        value: Amount,
        today: NaiveDate,
    ) -> ResultEngine<Outcome> {
        let value = value.ensure_non_negative()?;
        let mut matched = 0;
        for income in self
            .incomes
            .iter_mut()
            .filter(|income| income.individual == individual)
        {
            income.monthly_income = value;
            income.last_updated = Some(today);
            matched += 1;
        }
        if matched == 0 {
            return Err(EngineError::KeyNotFound(individual.to_string()));
        }

        self.commit(
            format!("Updated monthly income of '{individual}' to {value}"),
            0,
        )
    }

    pub fn add_income(&mut self, individual: &str, value: Amount) -> ResultEngine<Outcome> {
        let individual = normalize_required_name(individual, "individual")?;
        let value = value.ensure_non_negative()?;
        if self.income(&individual).is_some() {
            return Err(EngineError::ExistingKey(individual));
        }

        let message = format!("Added '{individual}' with monthly income {value}");
        let mut income = IncomeRecord::new(individual, value);
        income.last_updated = Some(today());
        income.extras = self.blank_extras();
        self.incomes.push(income);
        self.commit(message, 0)
    }

    /// Removes every row of `individual`.
    pub fn remove_income(&mut self, individual: &str) -> ResultEngine<Outcome> {
        let before = self.incomes.len();
        self.incomes.retain(|income| income.individual != individual);
        let removed = before - self.incomes.len();
        if removed == 0 {
            return Err(EngineError::KeyNotFound(individual.to_string()));
        }
        self.commit(format!("Removed '{individual}'"), removed)
    }
}
