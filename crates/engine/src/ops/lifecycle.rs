use crate::{Amount, EngineError, ResultEngine, codec::TableCodec};

use super::{Outcome, RecordStore};

impl<C: TableCodec> RecordStore<C> {
    /// Starts a new month: zero actuals and mark everything unpaid.
    ///
    /// Expected amounts, due dates and incomes are kept. All records are
    /// written with a single save.
    pub fn reset_monthly(&mut self) -> ResultEngine<Outcome> {
        if self.expenses.is_empty() {
            return Err(EngineError::NothingToReset);
        }

        for record in &mut self.expenses {
            record.actual = Amount::ZERO;
            record.mark_unpaid();
        }

        let count = self.expenses.len();
        self.commit(
            format!("Monthly reset: {count} expenses set to zero and unpaid"),
            0,
        )
    }
}
