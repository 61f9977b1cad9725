use std::{fmt, path::PathBuf};

use crate::{
    EngineError, ExpenseRecord, IncomeRecord, LoadError, Metrics, ResultEngine, SaveInfo,
    codec::{CsvCodec, TableCodec},
    persistence::{DEFAULT_RETENTION, Persistence},
    records::Extras,
    table::{Row, Table, aligned},
};

mod categories;
mod expenses;
mod income;
mod lifecycle;

pub use categories::PLACEHOLDER_SUBCATEGORY;

/// What a successful mutation did.
///
/// `message` is the one line meant for the user; `saved` says where the data
/// went on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub saved: SaveInfo,
    /// Records deleted by the operation, 0 for non-removals.
    pub removed: usize,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// In-memory incomes and expenses of one backing file.
///
/// Every mutation changes memory first and then saves the whole table. A
/// failed save is returned as [`EngineError::Save`]; the mutation is **not**
/// rolled back, so memory is ahead of disk until the next successful save.
#[derive(Debug)]
pub struct RecordStore<C = CsvCodec> {
    persistence: Persistence<C>,
    extra_columns: Vec<String>,
    incomes: Vec<IncomeRecord>,
    /// Insertion order is display order.
    expenses: Vec<ExpenseRecord>,
    /// Rows that carried only uninterpreted cells.
    loose_rows: Vec<Extras>,
}

impl RecordStore<CsvCodec> {
    /// Return a builder for `RecordStore`. Help to build the struct.
    pub fn builder() -> RecordStoreBuilder {
        RecordStoreBuilder::default()
    }
}

impl<C: TableCodec> RecordStore<C> {
    /// Loads the backing file. Any failure leaves no store behind.
    pub fn open(persistence: Persistence<C>) -> ResultEngine<Self> {
        let table = persistence.load()?;
        let store = Self::from_table(persistence, table)?;
        tracing::info!(
            incomes = store.incomes.len(),
            expenses = store.expenses.len(),
            "loaded {}",
            store.persistence.path().display()
        );
        Ok(store)
    }

    fn from_table(persistence: Persistence<C>, table: Table) -> Result<Self, LoadError> {
        let mut incomes = Vec::new();
        let mut expenses: Vec<ExpenseRecord> = Vec::new();
        let mut loose_rows = Vec::new();

        let width = table.extra_columns.len();
        for row in table.rows {
            let extras = aligned(row.extras, width);
            match (row.income, row.expense) {
                (income, Some(mut expense)) => {
                    if expenses
                        .iter()
                        .any(|other| other.matches(&expense.category, &expense.subcategory))
                    {
                        return Err(LoadError::DuplicateKey(expense.key().to_string()));
                    }
                    expense.extras = extras;
                    expenses.push(expense);
                    // Saved on a row of its own, so it gets blank cells.
                    incomes.extend(income.map(|mut income| {
                        income.extras = aligned(Vec::new(), width);
                        income
                    }));
                }
                (Some(mut income), None) => {
                    income.extras = extras;
                    incomes.push(income);
                }
                (None, None) => loose_rows.push(extras),
            }
        }

        Ok(Self {
            persistence,
            extra_columns: table.extra_columns,
            incomes,
            expenses,
            loose_rows,
        })
    }

    /// Rebuilds the sheet: income rows, then expense rows, then loose rows.
    pub fn to_table(&self) -> Table {
        let income_rows = self.incomes.iter().map(|income| {
            let mut income = income.clone();
            let extras = std::mem::take(&mut income.extras);
            Row {
                income: Some(income),
                expense: None,
                extras,
            }
        });
        let expense_rows = self.expenses.iter().map(|expense| {
            let mut expense = expense.clone();
            let extras = std::mem::take(&mut expense.extras);
            Row {
                income: None,
                expense: Some(expense),
                extras,
            }
        });
        let loose = self.loose_rows.iter().map(|extras| Row {
            income: None,
            expense: None,
            extras: extras.clone(),
        });

        let width = self.extra_columns.len();
        let rows = income_rows
            .chain(expense_rows)
            .chain(loose)
            .map(|mut row| {
                row.extras = aligned(row.extras, width);
                row
            })
            .collect();

        Table {
            extra_columns: self.extra_columns.clone(),
            rows,
        }
    }

    /// Saves the current state and wraps the result for the caller.
    fn commit(&self, message: String, removed: usize) -> ResultEngine<Outcome> {
        match self.persistence.save(&self.to_table()) {
            Ok(saved) => Ok(Outcome {
                message,
                saved,
                removed,
            }),
            Err(err) => {
                tracing::error!("{message}, but the change is not on disk: {err}");
                Err(EngineError::Save(err))
            }
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.persistence.path()
    }

    pub fn incomes(&self) -> &[IncomeRecord] {
        &self.incomes
    }

    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Read-only figures over the current state.
    pub fn metrics(&self) -> Metrics<'_> {
        Metrics::new(&self.incomes, &self.expenses)
    }

    /// Empty cells for a record created in this session.
    fn blank_extras(&self) -> Extras {
        aligned(Vec::new(), self.extra_columns.len())
    }

    fn expense_mut(&mut self, category: &str, subcategory: &str) -> ResultEngine<&mut ExpenseRecord> {
        self.expenses
            .iter_mut()
            .find(|record| record.matches(category, subcategory))
            .ok_or_else(|| EngineError::KeyNotFound(format!("{category}/{subcategory}")))
    }
}

/// The builder for a CSV backed `RecordStore`.
#[derive(Debug)]
pub struct RecordStoreBuilder {
    path: PathBuf,
    retention: usize,
    delimiter: u8,
}

impl Default for RecordStoreBuilder {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Master_Sheet_Expenses.csv"),
            retention: DEFAULT_RETENTION,
            delimiter: b',',
        }
    }
}

impl RecordStoreBuilder {
    /// Pass the backing file
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Number of backups to keep
    pub fn retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load the file and construct `RecordStore`
    pub fn open(self) -> ResultEngine<RecordStore<CsvCodec>> {
        let persistence = Persistence::new(self.path, CsvCodec::with_delimiter(self.delimiter))
            .with_retention(self.retention);
        RecordStore::open(persistence)
    }
}
