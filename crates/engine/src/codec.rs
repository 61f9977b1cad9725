//! Tabular file codec.
//!
//! The store only needs "read the whole sheet" and "write the whole sheet";
//! [`TableCodec`] is that seam. [`CsvCodec`] is the format shipped with the
//! engine.

use std::{
    collections::HashMap,
    io::{self, Read, Write},
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::{
    Amount, ExpenseRecord, IncomeRecord, LoadError,
    table::{
        COL_ACTUALS, COL_CATEGORY, COL_DUE_DATE, COL_EXPECTED, COL_MONTHLY_INCOME, COL_NAME,
        COL_PAID, COL_PAYMENT_DATE, COL_SUBCATEGORY, COLUMNS, REQUIRED_COLUMNS, Row, Table, aligned,
    },
    util::{format_date_cell, parse_bool_cell, parse_date_cell, today},
};

/// Reads and writes a whole [`Table`].
pub trait TableCodec {
    fn read(&self, reader: &mut dyn Read) -> Result<Table, LoadError>;
    fn write(&self, table: &Table, writer: &mut dyn Write) -> io::Result<()>;
}

/// Comma separated sheet with a header row.
#[derive(Clone, Copy, Debug)]
pub struct CsvCodec {
    delimiter: u8,
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvCodec {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

/// Header positions resolved once per read.
struct Layout {
    known: HashMap<&'static str, usize>,
    extras: Vec<usize>,
}

impl Layout {
    fn resolve(headers: &StringRecord) -> Result<(Self, Vec<String>), LoadError> {
        let mut known = HashMap::new();
        let mut extras = Vec::new();
        let mut extra_columns = Vec::new();

        for (index, header) in headers.iter().enumerate() {
            let trimmed = header.trim();
            match COLUMNS.iter().find(|column| **column == trimmed) {
                Some(column) if !known.contains_key(column) => {
                    known.insert(*column, index);
                }
                _ => {
                    extras.push(index);
                    extra_columns.push(header.to_string());
                }
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !known.contains_key(*column))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        Ok((Self { known, extras }, extra_columns))
    }

    fn has(&self, column: &str) -> bool {
        self.known.contains_key(column)
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.known
            .get(column)
            .and_then(|index| record.get(*index))
            .unwrap_or("")
            .trim()
    }
}

impl TableCodec for CsvCodec {
    fn read(&self, reader: &mut dyn Read) -> Result<Table, LoadError> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let (layout, extra_columns) = Layout::resolve(&headers)?;
        let fallback = today();

        let mut rows = Vec::new();
        for (index, result) in csv_reader.records().enumerate() {
            let record = result?;
            // Header is line 1.
            let line = index + 2;
            let malformed = |message: String| LoadError::Malformed { row: line, message };

            let extras = layout
                .extras
                .iter()
                .map(|position| record.get(*position).unwrap_or("").to_string())
                .collect();

            let name = layout.cell(&record, COL_NAME);
            let income_cell = layout.cell(&record, COL_MONTHLY_INCOME);
            let category = layout.cell(&record, COL_CATEGORY);
            let subcategory = layout.cell(&record, COL_SUBCATEGORY);
            let payment_date =
                parse_date_cell(layout.cell(&record, COL_PAYMENT_DATE)).map_err(malformed)?;

            let expense = if category.is_empty() {
                if !subcategory.is_empty() {
                    tracing::warn!(row = line, "subcategory '{subcategory}' without category ignored");
                }
                for column in [COL_EXPECTED, COL_ACTUALS, COL_DUE_DATE] {
                    let value = layout.cell(&record, column);
                    if !value.is_empty() {
                        tracing::warn!(row = line, "{column} '{value}' without category ignored");
                    }
                }
                None
            } else {
                let expected = parse_amount_cell(layout.cell(&record, COL_EXPECTED), COL_EXPECTED)
                    .map_err(malformed)?;
                let actual = parse_amount_cell(layout.cell(&record, COL_ACTUALS), COL_ACTUALS)
                    .map_err(malformed)?;
                let due_date =
                    parse_date_cell(layout.cell(&record, COL_DUE_DATE)).map_err(malformed)?;
                // Sheets without a `Paid` column count a payment date as paid.
                let paid = if layout.has(COL_PAID) {
                    parse_bool_cell(layout.cell(&record, COL_PAID)).map_err(malformed)?
                } else {
                    payment_date.is_some()
                };

                let mut base = ExpenseRecord::new(
                    category.to_string(),
                    subcategory.to_string(),
                    expected,
                    actual,
                );
                base.due_date = due_date;
                Some(ExpenseRecord::from_stored(base, paid, payment_date, fallback))
            };

            let income = if name.is_empty() {
                if !income_cell.is_empty() {
                    tracing::warn!(row = line, "monthly income without a name ignored");
                }
                None
            } else {
                let monthly_income =
                    parse_amount_cell(income_cell, COL_MONTHLY_INCOME).map_err(malformed)?;
                let mut income = IncomeRecord::new(name.to_string(), monthly_income);
                // The payment date column belongs to the expense facet when
                // the row has one.
                if expense.is_none() {
                    income.last_updated = payment_date;
                }
                Some(income)
            };

            let row = Row {
                income,
                expense,
                extras,
            };
            if !row.is_empty() {
                rows.push(row);
            }
        }

        Ok(Table {
            extra_columns,
            rows,
        })
    }

    fn write(&self, table: &Table, writer: &mut dyn Write) -> io::Result<()> {
        let mut csv_writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        let header = COLUMNS
            .iter()
            .map(|column| column.to_string())
            .chain(table.extra_columns.iter().cloned());
        csv_writer.write_record(header)?;

        for row in &table.rows {
            let mut cells: Vec<String> = Vec::with_capacity(COLUMNS.len() + table.extra_columns.len());

            match &row.income {
                Some(income) => {
                    cells.push(income.individual.clone());
                    cells.push(income.monthly_income.to_decimal_string());
                }
                None => cells.extend([String::new(), String::new()]),
            }

            match &row.expense {
                Some(expense) => {
                    cells.push(expense.category.clone());
                    cells.push(expense.subcategory.clone());
                    cells.push(expense.expected.to_decimal_string());
                    cells.push(expense.actual.to_decimal_string());
                    cells.push(format_date_cell(expense.payment_date()));
                    cells.push(format_date_cell(expense.due_date));
                    cells.push(expense.is_paid().to_string());
                }
                None => {
                    cells.extend([String::new(), String::new(), String::new(), String::new()]);
                    cells.push(format_date_cell(
                        row.income.as_ref().and_then(|income| income.last_updated),
                    ));
                    cells.extend([String::new(), String::new()]);
                }
            }

            cells.extend(aligned(row.extras.clone(), table.extra_columns.len()));
            csv_writer.write_record(&cells)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn parse_amount_cell(value: &str, column: &str) -> Result<Amount, String> {
    if value.is_empty() {
        return Ok(Amount::ZERO);
    }
    Amount::parse_cell(value).map_err(|err| format!("{column}: {err}"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const SHEET: &str = "\
Name,Monthly Income,Unnamed: 2,Expense Category,Expense SubCategory,Expected,Actuals,Payment Date
Alice,3000,note a,Home,Rent,1200,1200,2025-03-01
Bob,2500.50,,Home,Power,80,95.20,
,,,Food,Groceries,400,,
,,keep me,,,,,
";

    fn read(sheet: &str) -> Result<Table, LoadError> {
        CsvCodec::default().read(&mut sheet.as_bytes())
    }

    #[test]
    fn reads_fused_rows_as_independent_facets() {
        let table = read(SHEET).unwrap();
        assert_eq!(table.extra_columns, vec!["Unnamed: 2".to_string()]);
        assert_eq!(table.rows.len(), 4);

        let names: Vec<&str> = table.individuals().map(|i| i.individual.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(table.individuals().nth(1).unwrap().monthly_income, Amount::new(250_050));

        let rent = table.expenses().next().unwrap();
        assert!(rent.is_paid());
        assert_eq!(rent.payment_date(), NaiveDate::from_ymd_opt(2025, 3, 1));

        let groceries = table.expenses().nth(2).unwrap();
        assert_eq!(groceries.actual, Amount::ZERO);
        assert!(!groceries.is_paid());

        assert!(table.rows[3].income.is_none() && table.rows[3].expense.is_none());
        assert_eq!(table.rows[3].extras, vec!["keep me".to_string()]);
    }

    #[test]
    fn missing_required_columns_are_reported() {
        let err = read("Name,Monthly Income,Expected\nA,1,2\n").unwrap_err();
        match err {
            LoadError::MissingColumns(missing) => {
                assert_eq!(missing, vec![COL_CATEGORY, COL_SUBCATEGORY, COL_ACTUALS]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_cells_name_the_row() {
        let sheet = "Name,Monthly Income,Expense Category,Expense SubCategory,Expected,Actuals\n\
                     ,,Home,Rent,abc,0\n";
        match read(sheet).unwrap_err() {
            LoadError::Malformed { row, message } => {
                assert_eq!(row, 2);
                assert!(message.contains("Expected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn float_noise_in_amount_cells_is_rounded() {
        let sheet = "Name,Monthly Income,Expense Category,Expense SubCategory,Expected,Actuals\n\
                     Alice,3000.0,,,,\n\
                     ,,Food,Dining,100.0,95.19999999999999\n";
        let table = read(sheet).unwrap();

        let dining = table.expenses().next().unwrap();
        assert_eq!(dining.expected, Amount::new(10_000));
        assert_eq!(dining.actual, Amount::new(9_520));
        assert_eq!(
            table.individuals().next().unwrap().monthly_income,
            Amount::new(300_000)
        );
    }

    #[test]
    fn oversized_amount_names_the_row() {
        let sheet = "Name,Monthly Income,Expense Category,Expense SubCategory,Expected,Actuals\n\
                     A,50000000000000000,,,,\n";
        match read(sheet).unwrap_err() {
            LoadError::Malformed { row, message } => {
                assert_eq!(row, 2);
                assert!(message.contains("Monthly Income"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn amounts_without_category_are_skipped() {
        let sheet = "Name,Monthly Income,Expense Category,Expense SubCategory,Expected,Actuals\n\
                     ,,,,100,90\n\
                     ,,Home,Rent,1,1\n";
        let table = read(sheet).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.expenses().count(), 1);
    }

    #[test]
    fn write_then_read_keeps_records_and_extras() {
        let table = read(SHEET).unwrap();
        let mut buffer = Vec::new();
        CsvCodec::default().write(&table, &mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with(
            "Name,Monthly Income,Expense Category,Expense SubCategory,Expected,Actuals,Payment Date,Due Date,Paid,Unnamed: 2"
        ));

        let reread = CsvCodec::default().read(&mut buffer.as_slice()).unwrap();
        assert_eq!(reread, table);
    }
}
