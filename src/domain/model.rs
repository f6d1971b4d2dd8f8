use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// One team-season row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.data.get(column).and_then(Value::as_f64)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.data.get(column).and_then(Value::as_str)
    }

    /// The cell as it would appear in a CSV file.
    pub fn display(&self, column: &str) -> String {
        self.data.get(column).map(cell_to_string).unwrap_or_default()
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.data.insert(column.into(), value);
    }

    pub fn set_number(&mut self, column: impl Into<String>, value: f64) {
        self.data.insert(column.into(), Value::from(value));
    }

    fn is_missing(&self, column: &str) -> bool {
        matches!(self.data.get(column), None | Some(Value::Null))
    }
}

/// Parse a raw CSV cell: empty and NaN become missing, numbers are typed,
/// everything else stays text.
pub fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        // serde_json maps non-finite floats to Null
        return Value::from(f);
    }
    Value::String(raw.to_string())
}

pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Rows plus an explicit column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn from_records(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.records.len(), self.columns.len())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> Result<()> {
        for column in columns {
            if !self.has_column(column.as_ref()) {
                return Err(EtlError::missing_column(column.as_ref()));
            }
        }
        Ok(())
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let mut columns: Vec<String> = Vec::new();
        for header in reader.headers()?.iter() {
            let mut name = header.to_string();
            let mut suffix = 1;
            while columns.contains(&name) {
                name = format!("{}.{}", header, suffix);
                suffix += 1;
            }
            columns.push(name);
        }

        let mut table = Table::new(columns);
        for (row_index, row) in reader.records().enumerate() {
            let row = row?;
            if row.len() > table.columns.len() {
                return Err(EtlError::processing(format!(
                    "row {} has {} fields but the header has {}",
                    row_index + 1,
                    row.len(),
                    table.columns.len()
                )));
            }
            let mut record = Record::new();
            for (i, column) in table.columns.iter().enumerate() {
                let value = row.get(i).map(parse_cell).unwrap_or(Value::Null);
                record.set(column.clone(), value);
            }
            table.push(record);
        }

        Ok(table)
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for record in &self.records {
            writer.write_record(self.columns.iter().map(|c| record.display(c)))?;
        }
        writer
            .into_inner()
            .map_err(|e| EtlError::IoError(e.into_error()))
    }

    /// Stack tables; columns are the union in first-seen order.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut combined = Table::new(columns);
        for table in tables {
            for mut record in table.records {
                for column in &combined.columns {
                    record
                        .data
                        .entry(column.clone())
                        .or_insert(Value::Null);
                }
                combined.push(record);
            }
        }
        combined
    }

    pub fn rename_columns(&mut self, mapping: &BTreeMap<String, String>) {
        let renamed: Vec<String> = self
            .columns
            .iter()
            .map(|c| mapping.get(c).cloned().unwrap_or_else(|| c.clone()))
            .collect();

        for record in &mut self.records {
            let mut data = HashMap::with_capacity(record.data.len());
            for (old, new) in self.columns.iter().zip(&renamed) {
                if let Some(value) = record.data.remove(old) {
                    data.insert(new.clone(), value);
                }
            }
            data.extend(record.data.drain());
            record.data = data;
        }

        let mut seen = HashSet::new();
        self.columns = renamed
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();
    }

    pub fn fill_missing(&mut self, value: Value) {
        for record in &mut self.records {
            for column in &self.columns {
                if record.is_missing(column) {
                    record.set(column.clone(), value.clone());
                }
            }
        }
    }

    /// Turn text cells of the given columns into numbers; unparseable text
    /// becomes missing.
    pub fn coerce_numeric<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<()> {
        self.require_columns(columns)?;
        for record in &mut self.records {
            for column in columns {
                let column = column.as_ref();
                if let Some(Value::String(s)) = record.data.get(column) {
                    let parsed = match parse_cell(s) {
                        Value::String(_) => Value::Null,
                        number => number,
                    };
                    record.set(column, parsed);
                }
            }
        }
        Ok(())
    }

    pub fn trim_text(&mut self, column: &str) -> Result<()> {
        self.require_columns(&[column])?;
        for record in &mut self.records {
            if let Some(Value::String(s)) = record.data.get_mut(column) {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    *s = trimmed.to_string();
                }
            }
        }
        Ok(())
    }

    /// Remove exact duplicate rows, keeping the first occurrence. Numbers
    /// compare by value, so `80` and `80.0` are the same cell.
    pub fn drop_duplicates(&mut self) {
        let mut seen = HashSet::new();
        let columns = &self.columns;
        self.records.retain(|record| {
            let key: Vec<String> = columns
                .iter()
                .map(|c| match record.get(c) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::Number(n)) => format!("{:?}", n.as_f64().unwrap_or(f64::NAN)),
                    Some(other) => other.to_string(),
                })
                .collect();
            seen.insert(key)
        });
    }

    /// Stable descending sort on a numeric column, missing values last.
    pub fn sort_by_desc(&mut self, column: &str) {
        self.records
            .sort_by(|a, b| match (a.number(column), b.number(column)) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
    }

    /// Every value of the column as a number; missing or text is an error.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<f64>> {
        self.optional_numeric_column(column)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    EtlError::processing(format!("column '{}' is missing a value at row {}", column, row + 1))
                })
            })
            .collect()
    }

    /// Numbers with missing cells as `None`; text is an error.
    pub fn optional_numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>> {
        self.require_columns(&[column])?;
        self.records
            .iter()
            .enumerate()
            .map(|(row, record)| match record.get(column) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::Number(n)) => Ok(n.as_f64()),
                Some(other) => Err(EtlError::processing(format!(
                    "column '{}' has non-numeric value {} at row {}",
                    column,
                    other,
                    row + 1
                ))),
            })
            .collect()
    }

    /// Columns holding only numbers (and missing cells), at least one number.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| {
                let mut any_number = false;
                for record in &self.records {
                    match record.get(column) {
                        Some(Value::Number(_)) => any_number = true,
                        None | Some(Value::Null) => {}
                        Some(_) => return false,
                    }
                }
                any_number
            })
            .cloned()
            .collect()
    }

    pub fn add_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if values.len() != self.records.len() {
            return Err(EtlError::processing(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.records.len()
            )));
        }
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        for (record, value) in self.records.iter_mut().zip(values) {
            record.set(name, value);
        }
        Ok(())
    }

    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        self.require_columns(columns)?;
        let columns: Vec<String> = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let records = self
            .records
            .iter()
            .map(|record| {
                let mut selected = Record::new();
                for column in &columns {
                    selected.set(column.clone(), record.get(column).cloned().unwrap_or(Value::Null));
                }
                selected
            })
            .collect();
        Ok(Table::from_records(columns, records))
    }
}
