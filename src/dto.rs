use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_TABLE_NAME: &str = "LabeledMessages";
pub const DEFAULT_KEY_COLUMN: &str = "id";
pub const DEFAULT_CATEGORIES_COLUMN: &str = "categories";

/// What to do when the destination table is already present in the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IfExists {
    #[default]
    Fail,
    Replace,
    Append,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub messages_path: PathBuf,
    pub categories_path: PathBuf,
    pub database_path: PathBuf,
    pub table_name: String,
    pub key_column: String,
    pub categories_column: String,
    pub if_exists: IfExists,
}

impl PipelineConfig {
    pub fn new(
        messages_path: impl Into<PathBuf>,
        categories_path: impl Into<PathBuf>,
        database_path: impl Into<PathBuf>,
    ) -> Self {
        PipelineConfig {
            messages_path: messages_path.into(),
            categories_path: categories_path.into(),
            database_path: database_path.into(),
            table_name: String::from(DEFAULT_TABLE_NAME),
            key_column: String::from(DEFAULT_KEY_COLUMN),
            categories_column: String::from(DEFAULT_CATEGORIES_COLUMN),
            if_exists: IfExists::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Null,
    Integer(i64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Cell::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Cell::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

/// In-memory row-major table passed between pipeline stages.
///
/// Every row holds exactly one cell per column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from raw text fields, inferring each column's type.
    ///
    /// A column is integer-typed when all of its non-empty fields parse as
    /// `i64` and at least one is present. Empty fields become `Cell::Null`.
    pub fn from_text_rows(headers: Vec<String>, raw_rows: Vec<Vec<String>>) -> Self {
        let kinds: Vec<ColumnType> = (0..headers.len())
            .map(|idx| {
                let mut fields = raw_rows
                    .iter()
                    .map(|row| row[idx].as_str())
                    .filter(|field| !field.is_empty())
                    .peekable();
                if fields.peek().is_some() && fields.all(|field| field.parse::<i64>().is_ok()) {
                    ColumnType::Integer
                } else {
                    ColumnType::Text
                }
            })
            .collect();
        let rows = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&kinds)
                    .map(|(field, kind)| match (field.is_empty(), kind) {
                        (true, _) => Cell::Null,
                        (false, ColumnType::Integer) => {
                            field.parse().map(Cell::Integer).unwrap_or(Cell::Text(field))
                        }
                        (false, ColumnType::Text) => Cell::Text(field),
                    })
                    .collect()
            })
            .collect();
        let columns = headers
            .into_iter()
            .zip(kinds)
            .map(|(name, kind)| Column { name, kind })
            .collect();
        Table { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Iterates over the cells of the column at `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn infers_integer_and_text_columns() {
        let table = Table::from_text_rows(
            strings(&["id", "message", "original"]),
            vec![strings(&["2", "Weather update", ""]), strings(&["7", "Help", "Aidez"])],
        );
        assert_eq!(table.columns[0].kind, ColumnType::Integer);
        assert_eq!(table.columns[1].kind, ColumnType::Text);
        assert_eq!(table.columns[2].kind, ColumnType::Text);
        assert_eq!(table.rows[0][0], Cell::Integer(2));
        assert_eq!(table.rows[0][2], Cell::Null);
        assert_eq!(table.rows[1][2], Cell::Text(String::from("Aidez")));
    }

    #[test]
    fn mixed_column_stays_text() {
        let table = Table::from_text_rows(
            strings(&["id"]),
            vec![strings(&["12"]), strings(&["12a"])],
        );
        assert_eq!(table.columns[0].kind, ColumnType::Text);
        assert_eq!(table.rows[0][0], Cell::Text(String::from("12")));
    }

    #[test]
    fn all_empty_column_is_text() {
        let table = Table::from_text_rows(strings(&["original"]), vec![strings(&[""])]);
        assert_eq!(table.columns[0].kind, ColumnType::Text);
        assert!(table.rows[0][0].is_null());
    }

    #[test]
    fn default_config_targets_labeled_messages() {
        let config = PipelineConfig::new("m.csv", "c.csv", "out.db");
        assert_eq!(config.table_name, "LabeledMessages");
        assert_eq!(config.key_column, "id");
        assert_eq!(config.categories_column, "categories");
        assert_eq!(config.if_exists, IfExists::Fail);
    }
}
