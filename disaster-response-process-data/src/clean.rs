use disaster_response_etl::dto::{Cell, Column, ColumnType, Table};
use disaster_response_etl::error::EtlError;
use rustc_hash::FxHashSet;
use tracing::debug;

const TOKEN_SEPARATOR: char = ';';

///
/// Category names and order sampled from the first row's encoded field.
/// Every other row must carry the same names in the same order. Names are
/// unique ignoring ASCII case, as SQLite column names are.
///
#[derive(Debug, PartialEq, Eq)]
pub struct CategorySchema {
    names: Vec<String>,
}

impl CategorySchema {
    ///
    /// Derives the schema from the tokens of one encoded field.
    ///
    /// ## Arguments
    ///
    /// * `encoded` - A `;`-joined list of `<name>-<digit>` tokens.
    ///
    pub fn from_encoded(encoded: &str) -> Result<Self, EtlError> {
        let names: Vec<String> = split_encoded(encoded)
            .map(|token| split_token(token).map(|(name, _)| name.to_string()))
            .collect::<Result<_, _>>()?;
        let mut seen = FxHashSet::default();
        if let Some(dup) = names
            .iter()
            .find(|name| !seen.insert(name.to_ascii_lowercase()))
        {
            return Err(EtlError::schema_error(format!(
                "category '{dup}' appears more than once"
            )));
        }
        Ok(CategorySchema { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    ///
    /// Extracts one value per category from an encoded field, checking that
    /// its tokens line up with this schema.
    ///
    /// ## Arguments
    ///
    /// * `encoded` - The encoded field of the row being decoded.
    /// * `row` - Position of that row, for error reporting.
    ///
    pub fn decode(&self, encoded: &str, row: usize) -> Result<Vec<i64>, EtlError> {
        let tokens: Vec<&str> = split_encoded(encoded).collect();
        if tokens.len() != self.names.len() {
            return Err(EtlError::schema_error(format!(
                "row {row} has {} category tokens, expected {}",
                tokens.len(),
                self.names.len()
            )));
        }
        tokens
            .into_iter()
            .zip(&self.names)
            .map(|(token, expected)| {
                let (name, value) = split_token(token)?;
                if name != expected {
                    return Err(EtlError::schema_error(format!(
                        "row {row} has category '{name}' where '{expected}' was expected"
                    )));
                }
                Ok(value)
            })
            .collect()
    }
}

fn split_encoded(encoded: &str) -> impl Iterator<Item = &str> {
    encoded.split(TOKEN_SEPARATOR)
}

/// Splits `<name>-<digit>` into its name and digit value.
fn split_token(token: &str) -> Result<(&str, i64), EtlError> {
    let mut chars = token.char_indices().rev();
    match (chars.next(), chars.next()) {
        (Some((_, digit)), Some((dash, '-'))) if dash > 0 => match digit.to_digit(10) {
            Some(value) => Ok((&token[..dash], i64::from(value))),
            None => Err(malformed(token)),
        },
        _ => Err(malformed(token)),
    }
}

fn malformed(token: &str) -> EtlError {
    EtlError::format_error(format!(
        "category token '{token}' is not of the form <name>-<digit>"
    ))
}

pub struct Cleaned {
    pub table: Table,
    pub category_columns: Vec<String>,
    pub duplicates_removed: usize,
}

///
/// Decodes the encoded category column into one integer column per
/// category, drops the encoded column and removes duplicate rows.
///
/// ## Arguments
///
/// * `joined` - The joined messages and categories.
/// * `categories_column` - Name of the encoded column.
///
pub fn clean(joined: Table, categories_column: &str) -> Result<Cleaned, EtlError> {
    let (decoded, category_columns) = decode_categories(joined, categories_column)?;
    let before = decoded.len();
    let table = drop_duplicates(decoded);
    let duplicates_removed = before - table.len();
    debug!("Removed {duplicates_removed} duplicate rows");
    Ok(Cleaned {
        table,
        category_columns,
        duplicates_removed,
    })
}

/// Replaces the encoded column with the decoded category columns, appended
/// after the remaining columns in schema order. Returns the decoded table and
/// the category names.
pub fn decode_categories(
    table: Table,
    categories_column: &str,
) -> Result<(Table, Vec<String>), EtlError> {
    let encoded_idx = table.column_index(categories_column).ok_or_else(|| {
        EtlError::schema_error(format!("joined data has no column '{categories_column}'"))
    })?;
    let encoded: Vec<&str> = table
        .column(encoded_idx)
        .enumerate()
        .map(|(row, cell)| encoded_text(cell, row))
        .collect::<Result<_, _>>()?;

    let schema = match encoded.first() {
        Some(first) => CategorySchema::from_encoded(first)?,
        None => CategorySchema { names: Vec::new() },
    };
    debug!("Category schema: {:?}", schema.names());

    let mut columns: Vec<Column> = table
        .columns
        .iter()
        .enumerate()
        .filter(|&(idx, _)| idx != encoded_idx)
        .map(|(_, c)| c.clone())
        .collect();
    for name in schema.names() {
        if columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(EtlError::schema_error(format!(
                "category '{name}' collides with an existing column"
            )));
        }
        columns.push(Column::new(name.clone(), ColumnType::Integer));
    }

    // Validate every row before building any output.
    let values = encoded
        .iter()
        .enumerate()
        .map(|(row, field)| schema.decode(field, row))
        .collect::<Result<Vec<_>, _>>()?;
    let non_binary = values.iter().flatten().filter(|&&v| v > 1).count();
    if non_binary > 0 {
        debug!("{non_binary} category values are outside {{0, 1}} and kept as-is");
    }

    let mut decoded = Table::new(columns);
    for (mut row, row_values) in table.rows.into_iter().zip(values) {
        row.remove(encoded_idx);
        row.extend(row_values.into_iter().map(Cell::Integer));
        decoded.push_row(row);
    }
    Ok((decoded, schema.names))
}

fn encoded_text(cell: &Cell, row: usize) -> Result<&str, EtlError> {
    cell.as_text().ok_or_else(|| {
        EtlError::format_error(format!("row {row} has no encoded categories (found {cell})"))
    })
}

/// Removes rows equal across all columns to an earlier row, keeping order.
pub fn drop_duplicates(table: Table) -> Table {
    let Table { columns, rows } = table;
    let mut seen: FxHashSet<Vec<Cell>> = FxHashSet::default();
    let rows = rows
        .into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect();
    Table { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disaster_response_etl::outcome::ErrorKind;

    fn joined(rows: &[(&str, &str, &str)]) -> Table {
        Table::from_text_rows(
            vec![
                String::from("id"),
                String::from("message"),
                String::from("categories"),
            ],
            rows.iter()
                .map(|(id, message, cats)| vec![id.to_string(), message.to_string(), cats.to_string()])
                .collect(),
        )
    }

    #[test]
    fn decodes_single_row() {
        let cleaned = clean(joined(&[("1", "Flood", "related-1;offer-0")]), "categories").unwrap();
        assert_eq!(
            cleaned.table.column_names(),
            vec!["id", "message", "related", "offer"]
        );
        assert_eq!(
            cleaned.table.rows,
            vec![vec![
                Cell::Integer(1),
                Cell::Text(String::from("Flood")),
                Cell::Integer(1),
                Cell::Integer(0),
            ]]
        );
        assert_eq!(cleaned.category_columns, vec!["related", "offer"]);
    }

    #[test]
    fn first_row_order_drives_column_order() {
        let (table, names) = decode_categories(
            joined(&[("1", "a", "offer-0;related-1")]),
            "categories",
        )
        .unwrap();
        assert_eq!(table.column_names(), vec!["id", "message", "offer", "related"]);
        assert_eq!(names, vec!["offer", "related"]);
    }

    #[test]
    fn keeps_non_binary_digits() {
        let (table, _) = decode_categories(
            joined(&[("1", "a", "related-2;offer-0")]),
            "categories",
        )
        .unwrap();
        assert_eq!(table.rows[0][2], Cell::Integer(2));
    }

    #[test]
    fn names_may_contain_hyphens_and_underscores() {
        let schema = CategorySchema::from_encoded("aid_related-1;search-and-rescue-0").unwrap();
        assert_eq!(schema.names(), ["aid_related", "search-and-rescue"]);
    }

    #[test]
    fn token_count_mismatch_is_schema_error() {
        let err = decode_categories(
            joined(&[("1", "a", "related-1;offer-0"), ("2", "b", "related-1")]),
            "categories",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
        assert!(err.msg.contains("row 1"));
    }

    #[test]
    fn token_order_mismatch_is_schema_error() {
        let err = decode_categories(
            joined(&[("1", "a", "related-1;offer-0"), ("2", "b", "offer-0;related-1")]),
            "categories",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn malformed_tokens_are_format_errors() {
        for bad in ["related", "related-x", "-1", "related1", ""] {
            let err = decode_categories(joined(&[("1", "a", bad)]), "categories").unwrap_err();
            assert_eq!(err.kind, ErrorKind::Format, "token {bad:?}");
        }
    }

    #[test]
    fn duplicate_category_names_are_schema_errors() {
        let err = CategorySchema::from_encoded("related-1;related-0").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn category_named_like_existing_column_is_schema_error() {
        let err = decode_categories(joined(&[("1", "a", "message-1")]), "categories")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn name_checks_ignore_ascii_case() {
        let err = CategorySchema::from_encoded("related-1;Related-0").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);

        let err = decode_categories(joined(&[("1", "a", "Message-1")]), "categories")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn missing_encoded_column_is_schema_error() {
        let err = decode_categories(joined(&[("1", "a", "related-1")]), "labels").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }

    #[test]
    fn empty_input_drops_encoded_column() {
        let cleaned = clean(joined(&[]), "categories").unwrap();
        assert_eq!(cleaned.table.column_names(), vec!["id", "message"]);
        assert!(cleaned.table.is_empty());
        assert!(cleaned.category_columns.is_empty());
    }

    #[test]
    fn removes_exact_duplicates_only() {
        let cleaned = clean(
            joined(&[
                ("1", "Flood", "related-1;offer-0"),
                ("1", "Flood", "related-1;offer-0"),
                ("1", "Flood", "related-1;offer-1"),
            ]),
            "categories",
        )
        .unwrap();
        assert_eq!(cleaned.table.len(), 2);
        assert_eq!(cleaned.duplicates_removed, 1);
        assert_eq!(cleaned.table.rows[1][3], Cell::Integer(1));
    }

    #[test]
    fn redecoding_is_stable() {
        let schema = CategorySchema::from_encoded("related-1;offer-0;aid-2").unwrap();
        let first = schema.decode("related-1;offer-0;aid-2", 0).unwrap();
        let second = schema.decode("related-1;offer-0;aid-2", 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![1, 0, 2]);
    }
}
