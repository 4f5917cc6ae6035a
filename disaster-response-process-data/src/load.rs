use disaster_response_etl::dto::{Cell, Column, Table};
use disaster_response_etl::error::EtlError;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Inner-joins `messages` with `categories` on the column `key`.
///
/// Output columns are every messages column followed by the categories
/// columns other than the key. A non-key name present on both sides is
/// suffixed `_x` (messages) and `_y` (categories). Rows follow messages
/// order; a key repeated on either side yields the cross product of its
/// matches. Null keys never match, so a key column without any value joins
/// to nothing whatever type it was read as.
pub fn inner_join(messages: &Table, categories: &Table, key: &str) -> Result<Table, EtlError> {
    let left_key = key_index(messages, key, "messages")?;
    let right_key = key_index(categories, key, "categories")?;
    let (left_kind, right_kind) = (
        messages.columns[left_key].kind,
        categories.columns[right_key].kind,
    );
    let has_keys = |table: &Table, idx: usize| table.column(idx).any(|cell| !cell.is_null());
    if left_kind != right_kind && has_keys(messages, left_key) && has_keys(categories, right_key) {
        return Err(EtlError::schema_error(format!(
            "cannot join on '{key}': messages column is {left_kind:?} but categories column is {right_kind:?}"
        )));
    }

    let right_columns: Vec<usize> = (0..categories.columns.len())
        .filter(|&idx| idx != right_key)
        .collect();
    let mut joined = Table::new(joined_columns(messages, categories, left_key, &right_columns));

    let mut index: FxHashMap<&Cell, Vec<usize>> = FxHashMap::default();
    for (row_idx, cell) in categories.column(right_key).enumerate() {
        if !cell.is_null() {
            index.entry(cell).or_insert_with(Vec::new).push(row_idx);
        }
    }

    let mut unmatched = 0usize;
    for left in &messages.rows {
        let Some(matches) = index.get(&left[left_key]) else {
            unmatched += 1;
            continue;
        };
        for &right_idx in matches {
            let right = &categories.rows[right_idx];
            let mut row = left.clone();
            row.extend(right_columns.iter().map(|&idx| right[idx].clone()));
            joined.push_row(row);
        }
    }
    debug!(
        "Joined {} rows; {} messages had no categories",
        joined.len(),
        unmatched
    );
    Ok(joined)
}

fn key_index(table: &Table, key: &str, side: &str) -> Result<usize, EtlError> {
    table.column_index(key).ok_or_else(|| {
        EtlError::schema_error(format!("{side} file must contain column '{key}'"))
    })
}

fn joined_columns(
    messages: &Table,
    categories: &Table,
    left_key: usize,
    right_columns: &[usize],
) -> Vec<Column> {
    let shared = |name: &str| {
        right_columns
            .iter()
            .any(|&idx| categories.columns[idx].name == name)
    };
    let left = messages.columns.iter().enumerate().map(|(idx, c)| {
        if idx != left_key && shared(&c.name) {
            Column::new(format!("{}_x", c.name), c.kind)
        } else {
            c.clone()
        }
    });
    let right = right_columns.iter().map(|&idx| {
        let c = &categories.columns[idx];
        if messages.column_index(&c.name).is_some() {
            Column::new(format!("{}_y", c.name), c.kind)
        } else {
            c.clone()
        }
    });
    left.chain(right).collect()
}
