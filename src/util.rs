use crate::dto::{IfExists, Table};
use crate::error::EtlError;
use csv::Reader;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Transaction};
use std::io;
use std::path::Path;

/// Reads a comma-separated file with a header row into a typed [`Table`].
pub fn read_csv_table(path: &Path) -> Result<Table, EtlError> {
    let mut reader = Reader::from_path(path).map_err(|err| csv_error(path, err))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| csv_error(path, err))?
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|record| match record {
            Ok(rec) => Ok(rec.iter().map(String::from).collect()),
            Err(err) => Err(csv_error(path, err)),
        })
        .collect::<Result<Vec<Vec<String>>, EtlError>>()?;
    Ok(Table::from_text_rows(headers, rows))
}

fn csv_error(path: &Path, err: csv::Error) -> EtlError {
    let msg = format!("{}: {}", path.display(), err);
    match err.kind() {
        csv::ErrorKind::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            EtlError::file_not_found(msg)
        }
        _ => EtlError::parse_error(msg),
    }
}

pub fn open_store(path: &Path) -> Result<Connection, EtlError> {
    Connection::open(path)
        .map_err(|err| EtlError::store_write_error(format!("{}: {}", path.display(), err)))
}

/// Writes `table` into the relation `name`, honoring `if_exists`.
///
/// Table creation and every insert share one transaction, so a failed write
/// leaves the store as it was.
pub fn write_table(
    conn: &mut Connection,
    table: &Table,
    name: &str,
    if_exists: IfExists,
) -> Result<usize, EtlError> {
    let tx = conn.transaction().map_err(EtlError::store_write_error)?;
    let exists = table_exists(&tx, name)?;
    match (exists, if_exists) {
        (true, IfExists::Fail) => {
            return Err(EtlError::store_write_error(format!(
                "table '{name}' already exists"
            )))
        }
        (true, IfExists::Replace) => {
            tx.execute_batch(&format!("DROP TABLE {};", quote_ident(name)))
                .map_err(EtlError::store_write_error)?;
            create_table(&tx, table, name)?;
        }
        (true, IfExists::Append) => {}
        (false, _) => create_table(&tx, table, name)?,
    }
    let written = insert_rows(&tx, table, name)?;
    tx.commit().map_err(EtlError::store_write_error)?;
    Ok(written)
}

fn table_exists(tx: &Transaction, name: &str) -> Result<bool, EtlError> {
    tx.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(EtlError::store_write_error)
}

fn create_table(tx: &Transaction, table: &Table, name: &str) -> Result<(), EtlError> {
    let columns = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.kind.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute_batch(&format!("CREATE TABLE {} ({columns});", quote_ident(name)))
        .map_err(EtlError::store_write_error)
}

fn insert_rows(tx: &Transaction, table: &Table, name: &str) -> Result<usize, EtlError> {
    let columns = table
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        quote_ident(name)
    );
    let mut stmt = tx.prepare(&sql).map_err(EtlError::store_write_error)?;
    for row in &table.rows {
        stmt.execute(params_from_iter(row.iter()))
            .map_err(EtlError::store_write_error)?;
    }
    Ok(table.len())
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
