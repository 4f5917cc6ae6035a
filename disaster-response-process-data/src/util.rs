use disaster_response_etl::dto::{PipelineConfig, Table};
use disaster_response_etl::error::EtlError;
use disaster_response_etl::util::{open_store, read_csv_table, write_table};
use tracing::info;

/// Reads the messages and categories files named by `config`.
pub fn pull_data_files(config: &PipelineConfig) -> Result<(Table, Table), EtlError> {
    let messages = read_csv_table(&config.messages_path)?;
    info!(
        "Read {} messages with columns {:?}",
        messages.len(),
        messages.column_names()
    );
    let categories = read_csv_table(&config.categories_path)?;
    info!(
        "Read {} category rows with columns {:?}",
        categories.len(),
        categories.column_names()
    );
    Ok((messages, categories))
}

/// Persists the cleaned table into the store at `config.database_path`.
pub fn push_result_table(config: &PipelineConfig, table: &Table) -> Result<usize, EtlError> {
    let mut conn = open_store(&config.database_path)?;
    let written = write_table(&mut conn, table, &config.table_name, config.if_exists)?;
    info!("Wrote {written} rows to table '{}'", config.table_name);
    Ok(written)
}
