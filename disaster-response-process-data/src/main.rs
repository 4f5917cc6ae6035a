mod clean;
mod load;
mod util;

use disaster_response_etl::dto::PipelineConfig;
use disaster_response_etl::error::EtlError;
use disaster_response_etl::outcome::{make_exit_code, RunSummary};
use std::env;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;

const USAGE: &str = "Please provide the filepaths of the messages and categories \
datasets as the first and second argument respectively, as \
well as the filepath of the database to save the cleaned data \
to as the third argument. \n\nExample: process_data \
disaster_messages.csv disaster_categories.csv \
DisasterResponse.db";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [messages, categories, database] => {
            let config = PipelineConfig::new(messages, categories, database);
            make_exit_code(process(config))
        }
        _ => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
    }
}

fn process(config: PipelineConfig) -> Result<RunSummary, EtlError> {
    println!(
        "Loading data...\n    MESSAGES: {}\n    CATEGORIES: {}",
        config.messages_path.display(),
        config.categories_path.display()
    );
    let start = Instant::now();
    let (messages, categories) = util::pull_data_files(&config)?;
    let joined = load::inner_join(&messages, &categories, &config.key_column)?;
    info!(
        "Joined {} rows in {:.4} secs",
        joined.len(),
        start.elapsed().as_secs_f64()
    );
    let joined_rows = joined.len();

    println!("Cleaning data...");
    let start = Instant::now();
    let cleaned = clean::clean(joined, &config.categories_column)?;
    info!(
        "Cleaned {} rows into {} category columns in {:.4} secs",
        cleaned.table.len(),
        cleaned.category_columns.len(),
        start.elapsed().as_secs_f64()
    );

    println!(
        "Saving data...\n    DATABASE: {}",
        config.database_path.display()
    );
    let start = Instant::now();
    util::push_result_table(&config, &cleaned.table)?;
    info!("Saved in {:.4} secs", start.elapsed().as_secs_f64());

    println!("Cleaned data saved to database!");
    Ok(RunSummary {
        output_rows: cleaned.table.len(),
        duplicates_removed: cleaned.duplicates_removed,
        category_columns: cleaned.category_columns,
        joined_rows,
        config,
    })
}
