use serde::Serialize;
use std::process::ExitCode;
use tracing::info;

use crate::dto::PipelineConfig;
use crate::error::EtlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    Parse,
    Schema,
    Format,
    StoreWrite,
}

impl ErrorKind {
    /// Process exit status reported for a run failing with this kind.
    pub fn code(&self) -> u8 {
        match self {
            ErrorKind::FileNotFound => 2,
            ErrorKind::Parse => 3,
            ErrorKind::Schema => 4,
            ErrorKind::Format => 5,
            ErrorKind::StoreWrite => 6,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Format => "FormatError",
            ErrorKind::StoreWrite => "StoreWriteError",
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    #[serde(flatten)]
    pub config: PipelineConfig,
    pub joined_rows: usize,
    pub output_rows: usize,
    pub duplicates_removed: usize,
    pub category_columns: Vec<String>,
}

/// Reports the outcome of a pipeline run and maps it to the process exit status.
///
/// Successful runs log their summary as JSON and exit with 0. Failed runs
/// print the error payload to stderr and exit with the kind's code.
pub fn make_exit_code(result: Result<RunSummary, EtlError>) -> ExitCode {
    match result {
        Ok(summary) => {
            match serde_json::to_string(&summary) {
                Ok(json) => info!(summary = %json, "run complete"),
                Err(err) => info!("run complete (summary unavailable: {err})"),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.kind.code())
        }
    }
}
