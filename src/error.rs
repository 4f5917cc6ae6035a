use crate::outcome::ErrorKind;
use serde::Serialize;
use serde_json;
use std::error;
use std::fmt;

#[derive(Debug, Serialize, Clone)]
pub struct EtlError {
    pub msg: String,
    pub kind: ErrorKind,
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl error::Error for EtlError {}

impl EtlError {
    pub fn file_not_found<T: std::fmt::Display>(msg: T) -> EtlError {
        EtlError {
            msg: msg.to_string(),
            kind: ErrorKind::FileNotFound,
        }
    }

    pub fn parse_error<T: std::fmt::Display>(msg: T) -> EtlError {
        EtlError {
            msg: msg.to_string(),
            kind: ErrorKind::Parse,
        }
    }

    pub fn schema_error<T: std::fmt::Display>(msg: T) -> EtlError {
        EtlError {
            msg: msg.to_string(),
            kind: ErrorKind::Schema,
        }
    }

    pub fn format_error<T: std::fmt::Display>(msg: T) -> EtlError {
        EtlError {
            msg: msg.to_string(),
            kind: ErrorKind::Format,
        }
    }

    pub fn store_write_error<T: std::fmt::Display>(msg: T) -> EtlError {
        EtlError {
            msg: msg.to_string(),
            kind: ErrorKind::StoreWrite,
        }
    }
}
