pub mod dto;
pub mod error;
pub mod outcome;
pub mod util;
