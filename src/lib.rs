pub mod config;
pub mod error;
pub mod single_or_list;
pub mod tool;
pub mod utils;

#[cfg(feature = "python")]
mod python;

pub use error::{GraderError, Result};
pub use tool::{response::Response, runner::Runner};
