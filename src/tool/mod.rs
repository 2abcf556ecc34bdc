pub mod ast_checker;
pub mod bfcl_formats;
pub mod category;
pub mod decoder;
pub mod error_analysis;
pub mod exec;
pub mod file_models;
pub mod id_mapper;
pub mod literal;
pub mod response;
pub mod runner;
pub mod tool_calls;
