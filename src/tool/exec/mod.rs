pub mod call_expr;
pub mod checker;
pub mod registry;
pub mod rest;
pub mod sanity;
