//! Core pipeline — manifest types, validation, planning, execution, reporting.

pub mod executor;
pub mod parser;
pub mod planner;
pub mod report;
pub mod types;
