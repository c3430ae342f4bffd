//! vkrun — compile a declarative task manifest into a plan of Vibe Kanban
//! operations and execute it over the MCP stdio protocol.
//!
//! The pipeline is validate → plan → execute → report. Validation, planning,
//! and reporting are pure; the MCP transport is the only component that
//! crosses a process boundary.

pub mod cli;
pub mod core;
pub mod io;
pub mod transport;
