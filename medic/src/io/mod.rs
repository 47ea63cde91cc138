//! I/O helpers for medic commands.

pub mod actions;
pub mod attempt_store;
pub mod classify;
pub mod config;
pub mod context_doc;
pub mod decision_doc;
pub mod env;
pub mod fix_brief;
pub mod paths;
pub mod process;
pub mod report_doc;
