//! Staging: load a CSV file, clean it, filter it, edit it and export it again.
//!
//! The pipeline is a chain of pure functions:
//! [`ingest`] parses text into an all-string [`table::Table`],
//! [`sanitize`] cleans it and records what it dropped,
//! [`filter`] narrows it down to one column value and
//! [`export`] writes it back out. [`session::Session`] ties the stages
//! together for one user and only recomputes what a change invalidates.
//! The remaining modules are the terminal front end.

pub mod controller;
pub mod domain;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod inputter;
pub mod model;
pub mod sample;
pub mod sanitize;
pub mod session;
pub mod table;
pub mod ui;

pub use domain::{StagingConfig, StagingError};
pub use filter::FilterSelection;
pub use sanitize::{AuditLog, Sanitized, sanitize};
pub use session::Session;
pub use table::{Cell, Row, Table};
