//! Dataverse endpoint configuration store.
//!
//! Keeps the known dataverse servers, their aliases and API tokens, and the
//! currently selected server in a JSON file (`~/.dvn/dvn.json` by default).
//! Missing files are recreated with the public demo server; unreadable files
//! are only replaced after the operator confirms.

/// Operator confirmation sources.
pub mod confirm;
mod entry;
mod error;
mod paths;
mod store;

pub use confirm::{Confirm, FixedConfirm, PromptConfirm};
pub use entry::{DEMO_ALIAS, DEMO_DVN, Entry, Registry};
pub use error::ConfigError;
pub use paths::resolve_config_path;
pub use store::DvnConf;
