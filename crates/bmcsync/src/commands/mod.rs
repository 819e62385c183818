//! Command handlers, one module per top-level subcommand.

pub mod apply;
pub mod bios;
pub mod config_cmd;
pub mod power;
pub mod util;
