//! One module per top-level subcommand. Each exposes `execute`.

pub mod audit_cmd;
pub mod category;
pub mod completions;
pub mod config_cmd;
pub mod file;
pub mod note;
pub mod password;
pub mod totp;
pub mod vault_cmd;
