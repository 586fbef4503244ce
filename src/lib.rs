pub mod audit;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod locker;
pub mod registry;
pub mod session;
pub mod totp;
pub mod vault;
pub mod workspace;
