mod api;
pub mod args;
mod bot;
mod cache;
pub mod commands;
mod config;
mod error;
mod ledger;
pub mod model;
mod retry;


pub use api::Mode;
pub use config::{Config, Credentials, Secret};
pub use error::{Error, ErrorType, LedgerError, Result};
