pub mod cache;
pub mod commands;
pub mod contracts;
pub mod engine;
pub mod error;
pub mod home;
mod input;
pub mod ledger;
pub mod migrations;
pub mod settings;
pub mod setup;
pub mod store;

pub use cache::ResponseCache;
pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
