// Game engine and storage, shared by the binary and the integration tests.
// Terminal rendering stays in the binary.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod hint;
pub mod ledger;
pub mod profile;
pub mod runtime;
pub mod score;
pub mod session;
pub mod stats;
pub mod words;

pub use error::{GameError, Result};
pub use session::{Session, Status};
