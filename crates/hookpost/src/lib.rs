//! Build chat notifications and post them to a webhook or chat API.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod payload;
pub mod transport;

pub use error::{BuildError, SendError};
pub use notifier::{send, Endpoint, Notifier};
pub use payload::{Attachment, Author, Field, Message, Severity, Title};
