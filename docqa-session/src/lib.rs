//! # docqa-session
//!
//! Sessions and the question loop of the docqa document assistant.
//!
//! An [`Assistant`] turns an uploaded file into a searchable index and answers
//! questions about it, appending every exchange to the [`Session`] history.
//! Failures while answering are recorded in the history rather than returned,
//! so the conversation can continue.

pub mod assistant;
pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use assistant::{Assistant, AssistantBuilder};
pub use config::{AssistantConfig, AssistantConfigBuilder, DEFAULT_MAX_UPLOAD_BYTES};
pub use error::{AskError, ConfigError, UploadError};
pub use session::{Session, SessionState, UploadSummary};
pub use store::{StagedUpload, UploadStore, sanitize_file_name};
