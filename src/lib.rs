//! Batch translation of `.lng` language files through a chat-completion API.

pub mod error;
pub mod model;
pub mod parsers;
pub mod services;

pub use error::{Result, TranslatorError};
pub use model::config::AppConfig;
pub use model::entry::{ResourceEntry, ResourceFile, EMPTY_SENTINEL};
pub use services::ai::{AiClient, Translate};
pub use services::ai_types::TranslationFailure;
pub use services::pipeline::{PipelineConfig, Progress, RunReport, Silent};
