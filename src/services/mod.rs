pub mod ai;
pub mod ai_types;
pub mod console;
pub mod encoding;
pub mod pipeline;
