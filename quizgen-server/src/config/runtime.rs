//! Runtime configuration re-exports.
//!
//! The actual config types are defined in `quizgen_core::config`.

pub use quizgen_core::config::{
    AuthConfig, ConfigSections, FunctionServiceConfig, PubSubConfig, ServerConfig, SharedConfig,
    SpeechConfig,
};
