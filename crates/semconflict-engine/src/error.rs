use thiserror::Error;

use crate::types::Language;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load {language} grammar: {message}")]
    Grammar { language: Language, message: String },

    #[error("tree-sitter returned no tree for {language} source")]
    ParseFailed { language: Language },

    /// The trees handed to one comparison cannot be versions of the same file.
    #[error("cannot compare a {ancestor} tree against a {changed} tree")]
    LanguageMismatch { ancestor: Language, changed: Language },
}

pub type Result<T> = std::result::Result<T, EngineError>;
