use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::repos::RepoError, config::LoadError, domain::error::DomainError,
    infra::error::InfraError,
};

/// An error together with the messages of every error in its source chain.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// Messages joined outermost first.
    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("configuration could not be loaded")]
    Config(#[from] LoadError),
    #[error("post {0} not found")]
    PostNotFound(i64),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }

    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(DomainError::Validation { .. }) => 2,
            AppError::PostNotFound(_) | AppError::Repo(RepoError::NotFound) => 3,
            AppError::Config(_) | AppError::Infra(InfraError::Configuration { .. }) => 78,
            AppError::Repo(_) | AppError::Infra(InfraError::Database { .. }) => 69,
            AppError::Infra(_) | AppError::Unexpected(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_walks_source_chain() {
        let error = AppError::Config(LoadError::invalid(
            "cache.post_ttl_ms",
            "must be greater than zero",
        ));
        let report = error.report();
        assert_eq!(
            report.messages,
            vec![
                "configuration could not be loaded".to_string(),
                "invalid configuration for `cache.post_ttl_ms`: must be greater than zero"
                    .to_string(),
            ]
        );
        assert!(report.chain().starts_with("configuration could not be loaded: "));
    }

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(
            AppError::from(DomainError::validation("title", "must not be empty")).exit_code(),
            2
        );
        assert_eq!(AppError::PostNotFound(4).exit_code(), 3);
        assert_eq!(AppError::from(RepoError::Timeout).exit_code(), 69);
    }
}
