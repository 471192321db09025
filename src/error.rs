use crate::provider::Provider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmartCommitError {
    #[error("Not inside a git repository")]
    NotARepository,
    #[error("No staged changes to commit")]
    NoStagedChanges,
    #[error("No API key found for {provider}")]
    MissingCredential { provider: Provider },
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error ({status}): {message}")]
    ProviderError { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Git commit failed: {0}")]
    CommitFailed(String),
    #[error("Editor failed: {0}")]
    Editor(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

impl SmartCommitError {
    /// Errors that end the process before (or instead of) the interactive loop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SmartCommitError::NotARepository
                | SmartCommitError::NoStagedChanges
                | SmartCommitError::MissingCredential { .. }
                | SmartCommitError::Io(_)
                | SmartCommitError::Git(_)
        )
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            SmartCommitError::NotARepository => {
                Some("Run smart-commit from inside a git working tree.".to_string())
            }
            SmartCommitError::NoStagedChanges => {
                Some("Stage some files first with 'git add'.".to_string())
            }
            SmartCommitError::MissingCredential { provider } => Some(format!(
                "Export {} or add \"{}\" to .smart_commit_config (project) or ~/.smart_commit_config.",
                provider.api_key_env(),
                provider.config_key()
            )),
            SmartCommitError::AuthenticationFailed(_) => {
                Some("Check that the API key belongs to the selected provider.".to_string())
            }
            SmartCommitError::RateLimited(_) => {
                Some("Wait a moment, then press r to regenerate.".to_string())
            }
            SmartCommitError::CommitFailed(_) => {
                Some("Fix the reported problem, then press c to retry or q to quit.".to_string())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SmartCommitError>;

#[cfg(test)]
mod tests {
    use super::SmartCommitError;
    use crate::provider::Provider;

    #[test]
    fn startup_errors_are_fatal_and_generation_errors_are_not() {
        assert!(SmartCommitError::NotARepository.is_fatal());
        assert!(SmartCommitError::NoStagedChanges.is_fatal());
        assert!(
            SmartCommitError::MissingCredential {
                provider: Provider::Groq
            }
            .is_fatal()
        );
        assert!(!SmartCommitError::RateLimited("slow down".into()).is_fatal());
        assert!(!SmartCommitError::MalformedResponse("empty".into()).is_fatal());
        assert!(!SmartCommitError::CommitFailed("hook".into()).is_fatal());
    }

    #[test]
    fn missing_credential_hint_names_the_provider_env_var() {
        let err = SmartCommitError::MissingCredential {
            provider: Provider::OpenAi,
        };
        let hint = err.hint().expect("hint");
        assert!(hint.contains("OPENAI_API_KEY"));
        assert!(hint.contains("openai_api_key"));
        assert_eq!(err.to_string(), "No API key found for openai");
    }

    #[test]
    fn provider_error_display_carries_status() {
        let err = SmartCommitError::ProviderError {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "Provider error (503): overloaded");
    }
}
