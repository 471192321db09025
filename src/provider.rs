use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// A hosted text-generation service speaking the chat-completions protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    #[default]
    Groq,
}

/// Retired model identifiers and the models that replaced them.
const GROQ_MODEL_ALIASES: &[(&str, &str)] = &[
    ("llama3-70b-8192", "llama-3.3-70b-versatile"),
    ("llama3-8b-8192", "llama-3.1-8b-instant"),
    ("llama-3.1-70b-versatile", "llama-3.3-70b-versatile"),
    ("llama2-70b-4096", "llama-3.3-70b-versatile"),
    ("mixtral-8x7b-32768", "llama-3.3-70b-versatile"),
    ("gemma-7b-it", "gemma2-9b-it"),
];

const OPENAI_MODEL_ALIASES: &[(&str, &str)] = &[
    ("gpt-4", "gpt-4o"),
    ("gpt-4-32k", "gpt-4o"),
    ("gpt-4-turbo", "gpt-4o"),
    ("gpt-4-turbo-preview", "gpt-4o"),
    ("gpt-3.5-turbo", "gpt-4o-mini"),
    ("gpt-3.5-turbo-16k", "gpt-4o-mini"),
];

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Groq => "groq",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1/chat/completions",
            Provider::Groq => "https://api.groq.com/openai/v1/chat/completions",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }

    /// Provider-specific key name in `.smart_commit_config`.
    pub fn config_key(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai_api_key",
            Provider::Groq => "groq_api_key",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Groq => "llama-3.3-70b-versatile",
        }
    }

    fn aliases(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Provider::OpenAi => OPENAI_MODEL_ALIASES,
            Provider::Groq => GROQ_MODEL_ALIASES,
        }
    }

    /// Maps deprecated model identifiers to their current equivalent.
    /// Unknown identifiers pass through untouched.
    pub fn resolve_model(self, model: &str) -> &str {
        let wanted = model.trim();
        self.aliases()
            .iter()
            .find(|(old, _)| old.eq_ignore_ascii_case(wanted))
            .map(|(_, current)| *current)
            .unwrap_or(wanted)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "groq" => Some(Provider::Groq),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
