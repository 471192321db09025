//! Configuration resolved once at startup.
//!
//! Sources are kept as an ordered list of [`ConfigLayer`]s (flags,
//! environment, project file, user file, defaults); for every field the
//! first layer holding a non-empty value wins.

use crate::args::Args;
use crate::provider::Provider;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = ".smart_commit_config";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: Provider,
    pub model: String,
    pub api_key: Option<String>,
    pub auto_commit: bool,
    pub no_preview: bool,
}

/// One configuration source. `None` (or an empty string) means the source
/// has nothing to say about that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub name: &'static str,
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub auto_commit: Option<bool>,
    pub no_preview: Option<bool>,
}

impl ConfigLayer {
    pub fn from_args(args: &Args) -> Self {
        Self {
            name: "flags",
            provider: args.provider,
            model: args.model.clone(),
            auto_commit: args.auto_commit.then_some(true),
            no_preview: args.no_preview.then_some(true),
            ..Self::default()
        }
    }

    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            name: "environment",
            groq_api_key: lookup(Provider::Groq.api_key_env()),
            openai_api_key: lookup(Provider::OpenAi.api_key_env()),
            ..Self::default()
        }
    }

    /// Reads a JSON config file. A missing file is an empty layer; an
    /// unreadable or invalid one is skipped with a warning.
    pub fn from_file(name: &'static str, path: &Path) -> Self {
        let empty = Self {
            name,
            ..Self::default()
        };
        if !path.exists() {
            return empty;
        }

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config file, ignoring it");
                return empty;
            }
        };
        match serde_json::from_str::<FileConfig>(&text) {
            Ok(file) => {
                debug!(path = %path.display(), "loaded config file");
                file.into_layer(name, path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid JSON in config file, ignoring it");
                empty
            }
        }
    }

    pub fn defaults() -> Self {
        Self {
            name: "defaults",
            provider: Some(Provider::default()),
            auto_commit: Some(false),
            no_preview: Some(false),
            ..Self::default()
        }
    }

    fn key_for(&self, provider: Provider) -> Option<&str> {
        let specific = match provider {
            Provider::Groq => self.groq_api_key.as_deref(),
            Provider::OpenAi => self.openai_api_key.as_deref(),
        };
        non_empty(specific).or_else(|| non_empty(self.api_key.as_deref()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    groq_api_key: Option<String>,
    openai_api_key: Option<String>,
    auto_commit: Option<bool>,
    no_preview: Option<bool>,
}

impl FileConfig {
    fn into_layer(self, name: &'static str, path: &Path) -> ConfigLayer {
        let provider = self.provider.as_deref().and_then(|p| {
            let parsed = Provider::parse(p);
            if parsed.is_none() && !p.trim().is_empty() {
                warn!(path = %path.display(), provider = %p, "unknown provider in config file");
            }
            parsed
        });
        ConfigLayer {
            name,
            provider,
            model: self.model,
            api_key: self.api_key,
            groq_api_key: self.groq_api_key,
            openai_api_key: self.openai_api_key,
            auto_commit: self.auto_commit,
            no_preview: self.no_preview,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn first<'a, T>(layers: &'a [ConfigLayer], pick: impl Fn(&'a ConfigLayer) -> Option<T>) -> Option<T> {
    layers.iter().find_map(pick)
}

/// Collapses `layers` (highest precedence first) into one configuration.
pub fn resolve(layers: &[ConfigLayer]) -> Config {
    let provider = first(layers, |l| l.provider).unwrap_or_default();
    let model = first(layers, |l| non_empty(l.model.as_deref()))
        .unwrap_or(provider.default_model())
        .to_string();
    let api_key = layers.iter().find_map(|l| {
        let key = l.key_for(provider)?;
        debug!(source = l.name, provider = %provider, "resolved API key");
        Some(key.to_string())
    });

    Config {
        provider,
        model,
        api_key,
        auto_commit: first(layers, |l| l.auto_commit).unwrap_or(false),
        no_preview: first(layers, |l| l.no_preview).unwrap_or(false),
    }
}

pub fn project_config_path(cwd: &Path) -> PathBuf {
    cwd.join(CONFIG_FILE_NAME)
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// The standard precedence chain: flags > environment > project file >
/// user file > defaults.
pub fn standard_layers(args: &Args, cwd: &Path) -> Vec<ConfigLayer> {
    let mut layers = vec![
        ConfigLayer::from_args(args),
        ConfigLayer::from_env(|name| std::env::var(name).ok()),
        ConfigLayer::from_file("project config", &project_config_path(cwd)),
    ];
    if let Some(user) = user_config_path() {
        layers.push(ConfigLayer::from_file("user config", &user));
    }
    layers.push(ConfigLayer::defaults());
    layers
}

pub fn load(args: &Args, cwd: &Path) -> Config {
    resolve(&standard_layers(args, cwd))
}

#[cfg(test)]
mod tests {
    use super::{ConfigLayer, resolve};
    use crate::args::Args;
    use crate::provider::Provider;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn layer(name: &'static str) -> ConfigLayer {
        ConfigLayer {
            name,
            ..ConfigLayer::default()
        }
    }

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = resolve(&[layer("flags"), ConfigLayer::defaults()]);
        assert_eq!(config.provider, Provider::Groq);
        assert_eq!(config.model, Provider::Groq.default_model());
        assert_eq!(config.api_key, None);
        assert!(!config.auto_commit);
        assert!(!config.no_preview);
    }

    #[test]
    fn flags_beat_environment_and_files() {
        let args = Args::parse_from(["smart-commit", "--provider", "openai", "--model", "gpt-4", "--auto-commit"]);
        let project = ConfigLayer {
            provider: Some(Provider::Groq),
            model: Some("llama-3.1-8b-instant".into()),
            api_key: Some("file-key".into()),
            auto_commit: Some(false),
            ..layer("project config")
        };
        let config = resolve(&[
            ConfigLayer::from_args(&args),
            ConfigLayer::from_env(env(&[("OPENAI_API_KEY", "env-key")])),
            project,
            ConfigLayer::defaults(),
        ]);

        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert!(config.auto_commit);
    }

    #[test]
    fn environment_key_follows_selected_provider() {
        let env_layer = ConfigLayer::from_env(env(&[
            ("GROQ_API_KEY", "gsk-env"),
            ("OPENAI_API_KEY", "sk-env"),
        ]));
        let groq = resolve(&[env_layer.clone(), ConfigLayer::defaults()]);
        assert_eq!(groq.api_key.as_deref(), Some("gsk-env"));

        let openai = resolve(&[
            ConfigLayer {
                provider: Some(Provider::OpenAi),
                ..layer("flags")
            },
            env_layer,
            ConfigLayer::defaults(),
        ]);
        assert_eq!(openai.api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn project_file_beats_user_file_field_by_field() {
        let project = ConfigLayer {
            provider: Some(Provider::OpenAi),
            ..layer("project config")
        };
        let user = ConfigLayer {
            provider: Some(Provider::Groq),
            model: Some("gpt-4o".into()),
            openai_api_key: Some("sk-user".into()),
            ..layer("user config")
        };
        let config = resolve(&[project, user, ConfigLayer::defaults()]);
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.api_key.as_deref(), Some("sk-user"));
    }

    #[test]
    fn empty_values_count_as_absent() {
        let env_layer = ConfigLayer::from_env(env(&[("GROQ_API_KEY", "")]));
        let project = ConfigLayer {
            model: Some("  ".into()),
            groq_api_key: Some("".into()),
            api_key: Some("   ".into()),
            ..layer("project config")
        };
        let user = ConfigLayer {
            api_key: Some("gsk-user".into()),
            ..layer("user config")
        };
        let config = resolve(&[env_layer, project, user, ConfigLayer::defaults()]);
        assert_eq!(config.api_key.as_deref(), Some("gsk-user"));
        assert_eq!(config.model, Provider::Groq.default_model());
    }

    #[test]
    fn provider_specific_key_beats_generic_key_in_same_layer() {
        let file = ConfigLayer {
            api_key: Some("generic".into()),
            groq_api_key: Some("gsk-specific".into()),
            ..layer("project config")
        };
        let config = resolve(&[file, ConfigLayer::defaults()]);
        assert_eq!(config.api_key.as_deref(), Some("gsk-specific"));
    }

    #[test]
    fn reads_json_files_and_skips_broken_ones() -> std::io::Result<()> {
        let dir = TempDir::new()?;
        let good = dir.path().join("good.json");
        fs::write(
            &good,
            r#"{"provider": "openai", "api_key": "sk-file", "model": "gpt-4o", "no_preview": true, "extra": 1}"#,
        )?;
        let layer = ConfigLayer::from_file("project config", &good);
        assert_eq!(layer.provider, Some(Provider::OpenAi));
        assert_eq!(layer.api_key.as_deref(), Some("sk-file"));
        assert_eq!(layer.model.as_deref(), Some("gpt-4o"));
        assert_eq!(layer.no_preview, Some(true));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json")?;
        assert_eq!(
            ConfigLayer::from_file("user config", &broken),
            ConfigLayer {
                name: "user config",
                ..ConfigLayer::default()
            }
        );

        let missing = ConfigLayer::from_file("user config", &dir.path().join("missing.json"));
        assert_eq!(missing.provider, None);

        let unknown = dir.path().join("unknown.json");
        fs::write(&unknown, r#"{"provider": "cerebras", "groq_api_key": "gsk"}"#)?;
        let layer = ConfigLayer::from_file("project config", &unknown);
        assert_eq!(layer.provider, None);
        assert_eq!(layer.groq_api_key.as_deref(), Some("gsk"));
        Ok(())
    }
}
