//! Configuration loading errors

use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The YAML parsed but does not have the expected shape
    #[error("invalid configuration in {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A custom tag was given something other than a string
    #[error("{tag} expects a string, found {found}")]
    TagArgument {
        tag: &'static str,
        found: &'static str,
    },

    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// A file includes itself, directly or through other files. `chain`
    /// lists the files from the outermost one to the repeated one.
    #[error("circular include: {}", display_chain(.chain))]
    CircularInclude { chain: Vec<PathBuf> },

    /// `!env_var` without a default names an unset variable
    #[error("environment variable '{var}' not set")]
    EnvVarNotFound { var: String },
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
