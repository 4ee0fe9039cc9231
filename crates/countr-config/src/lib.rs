//! YAML configuration loading for countr
//!
//! Configuration files are plain YAML with a few custom tags:
//!
//! - `!include path` - Include another YAML file
//! - `!include_dir_merge_list dir` - Merge lists from all YAML files in a directory
//! - `!env_var NAME [default]` - Environment variable substitution
//!
//! # Example
//!
//! ```ignore
//! use countr_config::{load_config, YamlLoader};
//!
//! // Load and deserialize a configuration file
//! let config: BotConfig = load_config("/etc/countr/countr.yaml")?;
//!
//! // Or use the loader directly for the raw YAML tree
//! let mut loader = YamlLoader::new("/etc/countr");
//! let value = loader.load_file("countr.yaml")?;
//! ```

mod error;
mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_yaml, load_yaml_string, YamlLoader};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;
