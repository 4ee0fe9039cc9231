//! YAML configuration loader with custom tag support
//!
//! Supported tags:
//! - `!include path` - Include another YAML file
//! - `!include_dir_merge_list dir` - Merge lists from all YAML files in a directory
//! - `!env_var NAME [default]` - Environment variable substitution

use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Tags the loader expands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Include,
    IncludeDirMergeList,
    EnvVar,
}

impl Tag {
    fn parse(tag: &str) -> Option<Self> {
        match tag.trim_start_matches('!') {
            "include" => Some(Self::Include),
            "include_dir_merge_list" => Some(Self::IncludeDirMergeList),
            "env_var" => Some(Self::EnvVar),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Include => "!include",
            Self::IncludeDirMergeList => "!include_dir_merge_list",
            Self::EnvVar => "!env_var",
        }
    }

    /// The tag's scalar argument
    fn argument(self, value: &Value) -> ConfigResult<&str> {
        value.as_str().ok_or_else(|| ConfigError::TagArgument {
            tag: self.name(),
            found: kind_of(value),
        })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// YAML loader expanding the custom tags
///
/// Relative `!include` paths resolve against the including file's directory;
/// paths handed to [`YamlLoader::load_file`] resolve against `config_dir`.
pub struct YamlLoader {
    config_dir: PathBuf,
    /// Files being expanded, outermost first
    chain: Vec<PathBuf>,
}

impl YamlLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            chain: Vec::new(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Read a file and expand its tags
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = self.config_dir.join(path.as_ref());
        self.load_resolved(path)
    }

    fn load_resolved(&mut self, path: PathBuf) -> ConfigResult<Value> {
        if self.chain.contains(&path) {
            let mut chain = self.chain.clone();
            chain.push(path);
            return Err(ConfigError::CircularInclude { chain });
        }

        debug!(path = %path.display(), depth = self.chain.len(), "Loading YAML file");
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })?;

        self.chain.push(path.clone());
        let result = self.load_string(&content, &path);
        self.chain.pop();
        result
    }

    /// Parse YAML text and expand its tags. `origin` names the source in
    /// errors and anchors relative includes.
    pub fn load_string(&mut self, content: &str, origin: &Path) -> ConfigResult<Value> {
        let value = serde_yaml::from_str(content).map_err(|source| ConfigError::ParseYaml {
            path: origin.to_path_buf(),
            source,
        })?;
        self.expand(value, origin)
    }

    fn expand(&mut self, value: Value, origin: &Path) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                match Tag::parse(&tag.to_string()) {
                    Some(known) => self.expand_tag(known, &value, origin),
                    None => Ok(Value::Tagged(Box::new(TaggedValue {
                        tag,
                        value: self.expand(value, origin)?,
                    }))),
                }
            }
            Value::Mapping(map) => map
                .into_iter()
                .map(|(k, v)| -> ConfigResult<(Value, Value)> {
                    Ok((self.expand(k, origin)?, self.expand(v, origin)?))
                })
                .collect::<ConfigResult<Mapping>>()
                .map(Value::Mapping),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.expand(item, origin))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            scalar => Ok(scalar),
        }
    }

    fn expand_tag(&mut self, tag: Tag, value: &Value, origin: &Path) -> ConfigResult<Value> {
        let argument = tag.argument(value)?;
        trace!(tag = tag.name(), argument, "Expanding tag");
        match tag {
            Tag::Include => {
                let path = self.relative_to(origin, argument);
                self.load_resolved(path)
            }
            Tag::IncludeDirMergeList => {
                let dir = self.relative_to(origin, argument);
                self.merge_dir(&dir)
            }
            Tag::EnvVar => env_var(argument),
        }
    }

    /// Concatenate the lists of every YAML file in `dir`, in file name order.
    /// A file holding a single item contributes that item; empty files
    /// contribute nothing.
    fn merge_dir(&mut self, dir: &Path) -> ConfigResult<Value> {
        debug!(path = %dir.display(), "Merging directory into a list");
        let mut merged = Vec::new();
        for file in yaml_files(dir)? {
            match self.load_resolved(file)? {
                Value::Sequence(items) => merged.extend(items),
                Value::Null => {}
                item => merged.push(item),
            }
        }
        Ok(Value::Sequence(merged))
    }

    /// `argument` resolved against the directory of `origin`, or against
    /// `config_dir` when `origin` has none
    fn relative_to(&self, origin: &Path, argument: &str) -> PathBuf {
        match origin.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(argument),
            _ => self.config_dir.join(argument),
        }
    }
}

/// Expand `!env_var NAME [default]`.
///
/// The substituted text is read as a YAML scalar, so `!env_var START 41`
/// yields the number 41. Text that would parse as a collection stays a string.
fn env_var(argument: &str) -> ConfigResult<Value> {
    let argument = argument.trim();
    let (name, default) = match argument.split_once(char::is_whitespace) {
        Some((name, default)) => (name, Some(default.trim())),
        None => (argument, None),
    };

    let raw = match std::env::var(name) {
        Ok(raw) => raw,
        Err(_) => {
            let default = default.ok_or_else(|| ConfigError::EnvVarNotFound {
                var: name.to_string(),
            })?;
            debug!(var = name, "Environment variable not set, using default");
            default.to_string()
        }
    };

    Ok(match serde_yaml::from_str::<Value>(&raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_))) => value,
        _ => Value::String(raw),
    })
}

/// YAML files of a directory, sorted by name
fn yaml_files(dir: &Path) -> ConfigResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ConfigError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|source| ConfigError::ReadFile {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml" | "yml")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Load a YAML file with full tag processing
pub fn load_yaml(config_dir: impl Into<PathBuf>, file: impl AsRef<Path>) -> ConfigResult<Value> {
    YamlLoader::new(config_dir).load_file(file)
}

/// Load a YAML string with tag processing
pub fn load_yaml_string(
    config_dir: impl Into<PathBuf>,
    content: &str,
    source_name: &str,
) -> ConfigResult<Value> {
    YamlLoader::new(config_dir).load_string(content, Path::new(source_name))
}

/// Load a YAML file and deserialize it. Relative includes resolve against the
/// file's own directory.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> ConfigResult<T> {
    let path = path.as_ref();
    let config_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file = path.file_name().map(PathBuf::from).unwrap_or_default();

    let value = load_yaml(config_dir, &file)?;
    serde_yaml::from_value(value).map_err(|e| ConfigError::Deserialize {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn get<'a>(value: &'a Value, key: &str) -> &'a Value {
        value
            .as_mapping()
            .unwrap()
            .get(&Value::String(key.to_string()))
            .unwrap()
    }

    #[test]
    fn test_load_simple_yaml() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "countr.yaml",
            r#"
guild:
  id: 1
channels:
  "20":
    count: 41
"#,
        );

        let value = load_yaml(dir.path(), "countr.yaml").unwrap();
        assert!(value.is_mapping());
        assert_eq!(get(get(&value, "guild"), "id"), &Value::from(1));
    }

    #[test]
    fn test_include() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "guild.yaml",
            "id: 1\nroles:\n  - { id: 10, name: Counter }\n",
        );
        write_file(dir.path(), "countr.yaml", "guild: !include guild.yaml\n");

        let value = load_yaml(dir.path(), "countr.yaml").unwrap();
        let roles = get(get(&value, "guild"), "roles").as_sequence().unwrap();
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn test_include_relative_to_including_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "flows/main.yaml", "flows: !include extra.yaml\n");
        write_file(dir.path(), "flows/extra.yaml", "- name: extra\n");
        write_file(dir.path(), "countr.yaml", "channel: !include flows/main.yaml\n");

        let value = load_yaml(dir.path(), "countr.yaml").unwrap();
        let flows = get(get(&value, "channel"), "flows").as_sequence().unwrap();
        assert_eq!(flows.len(), 1);
    }

    #[test]
    fn test_env_var() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("TEST_COUNTR_CONFIG_VAR", "env_value");
        write_file(
            dir.path(),
            "countr.yaml",
            "from_env: !env_var TEST_COUNTR_CONFIG_VAR\n",
        );

        let value = load_yaml(dir.path(), "countr.yaml").unwrap();
        assert_eq!(get(&value, "from_env"), &Value::String("env_value".into()));

        std::env::remove_var("TEST_COUNTR_CONFIG_VAR");
    }

    #[test]
    fn test_env_var_default() {
        let yaml = "count: !env_var TEST_COUNTR_UNSET_COUNT 41\n\
                    name: !env_var TEST_COUNTR_UNSET_NAME counting room\n";
        let value = load_yaml_string(".", yaml, "inline.yaml").unwrap();
        assert_eq!(get(&value, "count"), &Value::from(41));
        assert_eq!(get(&value, "name"), &Value::String("counting room".into()));
    }

    #[test]
    fn test_env_var_missing() {
        let result = load_yaml_string(".", "x: !env_var TEST_COUNTR_UNSET_VAR\n", "inline.yaml");
        assert!(matches!(
            result,
            Err(ConfigError::EnvVarNotFound { var }) if var == "TEST_COUNTR_UNSET_VAR"
        ));
    }

    #[test]
    fn test_include_dir_merge_list() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "flows/a.yaml",
            "- name: first\n- name: second\n",
        );
        write_file(dir.path(), "flows/b.yaml", "name: third\n");
        write_file(dir.path(), "flows/notes.txt", "ignored\n");
        write_file(
            dir.path(),
            "countr.yaml",
            "flows: !include_dir_merge_list flows\n",
        );

        let value = load_yaml(dir.path(), "countr.yaml").unwrap();
        let flows = get(&value, "flows").as_sequence().unwrap();
        assert_eq!(flows.len(), 3);
        assert_eq!(get(&flows[2], "name"), &Value::String("third".into()));
    }

    #[test]
    fn test_include_dir_missing() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "countr.yaml",
            "flows: !include_dir_merge_list nowhere\n",
        );
        let result = load_yaml(dir.path(), "countr.yaml");
        assert!(matches!(result, Err(ConfigError::DirectoryNotFound { .. })));
    }

    #[test]
    fn test_circular_include_detection() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.yaml", "include_b: !include b.yaml\n");
        write_file(dir.path(), "b.yaml", "include_a: !include a.yaml\n");

        let err = load_yaml(dir.path(), "a.yaml").unwrap_err();
        let ConfigError::CircularInclude { chain } = &err else {
            panic!("expected a circular include, got {err}");
        };
        let names: Vec<_> = chain.iter().filter_map(|p| p.file_name()).collect();
        assert_eq!(names, vec!["a.yaml", "b.yaml", "a.yaml"]);
        assert!(err.to_string().contains("b.yaml -> "));
    }

    #[test]
    fn test_tag_argument_must_be_a_string() {
        let err = load_yaml_string(".", "guild: !include [a, b]\n", "inline.yaml").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TagArgument {
                tag: "!include",
                found: "a list"
            }
        ));
        assert_eq!(err.to_string(), "!include expects a string, found a list");
    }

    #[test]
    fn test_circular_include_from_relative_config_dir() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.yaml", "b: !include b.yaml\n");
        write_file(dir.path(), "b.yaml", "a: !include ./a.yaml\n");

        let mut loader = YamlLoader::new(dir.path().join("."));
        let result = loader.load_file("a.yaml");
        assert!(matches!(result, Err(ConfigError::CircularInclude { .. })));
    }

    #[test]
    fn test_unknown_tag_kept() {
        let value = load_yaml_string(".", "x: !custom 5\n", "inline.yaml").unwrap();
        assert!(matches!(get(&value, "x"), Value::Tagged(_)));
    }

    #[test]
    fn test_load_config_typed() {
        #[derive(Debug, serde::Deserialize)]
        struct Settings {
            name: String,
            count: u64,
        }

        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "settings.yaml",
            "name: main\ncount: !env_var TEST_COUNTR_UNSET_START 7\n",
        );
        let settings: Settings = load_config(dir.path().join("settings.yaml")).unwrap();
        assert_eq!(settings.name, "main");
        assert_eq!(settings.count, 7);

        write_file(dir.path(), "broken.yaml", "name: main\n");
        let result = load_config::<Settings>(dir.path().join("broken.yaml"));
        assert!(matches!(result, Err(ConfigError::Deserialize { .. })));
    }
}
