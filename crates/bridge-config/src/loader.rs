//! Multi-file configuration loading.
//!
//! A root file may name other files through a top-level `include` key (a
//! string or an array of strings). Included files contribute whole top-level
//! sections; a section defined in two files is rejected, as is a file that is
//! reached twice.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads a root configuration file together with its includes.
pub(crate) struct ConfigLoader {
	/// Directory relative includes are resolved against.
	base_dir: PathBuf,
	/// Canonical paths already read.
	visited: HashSet<PathBuf>,
	/// Top-level section name to the file that defined it.
	owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub(crate) fn new(base_dir: impl AsRef<Path>) -> Self {
		Self {
			base_dir: base_dir.as_ref().to_path_buf(),
			visited: HashSet::new(),
			owners: HashMap::new(),
		}
	}

	/// Reads `root`, merges every included file into it and parses the result.
	pub(crate) async fn load_config(&mut self, root: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let root_path = self.locate(root)?;
		let mut merged = self.read_table(&root_path).await?;

		let includes = match merged.remove("include") {
			Some(value) => include_list(value)?,
			None => Vec::new(),
		};
		for section in merged.keys() {
			self.owners.insert(section.clone(), root_path.clone());
		}

		for include in includes {
			let include_path = self.locate(&include)?;
			let table = self.read_table(&include_path).await?;
			for (section, value) in table {
				if let Some(owner) = self.owners.get(&section) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						section,
						owner.display(),
						include_path.display()
					)));
				}
				self.owners.insert(section.clone(), include_path.clone());
				merged.insert(section, value);
			}
		}

		let config: Config = toml::Value::Table(merged).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Reads one file, substitutes environment variables and parses it as a
	/// TOML table. Fails if the file was already read.
	async fn read_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;
		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let raw = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&raw)?;
		Ok(toml::from_str(&resolved)?)
	}

	fn locate(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let located = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_dir.join(path)
		};

		if !located.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", located.display()),
			)));
		}
		Ok(located)
	}
}

fn include_list(value: toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
		toml::Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		_ => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
