//! Load bundle options from a JSON configuration file.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    bundler::BundleOptions,
    loader::{builtin_loader, Rule},
    plugins::builtin_plugin,
};

/// Rule as declared in a configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Regular expression matched against the module path.
    pub test: String,
    /// Loader names, the last one runs first.
    #[serde(rename = "use")]
    pub loaders: Vec<String>,
}

/// Contents of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub entry: Option<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub plugins: Vec<String>,
    /// Directory that relative paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let f = File::open(file)
            .context(format!("Unable to open config file {}", file.display()))?;
        let reader = BufReader::new(f);
        let mut config: ConfigFile = serde_json::from_reader(reader)
            .context(format!("Failed to parse JSON in {}", file.display()))?;
        config.base_dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Convert into bundle options.
    ///
    /// An `entry` passed here takes precedence over the configured one
    /// and is used as given.
    pub fn into_options(self, entry: Option<PathBuf>) -> Result<BundleOptions> {
        let entry = match (entry, &self.entry) {
            (Some(entry), _) => entry,
            (None, Some(entry)) => self.resolve(entry),
            (None, None) => anyhow::bail!("no entry point configured"),
        };

        let mut options = BundleOptions::new(entry).parallel(self.parallel);
        if let Some(output) = &self.output {
            options = options.output(self.resolve(output));
        }

        for rule in self.rules.iter() {
            let mut built = Rule::new(&rule.test)?;
            for name in rule.loaders.iter() {
                built = built.with_shared(builtin_loader(name)?);
            }
            options = options.rule(built);
        }

        for name in self.plugins.iter() {
            options = options.shared_plugin(builtin_plugin(name)?);
        }

        Ok(options)
    }
}
