//! Layered scan configuration.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults
//! 2. a TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory when no file is given
//! 3. `DUPESCAN_*` environment variables (`DUPESCAN_WORKERS=8`)
//! 4. command-line flags, applied with [`Config::apply_scan_args`]
//!
//! ```toml
//! algorithm = "sha256"
//! oversize_threshold = 1073741824
//! workers = 8
//! queue_capacity = 0
//! skip_hidden = true
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::duplicates::{FinderConfig, FinderError};
use crate::scanner::{HashAlgorithm, WalkerConfig, DEFAULT_OVERSIZE_THRESHOLD};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or has a wrongly typed value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] Box<figment::Error>),
}

/// Scan settings that can come from files and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest algorithm name.
    pub algorithm: String,
    /// Oversize threshold in bytes.
    pub oversize_threshold: u64,
    /// Worker threads; unset means one per logical CPU.
    pub workers: Option<usize>,
    /// Queue capacity; unset means equal to the worker count.
    pub queue_capacity: Option<usize>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Skip hidden entries.
    pub skip_hidden: bool,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Fail when any root is missing.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default().name().to_string(),
            oversize_threshold: DEFAULT_OVERSIZE_THRESHOLD,
            workers: None,
            queue_capacity: None,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            strict: false,
        }
    }
}

impl Config {
    /// Platform config file path (`config.toml` under the dupescan config dir).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupescan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Figment with defaults, the TOML file and the environment merged.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform config file
    /// is used if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] for a missing explicit file and
    /// [`ConfigError::InvalidConfig`] for unparsable sources.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) if !p.is_file() => return Err(ConfigError::NotFound(p.to_path_buf())),
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };

        if let Some(ref f) = file {
            log::debug!("Loading config from {}", f.display());
        }

        Self::figment(file.as_deref())
            .extract()
            .map_err(|e| ConfigError::InvalidConfig(Box::new(e)))
    }

    /// Overlay values given on the command line.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if let Some(ref algorithm) = args.algorithm {
            self.algorithm.clone_from(algorithm);
        }
        if let Some(threshold) = args.threshold {
            self.oversize_threshold = threshold;
        }
        if args.workers.is_some() {
            self.workers = args.workers;
        }
        if args.queue_capacity.is_some() {
            self.queue_capacity = args.queue_capacity;
        }
        self.follow_symlinks |= args.follow_symlinks;
        self.skip_hidden |= args.skip_hidden;
        self.strict |= args.strict;
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
    }

    /// Build the finder configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::DigestUnavailable`] for an unknown algorithm and
    /// [`FinderError::InvalidThreshold`] for a threshold above
    /// [`MAX_OVERSIZE_THRESHOLD`](crate::scanner::MAX_OVERSIZE_THRESHOLD).
    pub fn to_finder_config(&self) -> Result<FinderConfig, FinderError> {
        let mut config = FinderConfig::default()
            .with_algorithm_name(&self.algorithm)?
            .with_oversize_threshold(self.oversize_threshold)
            .with_strict(self.strict)
            .with_walker_config(WalkerConfig::new(
                self.follow_symlinks,
                self.skip_hidden,
                self.ignore_patterns.clone(),
            ));

        if let Some(workers) = self.workers {
            config = config.with_worker_count(workers);
        }
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        config.validate()?;
        Ok(config)
    }
}
