// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Redirect one category into a size-rotated log file.
//!
//! [`init_logging`] installs the redirect with the [`RedirectConfig`] defaults:
//!
//! | Setting         | Default                                                     |
//! |-----------------|-------------------------------------------------------------|
//! | category        | `logger`                                                    |
//! | file            | `logfile.txt` in the working directory                      |
//! | rollover        | 5 MiB, one backup (`logfile.1.txt`)                         |
//! | message pattern | [`DEFAULT_MESSAGE_PATTERN`]                                 |
//! | filter rules    | `logger.*=false`, `logger.debug=true`, `logger.info=true`   |
//!
//! Every line is prefixed with the UTC time of the record, see [`UtcStampLayout`].

use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use crate::append::file::FileBuilder;
use crate::filter::FilterRules;
use crate::layout::DEFAULT_MESSAGE_PATTERN;
use crate::layout::MessagePattern;
use crate::layout::UtcStampLayout;
use crate::logger::LoggingContext;
use crate::record::Severity;

/// The category redirected by default.
pub const REDIRECT_CATEGORY: &str = "logger";

/// 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: NonZeroUsize = match NonZeroUsize::new(5 * 1024 * 1024) {
    Some(size) => size,
    None => panic!("zero file size"),
};

/// Severities of the redirected category that stay enabled by default.
pub const DEFAULT_SEVERITIES: [Severity; 2] = [Severity::Debug, Severity::Info];

/// Where and how the redirected category is written.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use logredirect::RedirectConfig;
///
/// let config = RedirectConfig::default()
///     .with_category("storage")
///     .with_directory("/var/log/storage")
///     .with_max_file_size(NonZeroUsize::new(1024 * 1024).unwrap())
///     .with_max_backups(3);
/// assert_eq!(config.category(), "storage");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RedirectConfig {
    category: String,
    directory: PathBuf,
    file_stem: String,
    file_extension: String,
    max_file_size: NonZeroUsize,
    max_backups: usize,
    pattern: String,
    rules: Option<String>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        RedirectConfig {
            category: REDIRECT_CATEGORY.to_string(),
            directory: PathBuf::from("."),
            file_stem: "logfile".to_string(),
            file_extension: "txt".to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_backups: 1,
            pattern: DEFAULT_MESSAGE_PATTERN.to_string(),
            rules: None,
        }
    }
}

impl RedirectConfig {
    /// Set the redirected category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the directory of the log files.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Set the log file name, without extension.
    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    /// Set the log file extension, without the leading dot. Empty means no extension.
    pub fn with_file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = extension.into();
        self
    }

    /// Set the size a log file may grow to before a new one is started.
    pub fn with_max_file_size(mut self, size: NonZeroUsize) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set the number of rotated files kept besides the active one.
    pub fn with_max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    /// Set the per-message pattern, see [`MessagePattern`].
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the filter rules, see [`FilterRules`].
    ///
    /// Unless set, only debug and info records of the category are enabled.
    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.rules = Some(rules.into());
        self
    }
}

impl RedirectConfig {
    /// The redirected category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The path of the active log file.
    pub fn file_path(&self) -> PathBuf {
        let filename = if self.file_extension.is_empty() {
            self.file_stem.clone()
        } else {
            format!("{}.{}", self.file_stem, self.file_extension)
        };
        self.directory.join(filename)
    }

    /// The directory of the log files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The rules to install, parsed strictly.
    ///
    /// # Errors
    ///
    /// Return an error if a configured rule is malformed.
    pub fn filter_rules(&self) -> anyhow::Result<FilterRules> {
        match &self.rules {
            Some(rules) => rules.parse(),
            None => Ok(FilterRules::only(&self.category, &DEFAULT_SEVERITIES)),
        }
    }

    /// A builder for the sink of the redirected category.
    pub fn file_builder(&self) -> FileBuilder {
        let layout = UtcStampLayout::new(MessagePattern::new(self.pattern.as_str()));
        FileBuilder::new(&self.directory, self.file_stem.as_str())
            .filename_suffix(self.file_extension.as_str())
            .rollover_size(self.max_file_size)
            .max_backups(self.max_backups)
            .layout(layout)
    }
}

/// Redirect the `logger` category into `logfile.txt` and install the global logger.
///
/// Debug and info records of the category are appended to `logfile.txt` in the working
/// directory, rotated at 5 MiB with one backup. Every other category reaches stderr unchanged,
/// subject to `RUST_LOG`. The file is created by the first record written to it.
///
/// If a global [`log`] logger is already set, the failure is reported on stderr and the
/// returned context still routes records passed to [`LoggingContext::log`].
///
/// # Examples
///
/// ```no_run
/// let ctx = logredirect::init_logging();
///
/// log::info!(target: "logger", "disk full");
/// log::warn!(target: "network", "retrying");
///
/// ctx.shutdown();
/// ```
pub fn init_logging() -> LoggingContext {
    let ctx = LoggingContext::default();
    if let Err(err) = ctx.init(&RedirectConfig::default()) {
        eprintln!("failed to install log redirect: {err:?}");
    }
    if let Err(err) = ctx.apply() {
        eprintln!("failed to set global logger: {err}");
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RedirectConfig::default();
        assert_eq!(config.category(), "logger");
        assert_eq!(config.file_path(), Path::new(".").join("logfile.txt"));
        assert_eq!(
            config.filter_rules().unwrap().to_string(),
            "logger.*=false\nlogger.debug=true\nlogger.info=true"
        );
        assert_eq!(DEFAULT_MAX_FILE_SIZE.get(), 5_242_880);
    }

    #[test]
    fn test_default_rules_follow_category() {
        let rules = RedirectConfig::default()
            .with_category("audit")
            .filter_rules()
            .unwrap();
        assert!(rules.enabled("audit", Severity::Info));
        assert!(!rules.enabled("audit", Severity::Warning));
        assert!(rules.enabled("logger", Severity::Warning));
    }

    #[test]
    fn test_explicit_rules() {
        let config = RedirectConfig::default().with_rules("logger=false");
        assert!(!config.filter_rules().unwrap().enabled("logger", Severity::Debug));

        let config = RedirectConfig::default().with_rules("logger");
        assert!(config.filter_rules().is_err());
    }

    #[test]
    fn test_file_path_without_extension() {
        let config = RedirectConfig::default()
            .with_directory("logs")
            .with_file_stem("app")
            .with_file_extension("");
        assert_eq!(config.file_path(), Path::new("logs").join("app"));
        assert_eq!(config.directory(), Path::new("logs"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial_config() {
        let config: RedirectConfig =
            serde_json::from_str(r#"{"category":"audit","max_backups":3}"#).unwrap();
        assert_eq!(
            config,
            RedirectConfig::default().with_category("audit").with_max_backups(3)
        );

        let json = serde_json::to_string(&RedirectConfig::default()).unwrap();
        assert!(json.contains(r#""max_file_size":5242880"#), "{json}");
    }
}
