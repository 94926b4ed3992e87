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

//! Provides [`env_filter`](https://crates.io/crates/env_filter) based filter for log records.

use std::borrow::Cow;
use std::str::FromStr;

use log::LevelFilter;

use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::Record;

/// The default environment variable for filtering logs.
pub const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// A filter consists of one or more comma-separated directives which match on [`Record`].
///
/// A directive names a category prefix and the maximum verbosity [`level`][log::Level] enabled for
/// it. Severities map to levels with [`Severity::to_log_level`][crate::record::Severity].
///
/// The directive syntax is similar to that of [`env_logger`](https://crates.io/crates/env_logger)'s.
/// Read more from [the `env_logger` documentation](https://docs.rs/env_logger/#enabling-logging)
#[derive(Debug)]
pub struct EnvFilter(env_filter::Filter);

impl EnvFilter {
    /// Initializes the filter builder from the [EnvFilterBuilder].
    pub fn new(mut builder: EnvFilterBuilder) -> Self {
        EnvFilter(builder.0.build())
    }

    /// Initializes the filter builder from the environment using default variable name `RUST_LOG`.
    /// If the variable is not set, the default value will be used.
    ///
    /// # Examples
    ///
    /// Initialize a filter using the default environment variables, or fallback to the default
    /// value:
    ///
    /// ```
    /// use logredirect::filter::EnvFilter;
    /// let filter = EnvFilter::from_default_env_or("info");
    /// ```
    pub fn from_default_env_or<'a, V>(default: V) -> Self
    where
        V: Into<Cow<'a, str>>,
    {
        EnvFilter::from_env_or(DEFAULT_FILTER_ENV, default)
    }

    /// Initializes the filter builder from the environment using specific variable name.
    /// If the variable is not set, the default value will be used.
    ///
    /// # Examples
    ///
    /// ```
    /// use logredirect::filter::EnvFilter;
    /// let filter = EnvFilter::from_env_or("MY_LOG", "info");
    /// ```
    pub fn from_env_or<'a, 'b, E, V>(name: E, default: V) -> Self
    where
        E: Into<Cow<'a, str>>,
        V: Into<Cow<'b, str>>,
    {
        let name = name.into();
        let default = default.into();

        let builder = EnvFilterBuilder::new();
        if let Ok(s) = std::env::var(&*name) {
            EnvFilter::new(builder.parse(&s))
        } else {
            EnvFilter::new(builder.parse(&default))
        }
    }
}

impl Filter for EnvFilter {
    fn matches(&self, record: &Record) -> FilterResult {
        let metadata = log::MetadataBuilder::new()
            .level(record.severity().to_log_level())
            .target(record.category())
            .build();

        if self.0.enabled(&metadata) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}

impl From<LevelFilter> for EnvFilter {
    fn from(filter: LevelFilter) -> Self {
        EnvFilter::new(EnvFilterBuilder::new().filter_level(filter))
    }
}

impl<'a> From<&'a str> for EnvFilter {
    fn from(filter: &'a str) -> Self {
        EnvFilter::new(EnvFilterBuilder::new().parse(filter))
    }
}

impl FromStr for EnvFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvFilterBuilder::new().try_parse(s).map(EnvFilter::new)
    }
}

/// A builder for the env log filter.
///
/// It can be used to parse a set of directives from a string before building a [EnvFilter]
/// instance.
#[derive(Default, Debug)]
pub struct EnvFilterBuilder(env_filter::Builder);

impl EnvFilterBuilder {
    /// Initializes the filter builder with defaults.
    pub fn new() -> Self {
        EnvFilterBuilder(env_filter::Builder::new())
    }

    /// Adds a directive to the filter for a specific category prefix.
    pub fn filter_category(mut self, category: &str, level: LevelFilter) -> Self {
        self.0.filter_module(category, level);
        self
    }

    /// Adds a directive to the filter for all categories.
    pub fn filter_level(mut self, level: LevelFilter) -> Self {
        self.0.filter_level(level);
        self
    }

    /// Parses the directive string, returning an error if the given directive string is invalid.
    ///
    /// See [the `env_logger` documentation](https://docs.rs/env_logger/#enabling-logging) for more details.
    pub fn try_parse(mut self, filters: &str) -> anyhow::Result<Self> {
        self.0.try_parse(filters)?;
        Ok(self)
    }

    /// Parses the directives string.
    ///
    /// See [the `env_logger` documentation](https://docs.rs/env_logger/#enabling-logging) for more details.
    pub fn parse(mut self, filters: &str) -> Self {
        self.0.parse(filters);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Severity;

    fn check(filter: &EnvFilter, category: &str, severity: Severity) -> FilterResult {
        filter.matches(
            &Record::builder()
                .category(category)
                .severity(severity)
                .build(),
        )
    }

    #[test]
    fn test_directives_apply_to_categories() {
        let filter: EnvFilter = "warn,network=debug".parse().unwrap();

        assert_eq!(check(&filter, "app", Severity::Info), FilterResult::Reject);
        assert_eq!(check(&filter, "app", Severity::Warning), FilterResult::Neutral);
        assert_eq!(check(&filter, "app", Severity::Fatal), FilterResult::Neutral);
        assert_eq!(check(&filter, "network", Severity::Debug), FilterResult::Neutral);
        assert_eq!(check(&filter, "network::tcp", Severity::Debug), FilterResult::Neutral);
    }

    #[test]
    fn test_level_filter() {
        let filter = EnvFilter::from(LevelFilter::Off);
        assert_eq!(check(&filter, "app", Severity::Fatal), FilterResult::Reject);

        let filter = EnvFilter::new(EnvFilterBuilder::new().filter_level(LevelFilter::Trace));
        assert_eq!(check(&filter, "app", Severity::Debug), FilterResult::Neutral);

        let filter = EnvFilter::new(
            EnvFilterBuilder::new()
                .filter_level(LevelFilter::Error)
                .filter_category("db", LevelFilter::Info),
        );
        assert_eq!(check(&filter, "db", Severity::Info), FilterResult::Neutral);
        assert_eq!(check(&filter, "web", Severity::Info), FilterResult::Reject);
    }

    #[test]
    fn test_invalid_directives() {
        assert!("app=loud".parse::<EnvFilter>().is_err());
    }
}
