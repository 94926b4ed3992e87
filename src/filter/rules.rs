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

use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;

use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::Record;
use crate::record::Severity;

/// Process-wide rules enabling or disabling (category, severity) pairs.
///
/// Rules are `key=value` lines, separated by newlines or `;`:
///
/// ```text
/// logger.*=false
/// logger.debug=true
/// logger.info=true
/// ```
///
/// The key selects categories and, optionally, one severity:
///
/// * `<pattern>.<severity>` matches one severity of the categories;
/// * `<pattern>.*` matches every severity of the category and of its dotted sub-categories;
/// * `<pattern>` matches every severity.
///
/// A pattern may start and/or end with `*` as a wildcard. The last matching rule wins. A pair
/// that no rule matches is enabled.
///
/// Unlike Qt's logging rules, where `logger.*` is a plain trailing wildcard matching only the
/// `logger.` sub-categories, `logger.*` here also matches `logger` itself. `logger.*=false`
/// therefore disables every severity of `logger` that a later rule does not re-enable.
///
/// # Examples
///
/// ```
/// use logredirect::filter::FilterRules;
/// use logredirect::record::Severity;
///
/// let rules: FilterRules = "logger.*=false;logger.info=true".parse().unwrap();
/// assert!(rules.enabled("logger", Severity::Info));
/// assert!(!rules.enabled("logger", Severity::Warning));
/// assert!(rules.enabled("network", Severity::Warning));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRules {
    rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    key: String,
    pattern: Pattern,
    severity: Option<Severity>,
    enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    // the category itself and every `category.` descendant
    Tree(String),
}

impl Pattern {
    fn parse(s: &str) -> anyhow::Result<Pattern> {
        if s.is_empty() {
            bail!("empty category pattern");
        }

        if s == "*" {
            return Ok(Pattern::Any);
        }

        if let Some(base) = s.strip_suffix(".*") {
            if !base.is_empty() && !base.contains('*') {
                return Ok(Pattern::Tree(base.to_string()));
            }
        }

        let leading = s.starts_with('*');
        let trailing = s.len() > 1 && s.ends_with('*');
        let inner = &s[usize::from(leading)..s.len() - usize::from(trailing)];
        if inner.is_empty() || inner.contains('*') {
            bail!("wildcard is only allowed at the start or end of a pattern: {s:?}");
        }

        let inner = inner.to_string();
        Ok(match (leading, trailing) {
            (true, true) => Pattern::Contains(inner),
            (true, false) => Pattern::Suffix(inner),
            (false, true) => Pattern::Prefix(inner),
            (false, false) => Pattern::Exact(inner),
        })
    }

    fn matches(&self, category: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(s) => category == s,
            Pattern::Prefix(s) => category.starts_with(s.as_str()),
            Pattern::Suffix(s) => category.ends_with(s.as_str()),
            Pattern::Contains(s) => category.contains(s.as_str()),
            Pattern::Tree(s) => category
                .strip_prefix(s.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.')),
        }
    }
}

impl Rule {
    fn parse(line: &str) -> anyhow::Result<Rule> {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| anyhow!("missing '=' in filter rule: {line:?}"))?;
        let key = key.trim();
        let enabled = match value.trim() {
            "true" => true,
            "false" => false,
            other => bail!("filter rule value must be `true` or `false`, got {other:?}"),
        };

        let split = key.rsplit_once('.').and_then(|(category, severity)| {
            Some((category, severity.parse::<Severity>().ok()?))
        });
        let (pattern, severity) = match split {
            Some((category, severity)) => (category, Some(severity)),
            None => (key, None),
        };
        let pattern =
            Pattern::parse(pattern).with_context(|| format!("invalid filter rule: {line:?}"))?;

        Ok(Rule {
            key: key.to_string(),
            pattern,
            severity,
            enabled,
        })
    }

    fn matches(&self, category: &str, severity: Severity) -> Option<bool> {
        if self.severity.is_some_and(|s| s != severity) {
            return None;
        }
        self.pattern.matches(category).then_some(self.enabled)
    }
}

fn rule_lines(rules: &str) -> impl Iterator<Item = &str> {
    rules
        .split(['\n', ';'])
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && *line != "[Rules]")
}

impl FilterRules {
    /// Create an empty rule set, enabling everything.
    pub fn new() -> Self {
        FilterRules::default()
    }

    /// Parse the rules, skipping lines that are not valid rules.
    ///
    /// Use [`FromStr`] to reject invalid input instead.
    pub fn parse(rules: &str) -> Self {
        let rules = rule_lines(rules)
            .filter_map(|line| Rule::parse(line).ok())
            .collect();
        FilterRules { rules }
    }

    /// Rules disabling every severity of `category` except the given ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use logredirect::filter::FilterRules;
    /// use logredirect::record::Severity;
    ///
    /// let rules = FilterRules::only("logger", &[Severity::Debug, Severity::Info]);
    /// assert_eq!(
    ///     rules.to_string(),
    ///     "logger.*=false\nlogger.debug=true\nlogger.info=true"
    /// );
    /// ```
    pub fn only(category: &str, severities: &[Severity]) -> Self {
        let mut rules = vec![Rule {
            key: format!("{category}.*"),
            pattern: Pattern::Tree(category.to_string()),
            severity: None,
            enabled: false,
        }];
        rules.extend(severities.iter().map(|&severity| Rule {
            key: format!("{category}.{severity}"),
            pattern: Pattern::Exact(category.to_string()),
            severity: Some(severity),
            enabled: true,
        }));
        FilterRules { rules }
    }

    /// Whether records of `severity` under `category` are enabled.
    pub fn enabled(&self, category: &str, severity: Severity) -> bool {
        self.rules
            .iter()
            .rev()
            .find_map(|rule| rule.matches(category, severity))
            .unwrap_or(true)
    }

    /// Append `other`'s rules after these ones, so that they take precedence.
    ///
    /// # Examples
    ///
    /// ```
    /// use logredirect::filter::FilterRules;
    /// use logredirect::record::Severity;
    ///
    /// let mut rules = FilterRules::only("logger", &[Severity::Info]);
    /// rules.extend(FilterRules::only("audit", &[Severity::Info]));
    /// assert!(!rules.enabled("logger", Severity::Warning));
    /// assert!(!rules.enabled("audit", Severity::Warning));
    /// ```
    pub fn extend(&mut self, other: FilterRules) {
        self.rules.extend(other.rules);
    }

    /// The number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there is no rule at all.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromStr for FilterRules {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rules = rule_lines(s).map(Rule::parse).collect::<anyhow::Result<_>>()?;
        Ok(FilterRules { rules })
    }
}

impl fmt::Display for FilterRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}={}", rule.key, rule.enabled)?;
        }
        Ok(())
    }
}

impl Filter for FilterRules {
    fn matches(&self, record: &Record) -> FilterResult {
        if self.enabled(record.category(), record.severity()) {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}
