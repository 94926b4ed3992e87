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

use crate::append::Append;
use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::Record;

/// A grouped set of filters and appenders: one handler of a [`LoggingContext`] chain.
///
/// `filters` decide whether the dispatch claims a record; `appends` write the claimed records.
///
/// [`LoggingContext`]: crate::LoggingContext
#[derive(Debug)]
pub struct Dispatch {
    filters: Vec<Box<dyn Filter>>,
    appends: Vec<Box<dyn Append>>,
}

impl Dispatch {
    fn new(filters: Vec<Box<dyn Filter>>, appends: Vec<Box<dyn Append>>) -> Self {
        debug_assert!(
            !appends.is_empty(),
            "A Dispatch must have at least one append"
        );

        Self { filters, appends }
    }

    /// Whether this dispatch claims the record.
    pub(super) fn accepts(&self, record: &Record) -> bool {
        for filter in &self.filters {
            match filter.matches(record) {
                FilterResult::Reject => return false,
                FilterResult::Accept => return true,
                FilterResult::Neutral => {}
            }
        }

        true
    }

    /// Write a record through every append, stopping at the first failure.
    pub(super) fn append(&self, record: &Record) -> anyhow::Result<()> {
        for append in &self.appends {
            append.append(record)?;
        }
        Ok(())
    }

    pub(super) fn flush(&self) -> anyhow::Result<()> {
        for append in &self.appends {
            append.flush()?;
        }
        Ok(())
    }
}

/// A builder for configuring a [`Dispatch`], including filters and appenders.
///
/// At least one append must be added before the dispatch can be built.
///
/// # Examples
///
/// ```
/// use logredirect::LoggingContext;
/// use logredirect::append;
/// use logredirect::filter::CategoryFilter;
///
/// let ctx = LoggingContext::default();
/// ctx.register(|d| {
///     d.filter(CategoryFilter::new("audit"))
///         .append(append::Stdout::default())
/// });
/// ```
#[derive(Debug)]
pub struct DispatchBuilder<const APPEND: bool> {
    filters: Vec<Box<dyn Filter>>,
    appends: Vec<Box<dyn Append>>,
}

impl DispatchBuilder<false> {
    pub(super) fn new() -> Self {
        DispatchBuilder {
            filters: vec![],
            appends: vec![],
        }
    }

    /// Add a filter to this dispatch.
    pub fn filter(mut self, filter: impl Into<Box<dyn Filter>>) -> Self {
        self.filters.push(filter.into());
        self
    }
}

impl DispatchBuilder<true> {
    pub(super) fn build(self) -> Dispatch {
        Dispatch::new(self.filters, self.appends)
    }
}

impl<const APPEND: bool> DispatchBuilder<APPEND> {
    /// Add an appender to this dispatch.
    pub fn append(mut self, append: impl Into<Box<dyn Append>>) -> DispatchBuilder<true> {
        self.appends.push(append.into());
        DispatchBuilder {
            filters: self.filters,
            appends: self.appends,
        }
    }
}

pub(super) fn build_dispatch<F>(f: F) -> Dispatch
where
    F: FnOnce(DispatchBuilder<false>) -> DispatchBuilder<true>,
{
    f(DispatchBuilder::new()).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append::Testing;
    use crate::filter::CategoryFilter;
    use crate::filter::FilterRules;
    use crate::record::Severity;

    #[derive(Debug)]
    struct AcceptAll;

    impl Filter for AcceptAll {
        fn matches(&self, _: &Record) -> FilterResult {
            FilterResult::Accept
        }
    }

    fn record(category: &str, severity: Severity) -> Record<'_> {
        Record::builder()
            .category(category)
            .severity(severity)
            .build()
    }

    #[test]
    fn test_unfiltered_dispatch_accepts_everything() {
        let dispatch = build_dispatch(|d| d.append(Testing::default()));
        assert!(dispatch.accepts(&record("anything", Severity::Fatal)));
    }

    #[test]
    fn test_filters_run_in_order() {
        let dispatch = build_dispatch(|d| {
            d.filter(CategoryFilter::new("logger"))
                .filter(FilterRules::only("logger", &[Severity::Info]))
                .append(Testing::default())
        });
        assert!(dispatch.accepts(&record("logger", Severity::Info)));
        assert!(!dispatch.accepts(&record("logger", Severity::Debug)));
        assert!(!dispatch.accepts(&record("network", Severity::Info)));

        // an accepting filter short-circuits the ones after it
        let dispatch = build_dispatch(|d| {
            d.filter(AcceptAll)
                .filter(CategoryFilter::new("logger"))
                .append(Testing::default())
        });
        assert!(dispatch.accepts(&record("network", Severity::Info)));
    }
}
