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

use std::borrow::Cow;

use crate::filter::Filter;
use crate::filter::FilterResult;
use crate::record::Record;

/// A filter that passes records whose category equals the given name exactly.
///
/// Sub-categories do not match: a filter for `logger` rejects `logger.sql`.
///
/// # Examples
///
/// ```
/// use logredirect::filter::CategoryFilter;
///
/// let filter = CategoryFilter::new("logger");
/// ```
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    category: Cow<'static, str>,
}

impl CategoryFilter {
    /// Create a filter for the named category.
    pub fn new(category: impl Into<Cow<'static, str>>) -> Self {
        CategoryFilter {
            category: category.into(),
        }
    }

    /// The category this filter passes.
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl Filter for CategoryFilter {
    fn matches(&self, record: &Record) -> FilterResult {
        if record.category() == self.category {
            FilterResult::Neutral
        } else {
            FilterResult::Reject
        }
    }
}
