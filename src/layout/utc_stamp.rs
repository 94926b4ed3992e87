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

use std::fmt::Write;

use jiff::Timestamp;
use jiff::tz::TimeZone;

use crate::layout::Layout;
use crate::layout::MessagePattern;
use crate::record::Record;

/// `[yyyy-MM-dd h:mm:ss AM/PM] `, on a 12-hour clock without hour padding.
const STAMP_FORMAT: &str = "[%Y-%m-%d %-I:%M:%S %p] ";

/// A layout prefixing another layout's output with the record time in UTC.
///
/// Output format, with the default [`MessagePattern`]:
///
/// ```text
/// [2024-01-15 10:30:00 AM] (info)	x.cpp:42	{save}	disk full
/// [2024-01-15 1:05:09 PM] (debug)	x.cpp:57	{load}	cache miss
/// ```
///
/// # Examples
///
/// ```
/// use logredirect::layout::MessagePattern;
/// use logredirect::layout::UtcStampLayout;
///
/// let layout = UtcStampLayout::new(MessagePattern::new("%{message}"));
/// ```
#[derive(Debug)]
pub struct UtcStampLayout {
    inner: Box<dyn Layout>,
}

impl Default for UtcStampLayout {
    fn default() -> Self {
        UtcStampLayout::new(MessagePattern::default())
    }
}

impl UtcStampLayout {
    /// Prefix the output of `inner`.
    pub fn new(inner: impl Into<Box<dyn Layout>>) -> Self {
        UtcStampLayout {
            inner: inner.into(),
        }
    }

    /// Render the prefix for `time`, including its trailing space.
    ///
    /// # Examples
    ///
    /// ```
    /// use logredirect::layout::UtcStampLayout;
    ///
    /// let time = "2024-01-15T13:05:09Z".parse().unwrap();
    /// assert_eq!(UtcStampLayout::stamp(time).unwrap(), "[2024-01-15 1:05:09 PM] ");
    /// ```
    pub fn stamp(time: Timestamp) -> anyhow::Result<String> {
        let mut text = String::new();
        let time = time.to_zoned(TimeZone::UTC);
        write!(&mut text, "{}", time.strftime(STAMP_FORMAT))?;
        Ok(text)
    }
}

impl Layout for UtcStampLayout {
    fn format(&self, record: &Record) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Self::stamp(record.time())?.into_bytes();
        bytes.extend(self.inner.format(record)?);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Severity;

    fn stamp(s: &str) -> String {
        UtcStampLayout::stamp(s.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_stamp_twelve_hour_clock() {
        assert_eq!(stamp("2024-01-15T10:30:00Z"), "[2024-01-15 10:30:00 AM] ");
        assert_eq!(stamp("2024-01-15T00:00:07Z"), "[2024-01-15 12:00:07 AM] ");
        assert_eq!(stamp("2024-01-15T12:59:59Z"), "[2024-01-15 12:59:59 PM] ");
        assert_eq!(stamp("2024-12-31T23:01:02Z"), "[2024-12-31 11:01:02 PM] ");
        assert_eq!(stamp("2024-03-05T09:08:07Z"), "[2024-03-05 9:08:07 AM] ");
    }

    #[test]
    fn test_stamp_is_utc() {
        // 10:30 in UTC+08 is 02:30 UTC
        assert_eq!(stamp("2024-01-15T10:30:00+08:00"), "[2024-01-15 2:30:00 AM] ");
    }

    #[test]
    fn test_redirect_line() {
        let layout = UtcStampLayout::default();
        let bytes = layout
            .format(
                &Record::builder()
                    .time("2024-01-15T10:30:00Z".parse().unwrap())
                    .severity(Severity::Info)
                    .category("logger")
                    .file(Some("x.cpp"))
                    .line(Some(42))
                    .function(Some("save"))
                    .args(format_args!("disk full"))
                    .build(),
            )
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "[2024-01-15 10:30:00 AM] (info)\tx.cpp:42\t{save}\tdisk full"
        );
    }
}
