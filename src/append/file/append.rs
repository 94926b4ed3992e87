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

use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Context;
use anyhow::anyhow;

use crate::append::Append;
use crate::append::file::rolling::RollingFileWriter;
use crate::append::file::rolling::RollingFileWriterBuilder;
use crate::layout::Layout;
use crate::layout::UtcStampLayout;
use crate::record::Record;

/// A builder to configure and create a [`RollingFile`] appender.
#[derive(Debug)]
pub struct FileBuilder {
    builder: RollingFileWriterBuilder,
    layout: Box<dyn Layout>,
}

impl FileBuilder {
    /// Create a new file appender builder.
    ///
    /// The active file is `basedir/filename` plus the optional [suffix](Self::filename_suffix).
    pub fn new(basedir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            builder: RollingFileWriterBuilder::new(basedir, filename),
            layout: Box::new(UtcStampLayout::default()),
        }
    }

    /// Build the [`RollingFile`] appender, opening the log file now.
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * The log directory cannot be created.
    /// * The log file cannot be opened.
    /// * The configured filename is empty.
    pub fn build(self) -> anyhow::Result<RollingFile> {
        let FileBuilder { builder, layout } = self;
        let writer = builder.build()?;
        Ok(RollingFile::new(Writer::Open(writer), layout))
    }

    /// Build the [`RollingFile`] appender, deferring opening the log file to the first record.
    ///
    /// Opening errors are returned from [`Append::append`]; the next record retries.
    pub fn build_lazy(self) -> RollingFile {
        let FileBuilder { builder, layout } = self;
        RollingFile::new(Writer::Pending(builder), layout)
    }

    /// Set the layout for the logs.
    ///
    /// Default to [`UtcStampLayout`].
    ///
    /// # Examples
    ///
    /// ```
    /// use logredirect::append::file::FileBuilder;
    /// use logredirect::layout::MessagePattern;
    ///
    /// let builder = FileBuilder::new("my_service", "my_app");
    /// builder.layout(MessagePattern::default());
    /// ```
    pub fn layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the rotation strategy to roll over the log file if it would exceed the given size.
    pub fn rollover_size(mut self, n: NonZeroUsize) -> Self {
        self.builder = self.builder.max_file_size(n);
        self
    }

    /// Set the filename suffix.
    pub fn filename_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.builder = self.builder.filename_suffix(suffix);
        self
    }

    /// Set the maximum number of rotated files to keep besides the active one.
    pub fn max_backups(mut self, n: usize) -> Self {
        self.builder = self.builder.max_backups(n);
        self
    }
}

#[derive(Debug)]
enum Writer {
    Pending(RollingFileWriterBuilder),
    Open(RollingFileWriter),
}

impl Writer {
    fn get_or_open(&mut self) -> anyhow::Result<&mut RollingFileWriter> {
        if let Writer::Pending(builder) = self {
            let writer = builder
                .clone()
                .build()
                .context("failed to create rolling file writer")?;
            *self = Writer::Open(writer);
        }

        match self {
            Writer::Open(writer) => Ok(writer),
            Writer::Pending(_) => Err(anyhow!("rolling file writer is not open")),
        }
    }
}

/// An appender that writes log records to a size-rotated file.
///
/// The writer is created at most once, under the same lock that serializes writes.
#[derive(Debug)]
pub struct RollingFile {
    writer: Mutex<Writer>,
    layout: Box<dyn Layout>,
}

impl RollingFile {
    fn new(writer: Writer, layout: Box<dyn Layout>) -> Self {
        let writer = Mutex::new(writer);
        Self { writer, layout }
    }

    fn writer(&self) -> MutexGuard<'_, Writer> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the log file has been opened.
    pub fn is_open(&self) -> bool {
        matches!(*self.writer(), Writer::Open(_))
    }

    /// The path of the active log file, once opened.
    pub fn current_path(&self) -> Option<PathBuf> {
        match &*self.writer() {
            Writer::Open(writer) => Some(writer.current_path()),
            Writer::Pending(_) => None,
        }
    }
}

impl Append for RollingFile {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');
        let mut writer = self.writer();
        writer
            .get_or_open()?
            .write_all(&bytes)
            .context("failed to write log file")?;
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Writer::Open(writer) = &mut *self.writer() {
            writer.flush().context("failed to flush log file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;
    use std::thread;

    use tempfile::TempDir;

    use super::*;
    use crate::layout::MessagePattern;

    #[test]
    fn test_lazy_open_on_first_record() {
        let temp_dir = TempDir::new().unwrap();
        let basedir = temp_dir.path().join("nested");

        let file = FileBuilder::new(&basedir, "logfile")
            .filename_suffix("txt")
            .layout(MessagePattern::new("%{message}"))
            .build_lazy();
        assert!(!file.is_open());
        assert!(!basedir.exists());

        file.append(&Record::builder().args(format_args!("first")).build())
            .unwrap();
        assert!(file.is_open());
        assert_eq!(file.current_path(), Some(basedir.join("logfile.txt")));
        assert_eq!(
            fs::read_to_string(basedir.join("logfile.txt")).unwrap(),
            "first\n"
        );
    }

    #[test]
    fn test_open_failure_is_retried() {
        let temp_dir = TempDir::new().unwrap();
        // a file where the log directory should be
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let file = FileBuilder::new(&blocker, "logfile").build_lazy();
        let record = Record::builder().args(format_args!("lost")).build();
        assert!(file.append(&record).is_err());
        assert!(!file.is_open());

        fs::remove_file(&blocker).unwrap();
        assert!(file.append(&record).is_ok());
        assert!(file.is_open());
    }

    #[test]
    fn test_eager_build_reports_errors() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        assert!(FileBuilder::new(&blocker, "logfile").build().is_err());
        assert!(FileBuilder::new(temp_dir.path(), "").build().is_err());

        let file = FileBuilder::new(temp_dir.path(), "logfile").build().unwrap();
        assert!(file.is_open());
    }

    #[test]
    fn test_concurrent_first_writes_share_one_writer() {
        let temp_dir = TempDir::new().unwrap();
        let file = Arc::new(
            FileBuilder::new(temp_dir.path(), "logfile")
                .filename_suffix("txt")
                .layout(MessagePattern::new("%{message}"))
                .build_lazy(),
        );

        let handles = (0..8)
            .map(|i| {
                let file = file.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        file.append(&Record::builder().args(format_args!("{i}-{j}")).build())
                            .unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }
        file.flush().unwrap();

        let content = fs::read_to_string(temp_dir.path().join("logfile.txt")).unwrap();
        assert_eq!(content.lines().count(), 8 * 50);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
