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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use anyhow::bail;

/// A writer appending to one active file and rotating it by size.
///
/// The active file is `<filename>.<suffix>`; rotated files are `<filename>.<n>.<suffix>`, where
/// `1` is the most recent backup.
#[derive(Debug)]
pub struct RollingFileWriter {
    state: State,
    writer: File,
}

impl RollingFileWriter {
    /// The path of the active log file.
    pub fn current_path(&self) -> PathBuf {
        self.state.current_filename()
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.state.should_rollover_on_size(buf.len()) {
            self.state.refresh_writer(&mut self.writer);
        }

        self.writer
            .write(buf)
            .inspect(|&n| self.state.current_filesize += n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// A builder for configuring [`RollingFileWriter`].
#[derive(Debug, Clone)]
pub struct RollingFileWriterBuilder {
    // required
    basedir: PathBuf,
    filename: String,

    // has default
    filename_suffix: Option<String>,
    max_size: Option<NonZeroUsize>,
    max_backups: Option<usize>,
}

impl RollingFileWriterBuilder {
    /// Creates a new [`RollingFileWriterBuilder`].
    #[must_use]
    pub fn new(basedir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            basedir: basedir.into(),
            filename: filename.into(),
            filename_suffix: None,
            max_size: None,
            max_backups: None,
        }
    }

    /// Set the filename suffix, without the leading dot.
    #[must_use]
    pub fn filename_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.filename_suffix = if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        };
        self
    }

    /// Set the maximum size of a log file in bytes.
    ///
    /// Without a maximum size the active file is never rotated.
    #[must_use]
    pub fn max_file_size(mut self, n: NonZeroUsize) -> Self {
        self.max_size = Some(n);
        self
    }

    /// Set the maximum number of rotated files to keep besides the active one.
    #[must_use]
    pub fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = Some(n);
        self
    }

    /// Builds the [`RollingFileWriter`], creating the log directory and opening the active file.
    ///
    /// An existing active file is appended to.
    pub fn build(self) -> anyhow::Result<RollingFileWriter> {
        let Self {
            basedir,
            filename,
            filename_suffix,
            max_size,
            max_backups,
        } = self;

        if filename.is_empty() {
            bail!("filename must not be empty");
        }

        let (state, writer) =
            State::new(basedir, filename, filename_suffix, max_size, max_backups)?;
        Ok(RollingFileWriter { state, writer })
    }
}

#[derive(Debug)]
struct LogFile {
    filepath: PathBuf,
    count: usize,
}

#[derive(Debug)]
struct State {
    log_dir: PathBuf,
    log_filename: String,
    log_filename_suffix: Option<String>,
    current_filesize: usize,
    max_size: Option<NonZeroUsize>,
    max_backups: Option<usize>,
}

impl State {
    fn new(
        dir: impl AsRef<Path>,
        log_filename: String,
        log_filename_suffix: Option<String>,
        max_size: Option<NonZeroUsize>,
        max_backups: Option<usize>,
    ) -> anyhow::Result<(Self, File)> {
        let log_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir).with_context(|| {
            format!("failed to create log directory: {}", log_dir.display())
        })?;

        let mut state = State {
            log_dir,
            log_filename,
            log_filename_suffix,
            current_filesize: 0,
            max_size,
            max_backups,
        };

        let file = state.create_log_writer()?;
        let metadata = file.metadata().context("failed to read log file metadata")?;
        state.current_filesize = metadata.len() as usize;
        Ok((state, file))
    }

    fn current_filename(&self) -> PathBuf {
        let filename = &self.log_filename;
        match self.log_filename_suffix.as_ref() {
            None => self.log_dir.join(filename),
            Some(suffix) => self.log_dir.join(format!("{filename}.{suffix}")),
        }
    }

    fn backup_filename(&self, cnt: usize) -> PathBuf {
        let filename = &self.log_filename;
        match self.log_filename_suffix.as_ref() {
            None => self.log_dir.join(format!("{filename}.{cnt}")),
            Some(suffix) => self.log_dir.join(format!("{filename}.{cnt}.{suffix}")),
        }
    }

    fn create_log_writer(&self) -> anyhow::Result<File> {
        let filename = self.current_filename();
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&filename)
            .with_context(|| format!("failed to open log file: {}", filename.display()))
    }

    // rotated files only; the active file is not listed
    fn list_backups(&self) -> anyhow::Result<Vec<LogFile>> {
        let read_dir = fs::read_dir(&self.log_dir)
            .with_context(|| format!("failed to read log dir: {}", self.log_dir.display()))?;

        let files = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                // the writer only creates files, not directories or symlinks
                if !metadata.is_file() {
                    return None;
                }

                let filename = entry.file_name();
                // if the filename is not a UTF-8 string, skip it.
                let filename = filename.to_str()?;
                let mut rest = filename.strip_prefix(self.log_filename.as_str())?;
                if let Some(suffix) = &self.log_filename_suffix {
                    rest = rest.strip_suffix(suffix.as_str())?.strip_suffix('.')?;
                }

                let count = usize::from_str(rest.strip_prefix('.')?).ok()?;
                Some(LogFile {
                    filepath: entry.path(),
                    count,
                })
            })
            .collect::<Vec<_>>();

        Ok(files)
    }

    fn delete_oldest_logs(&self, max_backups: usize) -> anyhow::Result<()> {
        let mut files = self.list_backups()?;
        if files.len() <= max_backups {
            return Ok(());
        }

        // newest first
        files.sort_by_key(|file| file.count);
        for file in files.iter().skip(max_backups) {
            let filepath = &file.filepath;
            fs::remove_file(filepath)
                .with_context(|| format!("failed to remove old log: {}", filepath.display()))?;
        }

        Ok(())
    }

    fn rotate_log_writer(&self) -> anyhow::Result<File> {
        let mut renames = vec![];
        for i in 1..=self.max_backups.unwrap_or(usize::MAX) {
            let filepath = self.backup_filename(i);
            if fs::exists(&filepath).is_ok_and(|ok| ok) {
                let next = self.backup_filename(i + 1);
                renames.push((filepath, next));
            } else {
                break;
            }
        }

        for (old, new) in renames.iter().rev() {
            fs::rename(old, new)
                .with_context(|| format!("failed to rotate log: {}", old.display()))?;
        }

        let archive_filepath = self.backup_filename(1);
        let current_filepath = self.current_filename();
        fs::rename(&current_filepath, &archive_filepath).with_context(|| {
            format!("failed to archive log: {}", current_filepath.display())
        })?;

        if let Some(max_backups) = self.max_backups {
            if let Err(err) = self.delete_oldest_logs(max_backups) {
                eprintln!("failed to delete oldest logs: {err:#}");
            }
        }

        self.create_log_writer()
    }

    // on failure the current file keeps growing
    fn refresh_writer(&mut self, file: &mut File) {
        match self.rotate_log_writer() {
            Ok(new_file) => {
                if let Err(err) = file.flush() {
                    eprintln!("failed to flush previous writer: {err}");
                }
                *file = new_file;
                self.current_filesize = 0;
            }
            Err(err) => eprintln!("failed to rotate log writer: {err:#}"),
        }
    }

    // a write that would push a non-empty file past the limit goes to a fresh file
    fn should_rollover_on_size(&self, incoming: usize) -> bool {
        self.max_size.is_some_and(|n| {
            self.current_filesize > 0 && self.current_filesize + incoming > n.get()
        })
    }
}
