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

//! Exercises `init_logging` as the global logger.
//!
//! The redirect writes into the working directory, so this test runs without the default
//! harness: it owns the process and changes directory once.

use std::fs;
use std::path::Path;

use jiff::Timestamp;
use logredirect::RedirectConfig;
use logredirect::layout::UtcStampLayout;

const ACTIVE: &str = "logfile.txt";
const BACKUP: &str = "logfile.1.txt";
const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

fn read_lines(path: &str) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => content.lines().map(str::to_string).collect(),
        Err(_) => vec![],
    }
}

fn log_files() -> Vec<String> {
    let mut files = fs::read_dir(".")
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("logfile"))
        .collect::<Vec<_>>();
    files.sort();
    files
}

/// Whether `line` starts with the stamp of a second within two seconds of `[before, after]`.
fn stamped_between(line: &str, before: Timestamp, after: Timestamp) -> bool {
    (before.as_second() - 2..=after.as_second() + 2).any(|second| {
        let time = Timestamp::from_second(second).unwrap();
        line.starts_with(&UtcStampLayout::stamp(time).unwrap())
    })
}

fn test_passthrough_and_filtering() {
    assert!(log::log_enabled!(target: "logger", log::Level::Debug));
    assert!(log::log_enabled!(target: "logger", log::Level::Info));
    assert!(!log::log_enabled!(target: "logger", log::Level::Warn));
    assert!(!log::log_enabled!(target: "logger", log::Level::Error));

    // other categories go to stderr
    log::warn!(target: "network", "passthrough");
    // disabled pairs are written nowhere
    log::info!(target: "logger.sql", "dropped");
    log::warn!(target: "logger", "dropped");
    log::error!(target: "logger", "dropped");

    // the sink only exists once it writes
    assert!(!Path::new(ACTIVE).exists());
}

fn test_redirected_line() {
    let before = Timestamp::now();
    let line = line!() + 1;
    log::info!(target: "logger", "disk full");
    let after = Timestamp::now();
    log::debug!(target: "logger", "cache miss");
    log::trace!(target: "logger", "verbose");
    log::logger().flush();

    let lines = read_lines(ACTIVE);
    assert_eq!(lines.len(), 3, "{lines:?}");

    let expected =
        format!("(info)\ttests/global_redirect.rs:{line}\t{{global_redirect}}\tdisk full");
    assert!(lines[0].ends_with(&expected), "{lines:?}");
    assert!(stamped_between(&lines[0], before, after), "{lines:?}");
    assert!(lines[1].contains("] (debug)\t"), "{lines:?}");
    assert!(lines[1].ends_with("\tcache miss"), "{lines:?}");
    assert!(lines[2].ends_with("\tverbose"), "{lines:?}");
    assert!(lines.iter().all(|line| !line.contains("dropped")));
}

fn test_rotation() {
    let payload = "x".repeat(1000);
    let mut written = 0;
    while written <= 2 * MAX_FILE_SIZE {
        log::info!(target: "logger", "{payload}");
        written += payload.len() as u64;
    }
    log::logger().flush();

    assert_eq!(log_files(), [BACKUP, ACTIVE]);
    for file in [ACTIVE, BACKUP] {
        let size = fs::metadata(file).unwrap().len();
        assert!(size <= MAX_FILE_SIZE, "{file} has {size} bytes");
    }
    // the earliest segment has been discarded
    assert!(read_lines(BACKUP).iter().all(|line| !line.ends_with("disk full")));
    assert!(read_lines(ACTIVE).iter().all(|line| !line.ends_with("disk full")));
}

fn test_double_registration(ctx: &logredirect::LoggingContext) {
    ctx.init(&RedirectConfig::default()).unwrap();

    log::info!(target: "logger", "registered twice");
    log::logger().flush();

    let count = [ACTIVE, BACKUP]
        .iter()
        .flat_map(|file| read_lines(file))
        .filter(|line| line.ends_with("registered twice"))
        .count();
    assert_eq!(count, 1);
    assert_eq!(log_files(), [BACKUP, ACTIVE]);
}

fn test_shutdown(ctx: &logredirect::LoggingContext) {
    ctx.shutdown();
    assert!(!ctx.is_installed());

    log::info!(target: "logger", "after shutdown");
    let count = [ACTIVE, BACKUP]
        .iter()
        .flat_map(|file| read_lines(file))
        .filter(|line| line.ends_with("after shutdown"))
        .count();
    assert_eq!(count, 0);
}

fn main() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::env::set_current_dir(temp_dir.path()).unwrap();

    let ctx = logredirect::init_logging();
    assert!(ctx.is_installed());

    test_passthrough_and_filtering();
    test_redirected_line();
    test_rotation();
    test_double_registration(&ctx);
    test_shutdown(&ctx);
}
