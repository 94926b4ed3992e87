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
use std::num::NonZeroUsize;
use std::path::Path;

use logredirect::Append;
use logredirect::append::file::FileBuilder;
use logredirect::layout::MessagePattern;
use logredirect::record::Record;
use tempfile::TempDir;

fn log_files(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| {
            let filename = entry.ok()?.file_name().to_str()?.to_string();
            filename.starts_with("logfile").then_some(filename)
        })
        .collect()
}

#[test]
fn test_file_count_limit() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    let max_backups = 3;

    let file = FileBuilder::new(temp_dir.path(), "logfile")
        .filename_suffix("txt")
        .layout(MessagePattern::new("%{message}"))
        .rollover_size(NonZeroUsize::new(100).unwrap())
        .max_backups(max_backups)
        .build()
        .unwrap();

    for i in 0..50 {
        let entry = format!("Log entry {i}: {}", "A".repeat(50));
        file.append(&Record::builder().args(format_args!("{entry}")).build())
            .unwrap();
    }
    file.flush().unwrap();

    let files = log_files(temp_dir.path());
    assert_eq!(files.len(), max_backups + 1, "{files:?}");

    // the newest entries survive
    let active = fs::read_to_string(temp_dir.path().join("logfile.txt")).unwrap();
    assert!(active.ends_with("Log entry 49: AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\n"));
    let newest_backup = fs::read_to_string(temp_dir.path().join("logfile.1.txt")).unwrap();
    assert!(newest_backup.starts_with("Log entry 48: "), "{newest_backup}");
}

// backups left by a run that kept more files are trimmed on the first rotation
#[test]
fn test_stale_backups_are_trimmed() {
    let temp_dir = TempDir::new().expect("failed to create a temporary directory");
    for i in 1..=12 {
        fs::write(temp_dir.path().join(format!("logfile.{i}.txt")), "stale\n").unwrap();
    }

    let file = FileBuilder::new(temp_dir.path(), "logfile")
        .filename_suffix("txt")
        .layout(MessagePattern::new("%{message}"))
        .rollover_size(NonZeroUsize::new(10).unwrap())
        .max_backups(2)
        .build_lazy();

    // nothing is touched until the first record
    assert_eq!(log_files(temp_dir.path()).len(), 12);

    for message in ["first run", "second run"] {
        file.append(&Record::builder().args(format_args!("{message}")).build())
            .unwrap();
    }

    let mut files = log_files(temp_dir.path());
    files.sort();
    assert_eq!(files, ["logfile.1.txt", "logfile.2.txt", "logfile.txt"]);
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("logfile.1.txt")).unwrap(),
        "first run\n"
    );
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("logfile.2.txt")).unwrap(),
        "stale\n"
    );
}
