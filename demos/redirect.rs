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

use std::num::NonZeroUsize;

use logredirect::LoggingContext;
use logredirect::RedirectConfig;
use logredirect::append;
use logredirect::filter::CategoryFilter;

fn main() {
    let ctx = LoggingContext::default();
    ctx.init(
        &RedirectConfig::default()
            .with_directory("logs")
            .with_max_file_size(NonZeroUsize::new(1024 * 1024).unwrap())
            .with_max_backups(3),
    )
    .unwrap();
    // a second category printed to stdout
    ctx.register(|d| {
        d.filter(CategoryFilter::new("audit"))
            .append(append::Stdout::default())
    });
    ctx.apply().unwrap();

    let repeat = 1;

    for i in 0..repeat {
        log::error!(target: "logger", "Hello error!");
        log::warn!(target: "logger", "Hello warn!");
        log::info!(target: "logger", "Hello info!");
        log::debug!(target: "logger", "Hello debug!");
        log::trace!(target: "logger", "Hello trace!");

        log::info!(target: "audit", "Hello audit!");
        log::warn!("Hello stderr!");

        if i + 1 < repeat {
            std::thread::sleep(std::time::Duration::from_secs(10));
        }
    }

    ctx.shutdown();
}
