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

//! Logredirect redirects one log category into a size-rotated file, stamping each line with
//! the UTC time, while every other category passes through to the default handler unchanged.
//!
//! # Overview
//!
//! A [`LoggingContext`] owns an ordered chain of dispatches and a fallback. Every record is
//! checked against the context's [`FilterRules`](filter::FilterRules), then written by the
//! first dispatch accepting it, or by the fallback. The context implements [`log::Log`], so a
//! `log` target is a category.
//!
//! # Examples
//!
//! Redirect the `logger` category into `logfile.txt` with the default settings:
//!
//! ```no_run
//! let ctx = logredirect::init_logging();
//!
//! // appended to logfile.txt
//! log::info!(target: "logger", "disk full");
//! // dropped by the filter rules
//! log::warn!(target: "logger", "not written");
//! // printed to stderr
//! log::warn!(target: "network", "retrying");
//!
//! ctx.shutdown();
//! ```
//!
//! Custom setup:
//!
//! ```
//! use std::num::NonZeroUsize;
//!
//! use logredirect::LoggingContext;
//! use logredirect::RedirectConfig;
//!
//! let ctx = LoggingContext::default();
//! ctx.init(
//!     &RedirectConfig::default()
//!         .with_category("audit")
//!         .with_directory("logs")
//!         .with_max_file_size(NonZeroUsize::new(1024 * 1024).unwrap())
//!         .with_max_backups(3),
//! )
//! .unwrap();
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod filter;
pub mod layout;
pub mod record;
pub mod redirect;

pub use append::Append;
pub use filter::Filter;
pub use layout::Layout;
pub use redirect::RedirectConfig;
pub use redirect::init_logging;

mod logger;
pub use logger::*;
