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
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use log::LevelFilter;

use crate::append::Stderr;
use crate::filter::CategoryFilter;
use crate::filter::EnvFilter;
use crate::filter::FilterRules;
use crate::logger::dispatch::Dispatch;
use crate::logger::dispatch::DispatchBuilder;
use crate::logger::dispatch::build_dispatch;
use crate::record::Record;
use crate::record::Severity;
use crate::redirect::RedirectConfig;

/// The logging state of a process: filter rules, a chain of handlers and a fallback.
///
/// Each record is first checked against the [`FilterRules`]; a disabled record is dropped.
/// Otherwise the record walks the registered [`Dispatch`]es in registration order and is
/// written by the first one that accepts it. Records no dispatch accepts go to the fallback,
/// if its own filters accept them.
///
/// No lock is held while a dispatch writes, so appenders and `Display` impls may log again.
///
/// The context is a cheap handle: clones share the same state. It implements [`log::Log`] so
/// that it can be installed as the global logger with [`apply`](Self::apply).
///
/// # Examples
///
/// ```
/// use logredirect::LoggingContext;
/// use logredirect::append;
/// use logredirect::filter::CategoryFilter;
/// use logredirect::record::Record;
///
/// let ctx = LoggingContext::new(|d| d.append(append::Stderr::default()));
/// ctx.register(|d| {
///     d.filter(CategoryFilter::new("audit"))
///         .append(append::Stdout::default())
/// });
///
/// // goes to stdout
/// ctx.log(&Record::builder().category("audit").args(format_args!("login")).build());
/// // goes to stderr
/// ctx.log(&Record::builder().category("net").args(format_args!("up")).build());
/// ```
#[derive(Debug, Clone)]
pub struct LoggingContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    handlers: RwLock<Vec<Arc<Dispatch>>>,
    fallback: Dispatch,
    rules: RwLock<FilterRules>,
}

impl Default for LoggingContext {
    /// A context falling back to stderr, filtered by the `RUST_LOG` directives.
    fn default() -> Self {
        LoggingContext::new(|d| {
            d.filter(EnvFilter::from_default_env_or("trace"))
                .append(Stderr::default())
        })
    }
}

impl LoggingContext {
    /// Create a context with no handler registered and the given fallback dispatch.
    pub fn new<F>(fallback: F) -> Self
    where
        F: FnOnce(DispatchBuilder<false>) -> DispatchBuilder<true>,
    {
        let inner = ContextInner {
            handlers: RwLock::new(vec![]),
            fallback: build_dispatch(fallback),
            rules: RwLock::new(FilterRules::new()),
        };
        LoggingContext {
            inner: Arc::new(inner),
        }
    }

    fn handlers(&self) -> RwLockReadGuard<'_, Vec<Arc<Dispatch>>> {
        self.inner.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn handlers_mut(&self) -> RwLockWriteGuard<'_, Vec<Arc<Dispatch>>> {
        self.inner.handlers.write().unwrap_or_else(|e| e.into_inner())
    }

    fn rules(&self) -> RwLockReadGuard<'_, FilterRules> {
        self.inner.rules.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a dispatch after the already registered ones, ahead of the fallback.
    pub fn register<F>(&self, f: F)
    where
        F: FnOnce(DispatchBuilder<false>) -> DispatchBuilder<true>,
    {
        let dispatch = Arc::new(build_dispatch(f));
        self.handlers_mut().push(dispatch);
    }

    /// Install the redirect described by `config`.
    ///
    /// Records of `config.category()` are claimed by a dispatch writing them to a lazily
    /// created [`RollingFile`](crate::append::file::RollingFile); the configured filter rules
    /// are added after the context's existing ones. Other categories keep reaching the
    /// fallback.
    ///
    /// # Errors
    ///
    /// Return an error if the configured rules cannot be parsed. Nothing is installed then.
    pub fn init(&self, config: &RedirectConfig) -> anyhow::Result<()> {
        let rules = config.filter_rules()?;
        let sink = config.file_builder().build_lazy();
        let category = config.category().to_string();
        self.register(|d| d.filter(CategoryFilter::new(category)).append(sink));
        self.add_filter_rules(rules);
        Ok(())
    }

    /// Replace the filter rules applied before any handler sees a record.
    pub fn set_filter_rules(&self, rules: FilterRules) {
        *self.inner.rules.write().unwrap_or_else(|e| e.into_inner()) = rules;
    }

    /// Add rules after the current ones. Being later, they win over earlier rules.
    pub fn add_filter_rules(&self, rules: FilterRules) {
        self.inner
            .rules
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .extend(rules);
    }

    /// Whether at least one dispatch is registered besides the fallback.
    pub fn is_installed(&self) -> bool {
        !self.handlers().is_empty()
    }

    /// Route one record through the chain.
    ///
    /// Append failures are reported on stderr and never returned to the caller.
    pub fn log(&self, record: &Record) {
        if !self.rules().enabled(record.category(), record.severity()) {
            return;
        }

        // released before appending: formatting may log through this context again
        let claimed = self
            .handlers()
            .iter()
            .find(|dispatch| dispatch.accepts(record))
            .cloned();

        let result = match claimed {
            Some(dispatch) => dispatch.append(record),
            None if self.inner.fallback.accepts(record) => self.inner.fallback.append(record),
            None => return,
        };
        if let Err(err) = result {
            handle_log_error(record, err);
        }
    }

    /// Whether a record of `severity` under `category` would be written anywhere.
    pub fn enabled(&self, category: &str, severity: Severity) -> bool {
        if !self.rules().enabled(category, severity) {
            return false;
        }

        let query = Record::builder()
            .category(category)
            .severity(severity)
            .build();
        self.handlers().iter().any(|dispatch| dispatch.accepts(&query))
            || self.inner.fallback.accepts(&query)
    }

    /// Flush every handler and the fallback.
    pub fn flush(&self) {
        let handlers = self.handlers().clone();
        for dispatch in handlers {
            if let Err(err) = dispatch.flush() {
                handle_flush_error(err);
            }
        }
        if let Err(err) = self.inner.fallback.flush() {
            handle_flush_error(err);
        }
    }

    /// Flush and remove every registered handler and reset the filter rules.
    ///
    /// Afterwards every record reaches the fallback, as before any registration.
    pub fn shutdown(&self) {
        self.flush();
        self.handlers_mut().clear();
        self.set_filter_rules(FilterRules::new());
    }

    /// Install this context as the global [`log`] logger.
    ///
    /// The context stays usable through this handle; `shutdown` on any clone affects the
    /// global logger too.
    ///
    /// # Errors
    ///
    /// Return an error if a global logger has already been set.
    pub fn apply(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }
}

impl log::Log for LoggingContext {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        LoggingContext::enabled(self, metadata.target(), metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let record = Record::builder()
            .args(*record.args())
            .severity(record.level().into())
            .category(record.target())
            .file(record.file())
            .line(record.line())
            .function(record.module_path())
            .build();
        LoggingContext::log(self, &record);
    }

    fn flush(&self) {
        LoggingContext::flush(self);
    }
}

fn handle_log_error(record: &Record, error: anyhow::Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
"###,
        args = record.args(),
        record = record,
        error = error,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular logging.
    Attempted to log: {args}
    Record: {record:?}
    Error: {error:?}
    Fallback error: {fallback_error}
"###,
        args = record.args(),
        record = record,
        error = error,
        fallback_error = fallback_error,
    );
}

fn handle_flush_error(error: anyhow::Error) {
    let Err(fallback_error) = write!(
        std::io::stderr(),
        r###"
Error perform flush.
    Error: {error:?}
"###,
    ) else {
        return;
    };

    panic!(
        r###"
Error performing stderr logging after error occurred during regular flush.
    Error: {error:?}
    Fallback error: {fallback_error}
"###,
    );
}
