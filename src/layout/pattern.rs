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

use crate::layout::Layout;
use crate::record::Record;

/// The pattern used unless configured otherwise.
///
/// ```text
/// (info)	src/storage.rs:42	{storage::save}	disk full
/// ```
pub const DEFAULT_MESSAGE_PATTERN: &str = "(%{type})\t%{file}:%{line}\t{%{function}}\t%{message}";

const UNKNOWN: &str = "unknown";

/// A layout rendering records through a `%{placeholder}` pattern.
///
/// Supported placeholders:
///
/// | Placeholder   | Rendered as                                   |
/// |---------------|-----------------------------------------------|
/// | `%{type}`     | the severity: `debug`, `info`, `warning`, ... |
/// | `%{category}` | the category name                             |
/// | `%{file}`     | the source file, or `unknown`                 |
/// | `%{line}`     | the source line, or `0`                       |
/// | `%{function}` | the enclosing function, or `unknown`          |
/// | `%{message}`  | the message body                              |
/// | `%{pid}`      | the current process id                        |
///
/// Anything else, including unknown placeholders, is copied verbatim.
///
/// # Examples
///
/// ```
/// use logredirect::layout::MessagePattern;
///
/// let layout = MessagePattern::new("%{category}: %{message}");
/// assert_eq!(layout.as_str(), "%{category}: %{message}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePattern {
    pattern: String,
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Type,
    Category,
    File,
    Line,
    Function,
    Message,
    Pid,
}

impl Default for MessagePattern {
    fn default() -> Self {
        MessagePattern::new(DEFAULT_MESSAGE_PATTERN)
    }
}

impl MessagePattern {
    /// Compile a pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let tokens = tokenize(&pattern);
        MessagePattern { pattern, tokens }
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    fn render(&self, record: &Record, text: &mut String) -> std::fmt::Result {
        for token in &self.tokens {
            match token {
                Token::Literal(s) => text.push_str(s),
                Token::Type => text.push_str(record.severity().as_str()),
                Token::Category => text.push_str(record.category()),
                Token::File => text.push_str(record.file().unwrap_or(UNKNOWN)),
                Token::Line => write!(text, "{}", record.line().unwrap_or_default())?,
                Token::Function => text.push_str(record.function().unwrap_or(UNKNOWN)),
                Token::Message => write!(text, "{}", record.args())?,
                Token::Pid => write!(text, "{}", std::process::id())?,
            }
        }
        Ok(())
    }
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = vec![];
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(start) = rest.find("%{") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };

        literal.push_str(&rest[..start]);
        let placeholder = &rest[start..start + len + 1];
        let token = match &placeholder[2..placeholder.len() - 1] {
            "type" => Token::Type,
            "category" => Token::Category,
            "file" => Token::File,
            "line" => Token::Line,
            "function" => Token::Function,
            "message" => Token::Message,
            "pid" => Token::Pid,
            _ => {
                literal.push_str(placeholder);
                rest = &rest[start + len + 1..];
                continue;
            }
        };

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
        rest = &rest[start + len + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

impl Layout for MessagePattern {
    fn format(&self, record: &Record) -> anyhow::Result<Vec<u8>> {
        let mut text = String::new();
        self.render(record, &mut text)?;
        Ok(text.into_bytes())
    }
}
