//! Free-text keyword editor: `#`-prefixed tokens separated by spaces, with
//! cursor-relative replacement for autocomplete.

use std::ops::Range;

use serde_json::Value;

use crate::error::{Error, Result};

pub const KEYWORD_PREFIX: char = '#';
/// Maximum token length in characters, prefix included.
pub const KEYWORD_MAX_LENGTH: usize = 20;

const SEPARATOR: char = ' ';

pub fn add_keyword_prefix(word: &str) -> String {
    if word.starts_with(KEYWORD_PREFIX) {
        word.to_string()
    } else {
        format!("{KEYWORD_PREFIX}{word}")
    }
}

pub fn enforce_keyword_max_length(word: &str) -> String {
    word.chars().take(KEYWORD_MAX_LENGTH).collect()
}

/// Accept a keyword coming from untyped input (JSON, form payloads).
pub fn keyword_arg(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| Error::msg("keyword must be string!"))
}

fn normalize_token(token: &str) -> String {
    enforce_keyword_max_length(&add_keyword_prefix(token))
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

// Alternating runs of separators and tokens, with their byte offsets.
fn segments(s: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut seg_start = 0;
    let mut prev_sep: Option<bool> = None;
    for (i, c) in s.char_indices() {
        let is_sep = c == SEPARATOR;
        if prev_sep.is_some_and(|p| p != is_sep) {
            out.push((seg_start, &s[seg_start..i]));
            seg_start = i;
        }
        prev_sep = Some(is_sep);
    }
    if seg_start < s.len() {
        out.push((seg_start, &s[seg_start..]));
    }
    out
}

/// Keyword text box state. Offsets are byte offsets into the buffer and
/// always sit on a char boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordInput {
    buffer: String,
    cursor: usize,
}

impl KeywordInput {
    /// Buffer with the cursor at the start.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            buffer: text.into(),
            cursor: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = floor_boundary(&self.buffer, pos);
    }

    pub fn cursor_to_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        let Some(prev) = self.buffer[..self.cursor].chars().next_back() else {
            return;
        };
        self.cursor -= prev.len_utf8();
        self.buffer.remove(self.cursor);
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.buffer[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.buffer[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    /// `[start, end)` of the token under the cursor. A cursor directly after
    /// a token belongs to it; a cursor between tokens belongs to the one
    /// before it, or the one after it when there is none before. `None` when
    /// the buffer holds no token.
    pub fn current_keyword_span(&self) -> Option<Range<usize>> {
        let cursor = self.cursor;
        let start = self.buffer[..cursor]
            .rfind(SEPARATOR)
            .map(|i| i + SEPARATOR.len_utf8())
            .unwrap_or(0);
        let end = self.buffer[cursor..]
            .find(SEPARATOR)
            .map(|i| cursor + i)
            .unwrap_or(self.buffer.len());
        if start < end {
            return Some(start..end);
        }

        let before = self.buffer[..cursor].trim_end_matches(SEPARATOR);
        if !before.is_empty() {
            let start = before
                .rfind(SEPARATOR)
                .map(|i| i + SEPARATOR.len_utf8())
                .unwrap_or(0);
            return Some(start..before.len());
        }
        let after = &self.buffer[cursor..];
        let start = cursor + after.find(|c| c != SEPARATOR)?;
        let end = self.buffer[start..]
            .find(SEPARATOR)
            .map(|i| start + i)
            .unwrap_or(self.buffer.len());
        Some(start..end)
    }

    /// The active token without its prefix; the autocomplete search text.
    pub fn current_keyword(&self) -> Option<&str> {
        let span = self.current_keyword_span()?;
        let token = &self.buffer[span];
        Some(token.strip_prefix(KEYWORD_PREFIX).unwrap_or(token))
    }

    /// Replace the active token with `new_word` (prefixed and capped).
    /// Whitespace inside `new_word` is dropped so the token count holds.
    pub fn update_keyword(&mut self, new_word: &str) {
        let compact: String = new_word.split_whitespace().collect();
        let word = normalize_token(&compact);
        match self.current_keyword_span() {
            Some(span) => {
                let start = span.start;
                self.buffer.replace_range(span, &word);
                self.cursor = start + word.len();
            }
            None => {
                self.cursor = word.len();
                self.buffer = word;
            }
        }
    }

    /// Prefix and cap every token, keeping the spacing between them. The
    /// cursor stays with the token it was in.
    pub fn normalize(&mut self) {
        let mut out = String::with_capacity(self.buffer.len() + 4);
        let mut new_cursor = None;
        for (start, seg) in segments(&self.buffer) {
            let out_start = out.len();
            let end = start + seg.len();
            if seg.starts_with(SEPARATOR) {
                out.push_str(seg);
                if new_cursor.is_none() && self.cursor >= start && self.cursor < end {
                    new_cursor = Some(out_start + (self.cursor - start));
                }
                continue;
            }
            let token = normalize_token(seg);
            let added = if seg.starts_with(KEYWORD_PREFIX) {
                0
            } else {
                KEYWORD_PREFIX.len_utf8()
            };
            if new_cursor.is_none() && self.cursor >= start && self.cursor <= end {
                let offset = floor_boundary(&token, self.cursor - start + added);
                new_cursor = Some(out_start + offset);
            }
            out.push_str(&token);
        }
        self.cursor = new_cursor.unwrap_or(out.len());
        self.buffer = out;
    }

    /// Tokens in order, including their prefix.
    pub fn tokens(&self) -> Vec<&str> {
        self.buffer
            .split(SEPARATOR)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Tokens in order without the prefix, as the backend stores them.
    pub fn keywords(&self) -> Vec<String> {
        self.tokens()
            .into_iter()
            .map(|t| t.strip_prefix(KEYWORD_PREFIX).unwrap_or(t).to_string())
            .collect()
    }
}
