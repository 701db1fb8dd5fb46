/*
 * meta.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Parser for directive-like options in a block's meta string.
 */

//! Meta string options.
//!
//! A fence such as ` ```js title="app.js" {2-3} ins="new" wrap ` carries the
//! meta string `title="app.js" {2-3} ins="new" wrap`. [`MetaOptions::parse`]
//! splits it into options:
//!
//! | Syntax             | Key       | Value                          |
//! |--------------------|-----------|--------------------------------|
//! | `key=value`        | `key`     | string, or boolean for `true`/`false` |
//! | `key="quoted"`     | `key`     | string (`'` also works)        |
//! | `key={1, 3-5}`     | `key`     | line ranges                    |
//! | `key=/re/i`        | `key`     | regex source and flags         |
//! | `"quoted"`         | none      | string                         |
//! | `{1, 3-5}`         | none      | line ranges                    |
//! | `/re/`             | none      | regex                          |
//! | `flag`             | `flag`    | boolean `true`                 |
//!
//! Parsing never fails: an unterminated quote, range or regex extends to the
//! end of the input, and unparsable range items are skipped.

use std::iter::Peekable;
use std::str::Chars;

/// An inclusive, 1-based range of lines as written in meta (`{3-5}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    /// Whether the zero-based line index falls in this range.
    pub fn contains_index(&self, index: usize) -> bool {
        let line = index + 1;
        line >= self.start && line <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    String(String),
    Boolean(bool),
    Ranges(Vec<LineRange>),
    Regex { pattern: String, flags: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaOption {
    /// `None` for bare strings, ranges and regexes
    pub key: Option<String>,
    pub value: MetaValue,
}

/// The options of one meta string, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaOptions {
    options: Vec<MetaOption>,
}

impl MetaOptions {
    pub fn parse(meta: &str) -> Self {
        let mut options = Vec::new();
        let mut chars = meta.chars().peekable();

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let Some(&c) = chars.peek() else {
                break;
            };
            let option = match c {
                '"' | '\'' | '{' | '/' => MetaOption {
                    key: None,
                    value: read_value(&mut chars),
                },
                _ => {
                    let key: String = read_while(&mut chars, |c| !c.is_whitespace() && c != '=');
                    if chars.next_if_eq(&'=').is_some() {
                        MetaOption {
                            key: Some(key),
                            value: read_value(&mut chars),
                        }
                    } else {
                        MetaOption {
                            key: Some(key),
                            value: MetaValue::Boolean(true),
                        }
                    }
                }
            };
            options.push(option);
        }

        Self { options }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetaOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn values_for<'s>(&'s self, key: Option<&str>) -> impl Iterator<Item = &'s MetaValue> {
        self.options
            .iter()
            .filter(move |o| o.key.as_deref() == key)
            .map(|o| &o.value)
    }

    /// The last string value of `key`.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get_strings(key).last()
    }

    /// Every string value of `key`.
    pub fn get_strings<'s>(&'s self, key: &str) -> impl Iterator<Item = &'s str> {
        self.values_for(Some(key)).filter_map(|v| match v {
            MetaValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// The last boolean value of `key`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values_for(Some(key))
            .filter_map(|v| match v {
                MetaValue::Boolean(b) => Some(*b),
                _ => None,
            })
            .last()
    }

    /// All line ranges given for `key`, or for bare `{…}` when `key` is `None`.
    pub fn get_ranges(&self, key: Option<&str>) -> Vec<LineRange> {
        self.values_for(key)
            .filter_map(|v| match v {
                MetaValue::Ranges(r) => Some(r.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// All regex values for `key`, or for bare `/…/` when `key` is `None`.
    pub fn get_regexes<'s>(&'s self, key: Option<&str>) -> impl Iterator<Item = (&'s str, &'s str)> {
        self.values_for(key).filter_map(|v| match v {
            MetaValue::Regex { pattern, flags } => Some((pattern.as_str(), flags.as_str())),
            _ => None,
        })
    }

    /// Bare quoted strings.
    pub fn unkeyed_strings(&self) -> impl Iterator<Item = &str> {
        self.values_for(None).filter_map(|v| match v {
            MetaValue::String(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

fn read_while(chars: &mut Peekable<Chars<'_>>, pred: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(c) = chars.next_if(|c| pred(*c)) {
        out.push(c);
    }
    out
}

fn read_value(chars: &mut Peekable<Chars<'_>>) -> MetaValue {
    match chars.peek() {
        Some('"' | '\'') => MetaValue::String(read_quoted(chars)),
        Some('{') => MetaValue::Ranges(read_ranges(chars)),
        Some('/') => read_regex(chars),
        _ => {
            let word = read_while(chars, |c| !c.is_whitespace());
            match word.as_str() {
                "true" => MetaValue::Boolean(true),
                "false" => MetaValue::Boolean(false),
                _ => MetaValue::String(word),
            }
        }
    }
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> String {
    let Some(quote) = chars.next() else {
        return String::new();
    };
    let mut out = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            c if c == quote => break,
            c => out.push(c),
        }
    }
    out
}

fn read_ranges(chars: &mut Peekable<Chars<'_>>) -> Vec<LineRange> {
    chars.next();
    let body = read_while(chars, |c| c != '}');
    chars.next();
    body.split(',').filter_map(parse_range).collect()
}

fn parse_range(item: &str) -> Option<LineRange> {
    let item = item.trim();
    let (start, end): (usize, usize) = match item.split_once('-') {
        Some((start, end)) => (start.trim().parse().ok()?, end.trim().parse().ok()?),
        None => {
            let line = item.parse().ok()?;
            (line, line)
        }
    };
    Some(LineRange {
        start: usize::min(start, end),
        end: usize::max(start, end),
    })
}

fn read_regex(chars: &mut Peekable<Chars<'_>>) -> MetaValue {
    chars.next();
    let mut pattern = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('/') => pattern.push('/'),
                Some(other) => {
                    pattern.push('\\');
                    pattern.push(other);
                }
                None => pattern.push('\\'),
            },
            '/' => break,
            c => pattern.push(c),
        }
    }
    let flags = read_while(chars, |c| c.is_ascii_alphabetic());
    MetaValue::Regex { pattern, flags }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_options() {
        let meta = MetaOptions::parse(r#"title="src/app.js" {2, 4-5} ins="new value" wrap"#);
        assert_eq!(meta.len(), 4);
        assert_eq!(meta.get_string("title"), Some("src/app.js"));
        assert_eq!(meta.get_string("ins"), Some("new value"));
        assert_eq!(meta.get_bool("wrap"), Some(true));
        assert_eq!(
            meta.get_ranges(None),
            vec![
                LineRange { start: 2, end: 2 },
                LineRange { start: 4, end: 5 }
            ]
        );
    }

    #[test]
    fn test_keyed_ranges_and_booleans() {
        let meta = MetaOptions::parse("del={1-3, x, 7} showLineNumbers=false frame=none");
        assert_eq!(
            meta.get_ranges(Some("del")),
            vec![
                LineRange { start: 1, end: 3 },
                LineRange { start: 7, end: 7 }
            ]
        );
        assert_eq!(meta.get_bool("showLineNumbers"), Some(false));
        assert_eq!(meta.get_string("frame"), Some("none"));
    }

    #[test]
    fn test_quotes_and_escapes() {
        let meta = MetaOptions::parse(r#"'single quoted' mark="say \"hi\"" "bare""#);
        let bare: Vec<&str> = meta.unkeyed_strings().collect();
        assert_eq!(bare, vec!["single quoted", "bare"]);
        assert_eq!(meta.get_string("mark"), Some(r#"say "hi""#));
    }

    #[test]
    fn test_regex_values() {
        let meta = MetaOptions::parse(r"mark=/ye[sp]/i /a\/b/");
        let keyed: Vec<(&str, &str)> = meta.get_regexes(Some("mark")).collect();
        assert_eq!(keyed, vec![("ye[sp]", "i")]);
        let bare: Vec<(&str, &str)> = meta.get_regexes(None).collect();
        assert_eq!(bare, vec![("a/b", "")]);
    }

    #[test]
    fn test_repeated_keys_are_all_kept() {
        let meta = MetaOptions::parse(r#"mark="a" mark="b""#);
        let values: Vec<&str> = meta.get_strings("mark").collect();
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(meta.get_string("mark"), Some("b"));
    }

    #[test]
    fn test_unterminated_input() {
        let meta = MetaOptions::parse(r#"title="never closed"#);
        assert_eq!(meta.get_string("title"), Some("never closed"));
        assert!(MetaOptions::parse("   ").is_empty());
    }

    #[test]
    fn test_line_range_contains_index() {
        let range = LineRange { start: 2, end: 3 };
        assert!(!range.contains_index(0));
        assert!(range.contains_index(1));
        assert!(range.contains_index(2));
        assert!(!range.contains_index(3));
    }
}
