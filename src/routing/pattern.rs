//! Route pattern parsing and compilation.
//!
//! Syntax:
//!
//! - `/users` - static text
//! - `/users/{id}` - placeholder matching `[^/]+`
//! - `/users/{id:\d+}` - placeholder with a custom regex (no capturing groups)
//! - `/users/{id}[/{slug}]` - trailing optional part; optionals may nest,
//!   as in `/archive[/{year}[/{month}]]`
//!
//! A pattern expands into one [`Variant`] per optional level. Variants made
//! only of static text are looked up by exact match, the rest are compiled
//! into anchored regexes.

use regex::Regex;

use crate::core::{Error, Result};

/// Regex used when a placeholder does not specify one.
pub const DEFAULT_PLACEHOLDER_REGEX: &str = "[^/]+";

/// One piece of a route variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Placeholder { name: String, regex: String },
}

/// A single concrete route shape produced by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    segments: Vec<Segment>,
}

impl Variant {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The literal path when the variant has no placeholders.
    pub fn as_static(&self) -> Option<String> {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Static(text) => Some(text.as_str()),
                Segment::Placeholder { .. } => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat())
    }

    /// Regex source (unanchored) plus placeholder names in capture order.
    pub fn regex_source(&self) -> Result<(String, Vec<String>)> {
        let mut source = String::new();
        let mut names: Vec<String> = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Static(text) => source.push_str(&regex::escape(text)),
                Segment::Placeholder { name, regex } => {
                    if names.iter().any(|n| n == name) {
                        return Err(Error::RouteDefinition(format!(
                            "Cannot use the same placeholder \"{}\" twice",
                            name
                        )));
                    }
                    if has_capturing_groups(regex)? {
                        return Err(Error::RouteDefinition(format!(
                            "Regex \"{}\" for parameter \"{}\" contains a capturing group",
                            regex, name
                        )));
                    }
                    names.push(name.clone());
                    source.push('(');
                    source.push_str(regex);
                    source.push(')');
                }
            }
        }

        Ok((source, names))
    }

    /// Compile into an anchored regex.
    pub fn compile(&self) -> Result<CompiledVariant> {
        let (source, names) = self.regex_source()?;
        let regex = Regex::new(&format!("^{}$", source)).map_err(|e| {
            Error::RouteDefinition(format!("Invalid route regex \"{}\": {}", source, e))
        })?;
        Ok(CompiledVariant {
            source,
            regex,
            names,
        })
    }
}

/// A variable variant ready for matching.
#[derive(Debug, Clone)]
pub struct CompiledVariant {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl CompiledVariant {
    /// Unanchored regex source, used for duplicate detection.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Captured placeholder values by name.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = caps.get(i + 1).map(|m| m.as_str()).unwrap_or("");
                    (name.clone(), value.to_string())
                })
                .collect(),
        )
    }
}

/// Expand a pattern into its variants, shortest first.
pub fn parse(route: &str) -> Result<Vec<Variant>> {
    let without_closing = route.trim_end_matches(']');
    let num_optionals = route.len() - without_closing.len();

    let mut parts: Vec<&str> = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut stray_close = false;

    for (i, c) in without_closing.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '[' if depth == 0 => {
                parts.push(&without_closing[start..i]);
                start = i + 1;
            }
            ']' if depth == 0 => stray_close = true,
            _ => {}
        }
    }
    parts.push(&without_closing[start..]);

    if num_optionals != parts.len() - 1 {
        return Err(Error::RouteDefinition(if stray_close {
            "Optional segments can only occur at the end of a route".to_string()
        } else {
            "Number of opening '[' and closing ']' does not match".to_string()
        }));
    }

    let mut current = String::new();
    let mut variants = Vec::with_capacity(parts.len());
    for (n, part) in parts.iter().enumerate() {
        if part.is_empty() && n != 0 {
            return Err(Error::RouteDefinition("Empty optional part".to_string()));
        }
        current.push_str(part);
        variants.push(Variant {
            segments: parse_placeholders(&current),
        });
    }

    Ok(variants)
}

/// Split one optional-free route into static text and placeholders.
fn parse_placeholders(route: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = route;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open..];

        match read_placeholder(after) {
            Some((name, regex, consumed)) => {
                if !text.is_empty() {
                    segments.push(Segment::Static(std::mem::take(&mut text)));
                }
                segments.push(Segment::Placeholder { name, regex });
                rest = &after[consumed..];
            }
            None => {
                // Not a placeholder; keep the brace as literal text
                text.push('{');
                rest = &after[1..];
            }
        }
    }
    text.push_str(rest);

    if !text.is_empty() {
        segments.push(Segment::Static(text));
    }
    segments
}

/// Parse `{name}` or `{name:regex}` at the start of `input`. Braces inside
/// the regex (e.g. `\d{4}`) must balance.
fn read_placeholder(input: &str) -> Option<(String, String, usize)> {
    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    let inner = &input[1..end];

    let (name, regex) = match inner.split_once(':') {
        Some((name, regex)) => (name.trim(), regex.trim()),
        None => (inner.trim(), DEFAULT_PLACEHOLDER_REGEX),
    };

    if !is_valid_name(name) || regex.is_empty() {
        return None;
    }

    Some((name.to_string(), regex.to_string(), end + 1))
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn has_capturing_groups(regex: &str) -> Result<bool> {
    if !regex.contains('(') {
        return Ok(false);
    }
    let compiled = Regex::new(regex).map_err(|e| {
        Error::RouteDefinition(format!("Invalid placeholder regex \"{}\": {}", regex, e))
    })?;
    Ok(compiled.captures_len() > 1)
}
