//! String helpers: case conversion, truncation, searching, slugs.

use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
static SLUG_STRIP_ASCII: OnceLock<Regex> = OnceLock::new();
static SLUG_STRIP_UNICODE: OnceLock<Regex> = OnceLock::new();
static SLUG_SEPARATORS: OnceLock<Regex> = OnceLock::new();

fn non_alnum() -> &'static Regex {
    NON_ALNUM.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("Invalid regex"))
}

fn slug_strip(ascii: bool) -> &'static Regex {
    if ascii {
        SLUG_STRIP_ASCII
            .get_or_init(|| Regex::new(r"[^A-Za-z0-9/_|+\- ]+").expect("Invalid regex"))
    } else {
        SLUG_STRIP_UNICODE
            .get_or_init(|| Regex::new(r"[^\p{L}\p{N}/_|+\- ]+").expect("Invalid regex"))
    }
}

fn slug_separators() -> &'static Regex {
    SLUG_SEPARATORS.get_or_init(|| Regex::new(r"[/_|+\- ]+").expect("Invalid regex"))
}

/// `foo_bar-baz` -> `fooBarBaz`.
pub fn camel(value: &str) -> String {
    let studly: String = ucwords(&value.replace(['-', '_'], " "))
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    lcfirst(&studly)
}

/// `fooBar` -> `foo_bar` using `delimiter`.
pub fn snake(value: &str, delimiter: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if c.is_ascii_uppercase() {
            out.push_str(delimiter);
            out.push(c.to_ascii_lowercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }

    if delimiter.is_empty() {
        return out;
    }
    out.trim_start_matches(delimiter).to_string()
}

/// `fooBar` -> `foo-bar`.
pub fn kebab(value: &str) -> String {
    snake(value, "-")
}

/// `foo_bar-baz` -> `Foo Bar Baz`.
pub fn title(value: &str) -> String {
    ucwords(&value.replace(['-', '_'], " "))
}

/// Truncate to `limit` characters, appending `end` when cut.
pub fn limit(value: &str, limit: usize, end: &str) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let mut out: String = value.chars().take(limit).collect();
    out.push_str(end);
    out
}

/// True if any non-empty needle occurs in `haystack`.
pub fn contains(haystack: &str, needles: &[&str]) -> bool {
    needles
        .iter()
        .any(|n| !n.is_empty() && haystack.contains(n))
}

pub fn starts_with(haystack: &str, needles: &[&str]) -> bool {
    needles
        .iter()
        .any(|n| !n.is_empty() && haystack.starts_with(n))
}

pub fn ends_with(haystack: &str, needles: &[&str]) -> bool {
    needles
        .iter()
        .any(|n| !n.is_empty() && haystack.ends_with(n))
}

/// Replace successive occurrences of `search` with each replacement in turn.
pub fn replace_array(search: &str, replace: &[&str], subject: &str) -> String {
    let mut subject = subject.to_string();
    if search.is_empty() {
        return subject;
    }
    for value in replace {
        subject = subject.replacen(search, value, 1);
    }
    subject
}

/// Everything after the first `search`. Empty search returns the subject,
/// a missing one returns an empty string.
pub fn after(subject: &str, search: &str) -> String {
    if search.is_empty() {
        return subject.to_string();
    }
    match subject.find(search) {
        Some(pos) => subject[pos + search.len()..].to_string(),
        None => String::new(),
    }
}

/// Everything before the first `search`.
pub fn before(subject: &str, search: &str) -> String {
    if search.is_empty() {
        return subject.to_string();
    }
    match subject.find(search) {
        Some(pos) => subject[..pos].to_string(),
        None => String::new(),
    }
}

/// Random lowercase hex string of `length` characters.
pub fn random(length: usize) -> String {
    let mut out = String::with_capacity(length + 28);
    while out.len() < length {
        let id = uuid::Uuid::new_v4();
        // Bytes 6 and 8 carry the version and variant bits
        for (i, byte) in id.as_bytes().iter().enumerate() {
            if i != 6 && i != 8 {
                let _ = write!(out, "{:02x}", byte);
            }
        }
    }
    out.truncate(length);
    out
}

pub fn lower(value: &str) -> String {
    value.to_lowercase()
}

pub fn upper(value: &str) -> String {
    value.to_uppercase()
}

/// Runs of anything but letters and digits become `separator`.
pub fn slug(title: &str, separator: &str) -> String {
    let replaced = non_alnum().replace_all(title, NoExpand(separator));
    trim_chars(&replaced, separator).to_lowercase()
}

/// Options for [`slugify`].
#[derive(Debug, Clone)]
pub struct SlugOptions {
    pub separator: String,
    /// Maximum length in characters.
    pub limit: Option<usize>,
    pub lowercase: bool,
    pub transliterate: bool,
    /// Drop everything outside ASCII letters and digits.
    pub ascii: bool,
}

impl Default for SlugOptions {
    fn default() -> Self {
        Self {
            separator: "-".to_string(),
            limit: None,
            lowercase: true,
            transliterate: true,
            ascii: true,
        }
    }
}

/// URL-friendly slug. Never returns an empty string (`n-a` instead).
pub fn slugify(text: &str, opts: &SlugOptions) -> String {
    let sep = opts.separator.as_str();

    let mut text: String = text.nfkd().collect();
    if opts.transliterate {
        text = transliterate(&text);
    }
    text.retain(|c| !is_combining_mark(c));

    let stripped = slug_strip(opts.ascii).replace_all(&text, "");
    let joined = slug_separators().replace_all(&stripped, NoExpand(sep));
    let mut text = trim_chars(&joined, sep).to_string();

    if let Some(limit) = opts.limit.filter(|l| *l > 0) {
        let cut: String = text.chars().take(limit).collect();
        text = trim_chars(&cut, sep).to_string();
    }

    if opts.lowercase {
        text = text.to_lowercase();
    }

    if text.is_empty() {
        "n-a".to_string()
    } else {
        text
    }
}

// Letters NFKD leaves intact but which have a conventional ASCII spelling.
fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'đ' | 'ð' => out.push('d'),
            'Đ' | 'Ð' => out.push('D'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            'þ' => out.push_str("th"),
            'Þ' => out.push_str("TH"),
            'ı' => out.push('i'),
            _ => out.push(c),
        }
    }
    out
}

/// Trim any of the characters in `chars` from both ends.
fn trim_chars<'a>(value: &'a str, chars: &str) -> &'a str {
    if chars.is_empty() {
        return value;
    }
    value.trim_matches(|c| chars.contains(c))
}

fn ucwords(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

fn lcfirst(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversion() {
        assert_eq!(camel("foo_bar-baz"), "fooBarBaz");
        assert_eq!(camel("Hello world"), "helloWorld");
        assert_eq!(snake("fooBarBaz", "_"), "foo_bar_baz");
        assert_eq!(snake("FooBar", "_"), "foo_bar");
        assert_eq!(kebab("fooBarBaz"), "foo-bar-baz");
        assert_eq!(snake("fooBar", "."), "foo.bar");
        assert_eq!(title("hello_big-world"), "Hello Big World");
    }

    #[test]
    fn test_limit_counts_characters() {
        assert_eq!(limit("hello", 10, "..."), "hello");
        assert_eq!(limit("hello world", 5, "..."), "hello...");
        assert_eq!(limit("héllo wörld", 4, "…"), "héll…");
    }

    #[test]
    fn test_needle_matching_ignores_empty() {
        assert!(contains("framework", &["x", "work"]));
        assert!(!contains("framework", &[""]));
        assert!(starts_with("framework", &["frame"]));
        assert!(!starts_with("framework", &["", "work"]));
        assert!(ends_with("framework", &["work"]));
        assert!(!ends_with("framework", &[]));
    }

    #[test]
    fn test_replace_array_sequential() {
        assert_eq!(
            replace_array("?", &["8:30", "9:00"], "The event runs from ? to ?"),
            "The event runs from 8:30 to 9:00"
        );
        // Extra replacements are ignored
        assert_eq!(replace_array("?", &["a", "b", "c"], "? ?"), "a b");
    }

    #[test]
    fn test_after_and_before() {
        assert_eq!(after("user@example.com", "@"), "example.com");
        assert_eq!(after("abc", ""), "abc");
        assert_eq!(after("abc", "z"), "");
        assert_eq!(before("user@example.com", "@"), "user");
        assert_eq!(before("abc", ""), "abc");
        assert_eq!(before("abc", "z"), "");
    }

    #[test]
    fn test_random_hex() {
        let r = random(40);
        assert_eq!(r.len(), 40);
        assert!(r.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(random(0), "");
        assert_ne!(random(16), random(16));
    }

    #[test]
    fn test_random_has_no_fixed_positions() {
        let samples: Vec<String> = (0..200).map(|_| random(64)).collect();
        for pos in 0..64 {
            let distinct: std::collections::HashSet<u8> =
                samples.iter().map(|s| s.as_bytes()[pos]).collect();
            assert!(distinct.len() > 4, "position {} looks fixed", pos);
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Hello, World!", "-"), "hello-world");
        assert_eq!(slug("  Crème brûlée  ", "_"), "crème_brûlée");
        assert_eq!(upper("straße"), "STRASSE");
        assert_eq!(lower("ÀB"), "àb");
    }

    #[test]
    fn test_slugify_defaults() {
        let opts = SlugOptions::default();
        assert_eq!(slugify("Crème Brûlée à la carte", &opts), "creme-brulee-a-la-carte");
        assert_eq!(slugify("Straße / Größe", &opts), "strasse-grosse");
        assert_eq!(slugify("foo_bar|baz+qux", &opts), "foo-bar-baz-qux");
        assert_eq!(slugify("!!!", &opts), "n-a");
        assert_eq!(slugify("日本語", &opts), "n-a");
    }

    #[test]
    fn test_slugify_options() {
        let opts = SlugOptions {
            separator: "_".to_string(),
            limit: Some(10),
            lowercase: false,
            ..SlugOptions::default()
        };
        // Cut lands on a separator, which is trimmed again
        assert_eq!(slugify("Hello Big World", &opts), "Hello_Big");

        let unicode = SlugOptions {
            ascii: false,
            ..SlugOptions::default()
        };
        assert_eq!(slugify("Привет мир", &unicode), "привет-мир");
    }
}
