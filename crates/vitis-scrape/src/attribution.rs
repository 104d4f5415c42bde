//! Photo attribution text embedded in a photo link's `onclick` handler.
//!
//! VIVC renders the "please quote the source" notice into a JavaScript
//! string. The strategies in [`STRATEGIES`] look for it with increasing
//! generality; the first one to produce a plausible attribution wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::squash;

/// Words that mark a string as an institutional attribution.
pub const SOURCE_KEYWORDS: &[&str] = &[
  "Institut",
  "Institute",
  "Research",
  "Centre",
  "Center",
  "Breeding",
  "Schneider",
  "Kühn",
  "JKI",
  "Geilweilerhof",
];

/// Attributions shorter than this are treated as noise.
const MIN_LEN: usize = 20;
/// The longest-quote fallback demands more.
const MIN_FALLBACK_LEN: usize = 30;

pub type Strategy = fn(&str) -> Option<String>;

/// Strategies in priority order, each independently testable.
pub const STRATEGIES: &[(&str, Strategy)] = &[
  ("after-source-phrase", after_source_phrase),
  ("please-note-keyword", please_note_keyword),
  ("long-keyword-quote", long_keyword_quote),
  ("long-quote", long_quote),
  ("longest-keyword-quote", longest_keyword_quote),
];

/// Run [`STRATEGIES`] over `onclick`; first success wins.
pub fn extract_attribution(onclick: &str) -> Option<String> {
  STRATEGIES.iter().find_map(|(_, strategy)| strategy(onclick))
}

fn keyword_alternation() -> String {
  SOURCE_KEYWORDS.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|")
}

fn static_regex(pattern: &str) -> Option<Regex> { Regex::new(pattern).ok() }

static AFTER_SOURCE_PHRASE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  static_regex(r#"(?is)(?:source as indicated below|quote the source)[:\s]*["']([^"']+)["']"#)
});

static PLEASE_NOTE_KEYWORD: LazyLock<Option<Regex>> = LazyLock::new(|| {
  static_regex(&format!(
    r#"(?is)Please note[^"']*["']([^"']*(?:{})[^"']*)["']"#,
    keyword_alternation()
  ))
});

static LONG_KEYWORD_QUOTE: LazyLock<Option<Regex>> = LazyLock::new(|| {
  static_regex(&format!(
    r#"(?is)["']([^"']{{50,}}(?:{})[^"']*)["']"#,
    keyword_alternation()
  ))
});

static LONG_QUOTE: LazyLock<Option<Regex>> =
  LazyLock::new(|| static_regex(r#"(?s)["']([^"']{80,})["']"#));

static ANY_QUOTE: LazyLock<Option<Regex>> =
  LazyLock::new(|| static_regex(r#"["']([^"']+)["']"#));

/// Undo JavaScript string escapes and the HTML entities VIVC leaves in,
/// then collapse whitespace.
pub fn clean(raw: &str) -> String {
  let unescaped = raw
    .replace("\\n", " ")
    .replace("\\r", " ")
    .replace("\\t", " ")
    .replace("\\\"", "\"")
    .replace("\\'", "'")
    .replace("&nbsp;", " ")
    .replace("&amp;", "&");
  squash(&unescaped)
}

fn first_capture(re: &LazyLock<Option<Regex>>, haystack: &str) -> Option<String> {
  let re = re.as_ref()?;
  let text = clean(re.captures(haystack)?.get(1)?.as_str());
  (text.chars().count() > MIN_LEN).then_some(text)
}

/// Quoted text right after "quote the source" / "source as indicated below".
pub fn after_source_phrase(onclick: &str) -> Option<String> {
  first_capture(&AFTER_SOURCE_PHRASE, onclick)
}

/// First quoted string after "Please note" that names an institution.
pub fn please_note_keyword(onclick: &str) -> Option<String> {
  first_capture(&PLEASE_NOTE_KEYWORD, onclick)
}

/// A quoted string of 50+ characters followed by an institution keyword.
pub fn long_keyword_quote(onclick: &str) -> Option<String> {
  first_capture(&LONG_KEYWORD_QUOTE, onclick)
}

/// Any quoted string of 80+ characters.
pub fn long_quote(onclick: &str) -> Option<String> { first_capture(&LONG_QUOTE, onclick) }

/// The longest quoted string that mentions an institution or Germany.
pub fn longest_keyword_quote(onclick: &str) -> Option<String> {
  let re = ANY_QUOTE.as_ref()?;
  let mut quotes: Vec<String> = re
    .captures_iter(onclick)
    .filter_map(|c| c.get(1))
    .map(|m| clean(m.as_str()))
    .collect();
  quotes.sort_by_key(|q| std::cmp::Reverse(q.chars().count()));

  quotes.into_iter().find(|q| {
    q.chars().count() > MIN_FALLBACK_LEN
      && (SOURCE_KEYWORDS.iter().any(|k| q.contains(k))
        || q.contains("GERMANY")
        || q.contains("Germany"))
  })
}
