//! Normalizer: pure functions mapping raw scraped strings to canonical
//! display forms.
//!
//! Every function here is total. None of them fail, and applying any of them
//! twice gives the same result as applying it once.

/// The canonical color used for blank or explicitly unspecified input.
pub const UNKNOWN_COLOR: &str = "Unknown";

/// Source tokens and their canonical English color, checked in order: first
/// as an exact match, then as a substring.
const COLOR_MAP: &[(&str, &str)] = &[
  ("rouge", "Red"),
  ("noir", "Black"),
  ("rose", "Pink"),
  ("blanc", "White"),
  ("not specified", UNKNOWN_COLOR),
  ("not_specified", UNKNOWN_COLOR),
  ("notspecified", UNKNOWN_COLOR),
];

/// Words kept lowercase by [`title_country`] unless they open the name.
const LOWERCASE_WORDS: &[&str] =
  &["of", "and", "the", "a", "an", "in", "on", "at", "to", "for", "with", "by"];

/// Map a raw berry color to its canonical display form.
///
/// Known tokens (`rouge`, `noir`, `rose`, `blanc`, `not specified`) map to
/// `Red`, `Black`, `Pink`, `White` and `Unknown`, matched case-insensitively
/// first exactly and then as substrings. Blank input is `Unknown`; anything
/// else is title-cased.
pub fn normalize_color(raw: &str) -> String {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return UNKNOWN_COLOR.to_string();
  }

  let lower = trimmed.to_lowercase();
  let canonical = COLOR_MAP
    .iter()
    .find(|(token, _)| lower == *token)
    .or_else(|| COLOR_MAP.iter().find(|(token, _)| lower.contains(token)));

  match canonical {
    Some((_, color)) => (*color).to_string(),
    None => title_case(trimmed),
  }
}

/// Normalize a cultivar, species, or breeder name.
///
/// Names that are entirely uppercase, more than 70% uppercase, or entirely
/// lowercase are title-cased. Names that already carry deliberate mixed
/// casing (`Pinot Noir`, `McLaren Vale`) pass through unchanged.
pub fn normalize_name(raw: &str) -> String {
  let total = raw.chars().count();
  if total == 0 {
    return String::new();
  }

  let upper = raw.chars().filter(|c| c.is_uppercase()).count();
  let lower = raw.chars().filter(|c| c.is_lowercase()).count();

  let all_caps = upper > 0 && lower == 0;
  let all_lower = lower > 0 && upper == 0;
  let mostly_caps = upper * 10 > total * 7;

  if all_caps || all_lower || mostly_caps {
    title_case(raw)
  } else {
    raw.to_string()
  }
}

/// Title-case `raw`: every cased letter that follows an uncased character is
/// uppercased, every other cased letter is lowercased.
///
/// `MÜLLER-THURGAU` becomes `Müller-Thurgau`, `D'ARBOIS` becomes `D'Arbois`.
pub fn title_case(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut prev_cased = false;

  for c in raw.chars() {
    let cased = c.is_uppercase() || c.is_lowercase();
    if !cased {
      out.push(c);
    } else if prev_cased {
      out.extend(c.to_lowercase());
    } else {
      // Multi-char uppercase mappings (ß → SS) keep only the first char
      // uppercase so the result stays a fixed point.
      let mut upper = c.to_uppercase();
      if let Some(first) = upper.next() {
        out.push(first);
        out.extend(upper.flat_map(char::to_lowercase));
      }
    }
    prev_cased = cased;
  }

  out
}

/// Title-case a country name while keeping prepositions and articles
/// lowercase: `united states of america` → `United States of America`.
pub fn title_country(raw: &str) -> String {
  raw
    .split_whitespace()
    .enumerate()
    .map(|(i, word)| {
      let lower = word.to_lowercase();
      if i > 0 && LOWERCASE_WORDS.contains(&lower.as_str()) {
        lower
      } else {
        capitalize(&lower)
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}
