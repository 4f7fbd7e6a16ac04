use std::future::Future;

use regex::Regex;

use crate::error::*;

lazy_static! {
  static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
}

/// Phonetic Greek -> Latin mapping.  Covers both cases and the
/// accent/diaeresis forms so titles straight out of the editor work.
fn greek_to_latin(c: char) -> Option<&'static str> {
  let mapped = match c {
    'α' | 'ά' | 'Α' | 'Ά' => "a",
    'β' | 'Β' => "v",
    'γ' | 'Γ' => "g",
    'δ' | 'Δ' => "d",
    'ε' | 'έ' | 'Ε' | 'Έ' => "e",
    'ζ' | 'Ζ' => "z",
    'η' | 'ή' | 'Η' | 'Ή' => "i",
    'θ' | 'Θ' => "th",
    'ι' | 'ί' | 'ϊ' | 'ΐ' | 'Ι' | 'Ί' | 'Ϊ' => "i",
    'κ' | 'Κ' => "k",
    'λ' | 'Λ' => "l",
    'μ' | 'Μ' => "m",
    'ν' | 'Ν' => "n",
    'ξ' | 'Ξ' => "x",
    'ο' | 'ό' | 'Ο' | 'Ό' => "o",
    'π' | 'Π' => "p",
    'ρ' | 'Ρ' => "r",
    'σ' | 'ς' | 'Σ' => "s",
    'τ' | 'Τ' => "t",
    'υ' | 'ύ' | 'ϋ' | 'ΰ' | 'Υ' | 'Ύ' | 'Ϋ' => "y",
    'φ' | 'Φ' => "f",
    'χ' | 'Χ' => "ch",
    'ψ' | 'Ψ' => "ps",
    'ω' | 'ώ' | 'Ω' | 'Ώ' => "o",
    _ => return None,
  };
  Some(mapped)
}

/// Turn a title into a URL-safe slug.  Empty or all-punctuation input
/// yields an empty string, not an error.
pub fn generate_slug(text: &str) -> String {
  // transliterate first so multi-char sequences ("th", "ps") survive
  // the later cleanup steps intact.
  let mut latin = String::with_capacity(text.len());
  for c in text.chars() {
    match greek_to_latin(c) {
      Some(s) => latin.push_str(s),
      None => latin.push(c),
    }
  }

  let lowered = latin.to_lowercase();
  let cleaned: String = lowered
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
    .collect();

  // whitespace runs become single hyphens.
  let hyphenated = cleaned.split_whitespace().collect::<Vec<_>>().join("-");

  // collapse hyphen runs, trim leading/trailing hyphens.
  let mut slug = String::with_capacity(hyphenated.len());
  let mut prev_hyphen = true;
  for c in hyphenated.chars() {
    if c == '-' {
      if !prev_hyphen {
        slug.push('-');
      }
      prev_hyphen = true;
    } else {
      slug.push(c);
      prev_hyphen = false;
    }
  }
  while slug.ends_with('-') {
    slug.pop();
  }
  slug
}

pub fn is_valid_slug(s: &str) -> bool {
  SLUG_RE.is_match(s) && !s.starts_with('-') && !s.ends_with('-')
}

/// Like `generate_slug`, but input that reduces to nothing (all
/// punctuation, say) is a validation error instead of an empty slug.
/// Storage paths go through this so an empty or `-1`-style slug can
/// never be persisted.
pub fn derive_slug(text: &str) -> Result<String> {
  let slug = generate_slug(text);
  if slug.is_empty() {
    return Err(Error::validation(format!(
      "'{}' cannot be turned into a slug", text.trim())));
  }
  Ok(slug)
}

/// Resolve a unique slug for `text` against an existence probe
/// (typically a database lookup).  Candidates are probed one at a
/// time: the decision to try `base-n+1` depends on the result for
/// `base-n`, so the checks must stay sequential.
pub async fn generate_unique_slug<F, Fut>(text: &str, exists: F) -> Result<String>
where
  F: Fn(String) -> Fut,
  Fut: Future<Output = Result<bool>>,
{
  let base = derive_slug(text)?;
  if !exists(base.clone()).await? {
    return Ok(base);
  }
  let mut n: u64 = 1;
  loop {
    let candidate = format!("{}-{}", base, n);
    if !exists(candidate.clone()).await? {
      return Ok(candidate);
    }
    n += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use futures::executor::block_on;

  #[test]
  fn latin_titles() {
    assert_eq!(generate_slug("Hello World"), "hello-world");
    assert_eq!(generate_slug("  Breaking   News!  "), "breaking-news");
    assert_eq!(generate_slug("Cafés & Bars"), "cafs-bars");
  }

  #[test]
  fn greek_titles() {
    assert_eq!(generate_slug("Πολιτική"), "politiki");
    assert_eq!(generate_slug("Ψηφιακή Ελλάδα"), "psifiaki-ellada");
    assert_eq!(generate_slug("Θέατρο και Χορός"), "theatro-kai-choros");
    assert_eq!(generate_slug("ΟΙΚΟΝΟΜΙΑ"), "oikonomia");
  }

  #[test]
  fn degenerate_input() {
    assert_eq!(generate_slug(""), "");
    assert_eq!(generate_slug("---"), "");
    assert_eq!(generate_slug("!!!???"), "");
  }

  #[test]
  fn idempotent_on_slugs() {
    for text in &["hello-world", "politiki", "a-1-b-2"] {
      assert_eq!(&generate_slug(text), text);
    }
    let once = generate_slug("Ελληνικά Νέα 2024");
    assert_eq!(generate_slug(&once), once);
  }

  #[test]
  fn validator() {
    assert!(is_valid_slug("hello-world"));
    assert!(is_valid_slug("politiki-3"));
    assert!(!is_valid_slug(""));
    assert!(!is_valid_slug("-leading"));
    assert!(!is_valid_slug("trailing-"));
    assert!(!is_valid_slug("Upper-Case"));
    assert!(!is_valid_slug("with space"));
    for text in &["Πολιτική", "Ψηφιακή Ελλάδα", "α β γ"] {
      assert!(is_valid_slug(&generate_slug(text)));
    }
  }

  #[test]
  fn derive_slug_rejects_empty_base() {
    assert_eq!(derive_slug("Πολιτική").unwrap(), "politiki");
    assert!(matches!(derive_slug("!!!"), Err(Error::Validation(_))));
    assert!(matches!(derive_slug("---"), Err(Error::Validation(_))));
  }

  #[test]
  fn unique_slug_rejects_empty_base() {
    // an all-punctuation title must fail before any probe runs;
    // otherwise the collision path would yield "-1", "-2", ...
    let err = block_on(generate_unique_slug("!!!", |_| async { Ok(false) })).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let err = block_on(generate_unique_slug("???", |_| async { Ok(true) })).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn unique_slug_no_collision() {
    let slug = block_on(generate_unique_slug("Test Title", |_| async { Ok(false) })).unwrap();
    assert_eq!(slug, "test-title");
  }

  #[test]
  fn unique_slug_with_collisions() {
    let taken = vec!["test-title", "test-title-1"];
    let slug = block_on(generate_unique_slug("Test Title", |candidate| {
      let hit = taken.contains(&candidate.as_str());
      async move { Ok(hit) }
    }))
    .unwrap();
    assert_eq!(slug, "test-title-2");
  }
}
