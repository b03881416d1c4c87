//! Cleanup of raw policy page text.
//!
//! The pipeline runs in a fixed order: UI chrome removal, truncation after
//! the authority section, table of contents heading collection, re-flow with
//! blank lines before headings, and blank line collapsing.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::{ConfigError, NormalizerConfig};

static DEFAULT_NORMALIZER: Lazy<Normalizer> = Lazy::new(|| {
    Normalizer::new(NormalizerConfig::default()).expect("default normalizer patterns are literal")
});

static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[\s\x1c-\x1f]*\n[\s\x1c-\x1f]*\n").unwrap());

/// Normalizes `text` with the default phrase and marker set.
pub fn normalize(text: &str) -> String {
    DEFAULT_NORMALIZER.normalize(text)
}

/// A compiled [`NormalizerConfig`].
#[derive(Debug, Clone)]
pub struct Normalizer {
    chrome_phrases: Vec<String>,
    section_start: Regex,
    trailing_markers: Option<Regex>,
    toc_marker: Regex,
    toc_end: Regex,
    heading_prefixes: Vec<String>,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Result<Self, ConfigError> {
        let NormalizerConfig {
            chrome_phrases,
            section_start,
            trailing_markers,
            toc_marker,
            toc_terminators,
            heading_prefixes,
        } = config;

        // A blank line always closes the table of contents.
        let mut toc_end = vec![r"\n\n".to_string()];
        toc_end.extend(toc_terminators.iter().map(|t| escape_folded(t)));

        Ok(Normalizer {
            chrome_phrases,
            section_start: literal(&[section_start])?,
            trailing_markers: if trailing_markers.is_empty() {
                None
            } else {
                Some(literal(&trailing_markers)?)
            },
            toc_marker: literal(&[toc_marker])?,
            toc_end: case_insensitive(&toc_end.join("|"))?,
            heading_prefixes,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let text = self.strip_chrome(text);
        let text = self.truncate_trailing_sections(&text);
        let headings = self.toc_headings(text);
        let text = reflow(text, &headings);

        strip(&collapse_blank_lines(&text)).to_string()
    }

    #[cfg(feature = "multi_thread")]
    pub fn normalize_batch<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<String> {
        use rayon::prelude::*;

        texts.par_iter().map(|t| self.normalize(t.as_ref())).collect()
    }

    /// Removes every occurrence of each chrome phrase, including inside words.
    pub fn strip_chrome(&self, text: &str) -> String {
        let mut text = text.to_string();
        for phrase in self.chrome_phrases.iter().filter(|p| !p.is_empty()) {
            text = text.replace(phrase.as_str(), "");
        }
        text
    }

    /// Cuts `text` at the first trailing marker following the section start.
    pub fn truncate_trailing_sections<'a>(&self, text: &'a str) -> &'a str {
        let Some(markers) = &self.trailing_markers else {
            return text;
        };
        let Some(start) = self.section_start.find(text) else {
            return text;
        };

        match markers.find_at(text, start.end()) {
            Some(marker) => {
                tracing::debug!(
                    kept = marker.start(),
                    dropped = text.len() - marker.start(),
                    marker = marker.as_str(),
                    "Truncating trailing sections"
                );
                &text[..marker.start()]
            }
            None => text,
        }
    }

    /// Collects the headings listed in the table of contents block, if any.
    pub fn toc_headings<'a>(&self, text: &'a str) -> HashSet<&'a str> {
        let Some(marker) = self.toc_marker.find(text) else {
            return HashSet::new();
        };
        let end = self
            .toc_end
            .find_at(text, marker.end())
            .map_or(text.len(), |m| m.start());

        text[marker.start()..end]
            .split('\n')
            .map(strip)
            .filter(|line| !line.is_empty())
            .filter(|line| !self.heading_prefixes.iter().any(|p| line.starts_with(p.as_str())))
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        DEFAULT_NORMALIZER.clone()
    }
}

/// Trims every line, drops blank ones, and puts a blank line before headings.
fn reflow(text: &str, headings: &HashSet<&str>) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in text.split('\n').map(strip) {
        if line.is_empty() {
            continue;
        }
        if !lines.is_empty() && headings.contains(line) {
            lines.push("");
        }
        lines.push(line);
    }

    lines.join("\n")
}

fn collapse_blank_lines(text: &str) -> String {
    EXCESS_BLANK_LINES.replace_all(text, "\n\n").into_owned()
}

/// Trims whitespace, counting the ASCII separators U+001C..U+001F as whitespace too.
pub(crate) fn strip(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || ('\x1c'..='\x1f').contains(&c))
}

fn literal(alternatives: &[String]) -> Result<Regex, ConfigError> {
    let escaped: Vec<String> = alternatives.iter().map(|a| escape_folded(a)).collect();
    case_insensitive(&escaped.join("|"))
}

/// Escapes `text` for a case-insensitive pattern where dotted and dotless i
/// also match plain `i`, which simple case folding leaves out.
fn escape_folded(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'i' | 'I' | 'ı' | 'İ' => pattern.push_str("[iIıİ]"),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    pattern
}

fn case_insensitive(pattern: &str) -> Result<Regex, ConfigError> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}
