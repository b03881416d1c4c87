use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use scraper::{ElementRef, Html, Selector};

use crate::{
    attachments::{find_attachments, Attachment},
    cleaner::TextCleaner,
    ExtractError, ExtractorConfig, Normalizer,
};

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead",
    "tr", "ul",
];

/// A builder for the `PolicyExtractor` struct
/// That allows for configuring the extractor
/// before building it
pub struct PolicyExtractorBuilder {
    config: Option<ExtractorConfig>,
    cleaner: Option<Arc<dyn TextCleaner>>,
}

impl PolicyExtractorBuilder {
    pub fn new() -> Self {
        PolicyExtractorBuilder {
            config: None,
            cleaner: None,
        }
    }

    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_cleaner<T: TextCleaner + 'static>(mut self, cleaner: T) -> Self {
        self.cleaner = Some(Arc::new(cleaner));
        self
    }

    pub fn build(self) -> PolicyExtractor {
        let cleaner: Arc<dyn TextCleaner> = match self.cleaner {
            Some(cleaner) => cleaner,
            None => Arc::new(Normalizer::default()),
        };
        PolicyExtractor {
            config: self.config.unwrap_or_default(),
            cleaner,
        }
    }
}

impl Default for PolicyExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls the policy body out of a rendered page and cleans it.
///
/// # Example
///
/// ```
/// use policy_text::PolicyExtractor;
///
/// let html = r#"<main><h1>Travel Policy</h1>
///     <p>Employees traveling on university business are reimbursed for costs.</p>
///     <p>Authority: Board of Trustees</p><h2>Attachments</h2><p>Form A</p></main>"#;
///
/// let text = PolicyExtractor::default().extract(html).unwrap();
/// assert!(text.ends_with("Authority: Board of Trustees"));
/// ```
#[derive(Clone)]
pub struct PolicyExtractor {
    config: ExtractorConfig,
    cleaner: Arc<dyn TextCleaner>,
}

impl Debug for PolicyExtractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PolicyExtractor {{ selectors: {:?} }}", self.config.selectors)
    }
}

impl PolicyExtractor {
    pub fn new() -> PolicyExtractorBuilder {
        PolicyExtractorBuilder::new()
    }

    /// Returns the cleaned text of the first selector region long enough to be the policy body.
    pub fn extract(&self, html: &str) -> Result<String, ExtractError> {
        let document = Html::parse_document(html);

        for selector_str in &self.config.selectors {
            let selector = parse_selector(selector_str)?;
            let Some(region) = document.select(&selector).next() else {
                tracing::debug!(selector = %selector_str, "No element matched");
                continue;
            };

            let text = render_text(region);
            let len = text.chars().count();
            if len > self.config.min_text_len {
                tracing::debug!(selector = %selector_str, chars = len, "Found policy content");
                return Ok(self.cleaner.clean(&text));
            }
            tracing::debug!(selector = %selector_str, chars = len, "Region too short");
        }

        Err(ExtractError::ContentNotFound)
    }

    /// Downloadable files linked from the page, resolved against `page_url`.
    pub fn attachment_links(&self, html: &str, page_url: &str) -> Result<Vec<Attachment>, ExtractError> {
        find_attachments(html, page_url, &self.config.attachment_selectors)
    }
}

impl Default for PolicyExtractor {
    fn default() -> Self {
        PolicyExtractorBuilder::new().build()
    }
}

/// Visible text of the first element matching `selector`, uncleaned.
pub fn visible_text(html: &str, selector: &str) -> Result<Option<String>, ExtractError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    let text = document.select(&selector).next().map(render_text);
    Ok(text)
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector(selector.to_string()))
}

/// Renders an element roughly the way a browser lays out its text: block
/// elements start new lines, inline whitespace collapses to single spaces.
fn render_text(element: ElementRef) -> String {
    let mut out = String::new();
    render_into(element, &mut out);

    out.split('\n')
        .map(str::trim)
        .collect::<Vec<&str>>()
        .join("\n")
        .trim()
        .to_string()
}

fn render_into(element: ElementRef, out: &mut String) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    if block {
        line_break(out);
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            render_into(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            push_collapsed(out, text);
        }
    }

    if block {
        line_break(out);
    }
}

fn line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    for (i, word) in text.split_whitespace().enumerate() {
        let needs_space = i > 0 || text.starts_with(char::is_whitespace);
        if needs_space && !at_word_boundary(out) {
            out.push(' ');
        }
        out.push_str(word);
    }
    if text.ends_with(char::is_whitespace) && !at_word_boundary(out) {
        out.push(' ');
    }
}

fn at_word_boundary(out: &str) -> bool {
    out.is_empty() || out.ends_with(' ') || out.ends_with('\n')
}
