use scraper::{ElementRef, Html};
use url::Url;

use crate::{extractor::parse_selector, safe_filename, ExtractError, ExtractorConfig};

const FALLBACK_FILENAME: &str = "attachment.pdf";

/// A downloadable file linked from a policy page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Absolute URL of the file.
    pub href: String,
    /// File-system safe name to store it under.
    pub filename: String,
}

/// Attachment links on a page, using the default selectors.
///
/// Relative links resolve against `page_url`.
pub fn attachment_links(html: &str, page_url: &str) -> Result<Vec<Attachment>, ExtractError> {
    find_attachments(html, page_url, &ExtractorConfig::default().attachment_selectors)
}

pub(crate) fn find_attachments(
    html: &str,
    page_url: &str,
    selectors: &[String],
) -> Result<Vec<Attachment>, ExtractError> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let mut found: Vec<Attachment> = Vec::new();

    for selector_str in selectors {
        let selector = parse_selector(selector_str)?;
        for link in document.select(&selector) {
            let Some(href) = link.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
                continue;
            };
            let resolved = match &base {
                Some(base) => base.join(href),
                None => Url::parse(href),
            };
            let Ok(url) = resolved else {
                tracing::debug!(href, "Unresolvable attachment link");
                continue;
            };

            // Several selectors usually match the same link.
            if found.iter().any(|a| a.href == url.as_str()) {
                continue;
            }
            found.push(Attachment {
                filename: attachment_filename(&url, &link_text(link)),
                href: url.into(),
            });
        }
    }

    Ok(found)
}

/// The last path segment of the URL, else the link text as a `.pdf`, else `attachment.pdf`.
fn attachment_filename(url: &Url, link_text: &str) -> String {
    let basename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let name = if !basename.is_empty() {
        basename.to_string()
    } else if !link_text.is_empty() {
        format!("{}.pdf", safe_filename(link_text))
    } else {
        FALLBACK_FILENAME.to_string()
    };

    safe_filename(&name)
}

fn link_text(link: ElementRef) -> String {
    link.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://policy.example.edu/policy/123/latest";

    #[test]
    fn test_filename_from_url_path() {
        let html = r#"<a href="/files/Travel%20Form.pdf?v=2">Travel form</a>"#;

        let links = attachment_links(html, PAGE).unwrap();
        assert_eq!(
            links,
            vec![Attachment {
                href: "https://policy.example.edu/files/Travel%20Form.pdf?v=2".to_string(),
                filename: "Travel%20Form.pdf".to_string(),
            }]
        );
    }

    #[test]
    fn test_filename_from_link_text() {
        let html = r#"<div class="attachments"><a href="https://cdn.example.edu/">Appendix: A/B
            schedule</a></div>"#;

        let links = attachment_links(html, PAGE).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].filename, "Appendix AB schedule.pdf");
    }

    #[test]
    fn test_filename_fallback() {
        let html = r#"<a title="download" href="https://cdn.example.edu/"><img src="x.png"></a>"#;

        let links = attachment_links(html, PAGE).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].filename, "attachment.pdf");
    }

    #[test]
    fn test_selectors_and_dedup() {
        let html = r#"
        <nav><a href="/policy/124">Next policy</a></nav>
        <div class="attachment-list">
            <a href="/docs/a.pdf">A</a>
            <a href="/docs/b.docx">B</a>
            <a href="/docs/c.xlsx">C</a>
            <a href="">Empty</a>
        </div>
        <a href="/download?id=7">Get it</a>"#;

        let links = attachment_links(html, PAGE).unwrap();
        let hrefs: Vec<&str> = links.iter().map(|a| a.href.as_str()).collect();

        assert_eq!(
            hrefs,
            vec![
                "https://policy.example.edu/docs/a.pdf",
                "https://policy.example.edu/docs/b.docx",
                "https://policy.example.edu/docs/c.xlsx",
                "https://policy.example.edu/download?id=7",
            ]
        );
        assert_eq!(links[3].filename, "download");
    }

    #[test]
    fn test_relative_link_without_page_url_is_skipped() {
        let html = r#"<a href="/docs/a.pdf">A</a><a href="https://x.example/b.pdf">B</a>"#;

        let links = attachment_links(html, "not a url").unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].filename, "b.pdf");
    }

    #[test]
    fn test_invalid_attachment_selector() {
        let err = find_attachments("<a></a>", PAGE, &["a[".to_string()]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidSelector(_)));
    }
}
