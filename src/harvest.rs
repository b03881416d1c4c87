use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use crate::{DocumentError, HarvestError, PolicyEntry, PolicyExtractor, SourceError};

/// Renders policy pages and downloads their attachments. Browser drivers and
/// HTTP clients live behind this.
pub trait PageSource: Send + Sync {
    fn fetch_html(&self, url: &str) -> Result<String, SourceError>;

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Outcome of one pass over the policy list.
#[derive(Debug, Default)]
pub struct HarvestReport {
    pub saved: Vec<PathBuf>,
    pub already_present: usize,
    pub incomplete: usize,
    /// Policy title and the reason it failed.
    pub failed: Vec<(String, String)>,
    pub attachments: Vec<PathBuf>,
    /// Attachment url and the reason it was not saved. These never fail the policy itself.
    pub failed_attachments: Vec<(String, String)>,
}

/// Fetches, extracts and stores the text of every policy in a list.
pub struct PolicyHarvester<S> {
    source: S,
    extractor: PolicyExtractor,
    output_dir: PathBuf,
    delay: Duration,
    attachments: bool,
}

impl<S: PageSource> PolicyHarvester<S> {
    pub fn new<P: Into<PathBuf>>(source: S, output_dir: P) -> Self {
        PolicyHarvester {
            source,
            extractor: PolicyExtractor::default(),
            output_dir: output_dir.into(),
            delay: Duration::ZERO,
            attachments: true,
        }
    }

    pub fn with_extractor(mut self, extractor: PolicyExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Pause after each saved document.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Whether linked attachments are downloaded next to the text. On by default.
    pub fn with_attachments(mut self, attachments: bool) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn run(&self, entries: &[PolicyEntry]) -> Result<HarvestReport, HarvestError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| HarvestError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut report = HarvestReport::default();

        for entry in entries {
            let (Some((title, area, url)), Some(path)) =
                (entry.fields(), entry.text_path(&self.output_dir))
            else {
                tracing::warn!(?entry, "Skipping incomplete entry");
                report.incomplete += 1;
                continue;
            };

            if path.exists() {
                tracing::info!(area, title, "Skipping, already exists");
                report.already_present += 1;
                continue;
            }

            tracing::info!(area, title, url, "Harvesting");
            match self.harvest_one(url, &path, &mut report) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "Saved");
                    report.saved.push(path);
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
                Err(e) => {
                    tracing::warn!(title, error = %e, "Failed");
                    report.failed.push((title.to_string(), e.to_string()));
                }
            }
        }

        tracing::info!(
            saved = report.saved.len(),
            already_present = report.already_present,
            incomplete = report.incomplete,
            failed = report.failed.len(),
            attachments = report.attachments.len(),
            "Harvest finished"
        );
        Ok(report)
    }

    fn harvest_one(
        &self,
        url: &str,
        path: &Path,
        report: &mut HarvestReport,
    ) -> Result<(), DocumentError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let html = self.source.fetch_html(url).map_err(DocumentError::Fetch)?;
        if self.attachments {
            self.save_attachments(url, &html, dir, report);
        }
        let text = self.extractor.extract(&html)?;
        write_atomically(path, &text)?;
        Ok(())
    }

    fn save_attachments(&self, page_url: &str, html: &str, dir: &Path, report: &mut HarvestReport) {
        let links = match self.extractor.attachment_links(html, page_url) {
            Ok(links) => links,
            Err(e) => {
                tracing::warn!(url = page_url, error = %e, "Attachment lookup failed");
                return;
            }
        };

        for link in links {
            let path = dir.join(&link.filename);
            let saved = self
                .source
                .fetch_bytes(&link.href)
                .and_then(|bytes| write_atomically(&path, bytes).map_err(SourceError::from));

            match saved {
                Ok(()) => {
                    tracing::info!(file = %link.filename, "Downloaded attachment");
                    report.attachments.push(path);
                }
                Err(e) => {
                    tracing::warn!(file = %link.filename, href = %link.href, error = %e, "Failed to download attachment");
                    report.failed_attachments.push((link.href, e.to_string()));
                }
            }
        }
    }
}

/// Writes through a temporary sibling file so `path` only ever holds complete contents.
pub fn write_atomically<C: AsRef<[u8]>>(path: &Path, contents: C) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_ref())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
