use std::{
    fs,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{normalizer::strip, ConfigError};

const MAX_FILENAME_CHARS: usize = 150;

static ILLEGAL_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

/// One row of the exported policy list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Area", default)]
    pub area: Option<String>,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
}

impl PolicyEntry {
    pub fn new(title: &str, area: &str, url: &str) -> Self {
        PolicyEntry {
            title: Some(title.to_string()),
            area: Some(area.to_string()),
            url: Some(url.to_string()),
        }
    }

    /// Title, area and url, when all three are present and non-empty.
    pub fn fields(&self) -> Option<(&str, &str, &str)> {
        Some((
            non_empty(&self.title)?,
            non_empty(&self.area)?,
            non_empty(&self.url)?,
        ))
    }

    pub fn is_complete(&self) -> bool {
        self.fields().is_some()
    }

    /// `root/<area>/<title>/<title>.txt`, with every component made file-system safe.
    pub fn text_path(&self, root: &Path) -> Option<PathBuf> {
        let (title, area, _) = self.fields()?;
        let title = safe_filename(title);
        Some(
            root.join(safe_filename(area))
                .join(&title)
                .join(format!("{title}.txt")),
        )
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Reads the policy list, a JSON array of entries.
pub fn load_policies<P: AsRef<Path>>(path: P) -> Result<Vec<PolicyEntry>, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Strips characters illegal in file names and caps the length.
pub fn safe_filename(name: &str) -> String {
    let cleaned = ILLEGAL_FILENAME_CHARS.replace_all(name, "");
    strip(&cleaned)
        .replace('\n', " ")
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect()
}
