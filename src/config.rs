use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt::Display, fs, path::Path};

use crate::ConfigError;

/// Loads a config value from a file path or an inline string.
///
/// A path that exists is parsed by extension. Anything else is treated as
/// inline JSON, then inline TOML when the `toml_config` feature is enabled.
pub trait FromConfig: DeserializeOwned + Sized {
    fn from_config(config: &str) -> Result<Self, ConfigError> {
        if Path::new(config).exists() {
            let config_content = fs::read_to_string(config)?;
            if config.ends_with(".json") {
                Ok(serde_json::from_str(&config_content)?)
            } else if config.ends_with(".toml") {
                #[cfg(feature = "toml_config")]
                {
                    Ok(toml::from_str(&config_content)?)
                }
                #[cfg(not(feature = "toml_config"))]
                {
                    Err(ConfigError::TomlNotEnabled)
                }
            } else {
                Err(ConfigError::UnsupportedFormat)
            }
        } else {
            serde_json::from_str(config).or_else(|json_err| {
                #[cfg(feature = "toml_config")]
                {
                    let _ = json_err;
                    toml::from_str(config).map_err(|e| e.into())
                }
                #[cfg(not(feature = "toml_config"))]
                {
                    Err(json_err.into())
                }
            })
        }
    }
}

/// Phrases and markers driving the text normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// UI labels removed wherever they occur, in this order.
    pub chrome_phrases: Vec<String>,
    /// Section whose end marks the last content kept.
    pub section_start: String,
    /// Sections that follow `section_start` and are dropped with everything after them.
    pub trailing_markers: Vec<String>,
    pub toc_marker: String,
    pub toc_terminators: Vec<String>,
    /// Table of contents lines starting with one of these are not headings.
    pub heading_prefixes: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let mut heading_prefixes = vec!["Table of Contents".to_string(), "•".to_string(), "-".to_string()];
        heading_prefixes.extend((0..=9).map(|d| format!("{d}.")));

        NormalizerConfig {
            chrome_phrases: strings(&["Status, Active", "Active", "Info", "Print", "Share"]),
            section_start: "Authority".to_string(),
            trailing_markers: strings(&[
                "All Revision Dates",
                "Attachments",
                "Approval Signatures",
                "Changes",
            ]),
            toc_marker: "Table of Contents".to_string(),
            toc_terminators: strings(&["Policy"]),
            heading_prefixes,
        }
    }
}

impl FromConfig for NormalizerConfig {}

/// Where the policy body lives in a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// CSS selectors tried in order; the first region with enough text wins.
    pub selectors: Vec<String>,
    /// Minimum number of characters, exclusive.
    pub min_text_len: usize,
    /// CSS selectors for links to downloadable attachments.
    pub attachment_selectors: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            selectors: strings(&["div.policy-body", "div.section.policy", "main"]),
            min_text_len: 50,
            attachment_selectors: strings(&[
                "a[href*='.pdf']",
                "a[href*='.doc']",
                "a[href*='.xls']",
                "a[href*='attachment']",
                "a[href*='download']",
                ".attachments a",
                "[class*='attachment'] a",
                "a[title*='attachment']",
                "a[title*='download']",
            ]),
        }
    }
}

impl FromConfig for ExtractorConfig {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub normalizer: NormalizerConfig,
    pub extractor: ExtractorConfig,
}

impl FromConfig for Config {}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_heading_prefixes() {
        let config = NormalizerConfig::default();
        assert_eq!(config.heading_prefixes.len(), 13);
        assert!(config.heading_prefixes.contains(&"0.".to_string()));
        assert!(config.heading_prefixes.contains(&"9.".to_string()));
    }

    #[test]
    fn test_inline_json_partial_config() {
        let config = Config::from_config(r#"{"extractor": {"min_text_len": 10}}"#).unwrap();

        assert_eq!(config.extractor.min_text_len, 10);
        assert_eq!(config.extractor.selectors, ExtractorConfig::default().selectors);
        assert_eq!(config.normalizer, NormalizerConfig::default());
    }

    #[test]
    fn test_json_file_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"section_start": "Scope", "chrome_phrases": ["Menu"]}}"#).unwrap();

        let config = NormalizerConfig::from_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.section_start, "Scope");
        assert_eq!(config.chrome_phrases, vec!["Menu".to_string()]);
        assert_eq!(config.toc_marker, "Table of Contents");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();

        let err = Config::from_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat));
    }

    #[cfg(not(feature = "toml_config"))]
    #[test]
    fn test_toml_file_without_feature() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();

        let err = Config::from_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlNotEnabled));
    }

    #[test]
    fn test_display_is_json() {
        let rendered = Config::default().to_string();
        let parsed: Config = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
