mod attachments;
mod cleaner;
mod config;
mod error;
mod extractor;
mod harvest;
mod normalizer;
mod policy;

pub use attachments::{attachment_links, Attachment};
pub use cleaner::TextCleaner;
pub use config::{Config, ExtractorConfig, FromConfig, NormalizerConfig};
pub use error::{ConfigError, DocumentError, ExtractError, HarvestError, SourceError};
pub use extractor::{visible_text, PolicyExtractor, PolicyExtractorBuilder};
pub use harvest::{write_atomically, HarvestReport, PageSource, PolicyHarvester};
pub use normalizer::{normalize, Normalizer};
pub use policy::{load_policies, safe_filename, PolicyEntry};
