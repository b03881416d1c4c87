use crate::Normalizer;

/// Turns extracted page text into the text that gets stored.
pub trait TextCleaner: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

impl TextCleaner for Normalizer {
    fn clean(&self, text: &str) -> String {
        self.normalize(text)
    }
}

impl<F> TextCleaner for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn clean(&self, text: &str) -> String {
        self(text)
    }
}
