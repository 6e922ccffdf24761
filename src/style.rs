use crate::types::{FontWeight, Span};

/// Font-name substrings that mark a face as bold when the renderer doesn't.
pub const DEFAULT_BOLD_MARKERS: [&str; 3] = ["bold", "black", "heavy"];

/// Substring policy deciding a span's boldness class.
///
/// A span is bold when the renderer flags it, or when its font name contains
/// any marker, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightPolicy {
    markers: Vec<String>,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self::with_markers(DEFAULT_BOLD_MARKERS)
    }
}

impl WeightPolicy {
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let markers = markers
            .into_iter()
            .map(|m| m.as_ref().trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { markers }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn is_bold_font(&self, font_name: &str) -> bool {
        let lower = font_name.to_lowercase();
        self.markers.iter().any(|m| lower.contains(m.as_str()))
    }

    pub fn classify(&self, span: &Span) -> FontWeight {
        if span.bold || self.is_bold_font(&span.font_name) {
            FontWeight::Bold
        } else {
            FontWeight::Regular
        }
    }
}
