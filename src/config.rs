use crate::style::WeightPolicy;

/// Fragments whose tops differ by less than this share a visual line.
pub const DEFAULT_TOP_TOLERANCE: f32 = 0.5;
/// Left page margin subtracted from x0 to get indentation.
pub const DEFAULT_MARGIN: f32 = 72.0;
/// Title continuation needs spacing below this multiple of the anchor font size.
pub const DEFAULT_TITLE_SPACING: f32 = 1.5;

/// Thresholds and policies shared by every pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub top_tolerance: f32,
    pub margin: f32,
    pub title_spacing: f32,
    pub weight_policy: WeightPolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            top_tolerance: DEFAULT_TOP_TOLERANCE,
            margin: DEFAULT_MARGIN,
            title_spacing: DEFAULT_TITLE_SPACING,
            weight_policy: WeightPolicy::default(),
        }
    }
}
