use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned box in page units, origin top-left, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Coordinate-wise min/max of both boxes.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A styled run of text as reported by the PDF renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bbox: Rect,
    pub font_name: String,
    pub font_size: f32,
    /// Renderer-supplied bold flag.
    pub bold: bool,
}

/// One renderer line: a positioned group of spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub bbox: Rect,
    pub spans: Vec<Span>,
}

impl Fragment {
    /// Build a fragment whose box is the union of its spans.
    pub fn from_spans(spans: Vec<Span>) -> Option<Self> {
        let bbox = spans.iter().map(|s| s.bbox).reduce(|a, b| a.union(&b))?;
        Some(Self { bbox, spans })
    }
}

/// A block of page content. Only text blocks feed the outline.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(Vec<Fragment>),
    Image,
}

/// Everything the outline pipeline needs from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    /// Zero-based page index.
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<ContentBlock>,
}

/// Fragments sharing a top coordinate, sorted left to right.
#[derive(Debug, Clone)]
pub struct VisualLine {
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    /// CSS-style numeric weight used as a classifier feature.
    pub fn numeric(self) -> u16 {
        match self {
            FontWeight::Regular => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// A boldness-homogeneous run of a visual line; the unit of classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Stable position in document order, assigned at creation.
    pub id: usize,
    /// Concatenated span text, unstripped.
    pub text: String,
    pub bbox: Rect,
    pub font_size: f32,
    pub font_name: String,
    pub weight: FontWeight,
    pub page: usize,
}

/// Per-segment features, in classifier column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub font_size: f32,
    pub font_weight: u16,
    pub x0: f32,
    pub top: f32,
    pub indentation: f32,
    pub word_length: usize,
    pub char_length: usize,
    pub is_all_caps: u8,
    pub has_bullet_or_number: u8,
    pub relative_x0: f32,
    pub relative_top: f32,
    pub line_spacing_above: f32,
    pub page: usize,
}

impl FeatureVector {
    /// Values in the order of [`crate::table::BASE_COLUMNS`].
    pub fn values(&self) -> [f64; 13] {
        [
            f64::from(self.font_size),
            f64::from(self.font_weight),
            f64::from(self.x0),
            f64::from(self.top),
            f64::from(self.indentation),
            self.word_length as f64,
            self.char_length as f64,
            f64::from(self.is_all_caps),
            f64::from(self.has_bullet_or_number),
            f64::from(self.relative_x0),
            f64::from(self.relative_top),
            f64::from(self.line_spacing_above),
            self.page as f64,
        ]
    }
}

/// Classifier output label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "title")]
    Title,
    H1,
    H2,
    H3,
    #[serde(rename = "other")]
    Other,
}

impl Label {
    /// Nesting depth: title is 0, headings 1-3, `other` has none.
    pub fn level(self) -> Option<u8> {
        match self {
            Label::Title => Some(0),
            Label::H1 => Some(1),
            Label::H2 => Some(2),
            Label::H3 => Some(3),
            Label::Other => None,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Label::Title),
            1 => Some(Label::H1),
            2 => Some(Label::H2),
            3 => Some(Label::H3),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Title => "title",
            Label::H1 => "H1",
            Label::H2 => "H2",
            Label::H3 => "H3",
            Label::Other => "other",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A segment with its features and a label the reconciler may rewrite.
#[derive(Debug, Clone)]
pub struct LabeledSegment {
    pub segment: Segment,
    pub features: FeatureVector,
    pub label: Label,
}

impl LabeledSegment {
    pub fn text(&self) -> &str {
        self.segment.text.trim()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn from_label(label: Label) -> Option<Self> {
        match label {
            Label::H1 => Some(HeadingLevel::H1),
            Label::H2 => Some(HeadingLevel::H2),
            Label::H3 => Some(HeadingLevel::H3),
            Label::Title | Label::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    /// Zero-based page index.
    pub page: usize,
}

/// The per-document output record.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DocumentResult {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}
