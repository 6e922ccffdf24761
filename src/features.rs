use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{FeatureVector, Segment};

/// Bullet glyph followed by whitespace, or a `1.`, `(a)`, `iv)` style number.
static BULLET_OR_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[-*•–—]\s+|^(?:\d+\.|\([a-zA-Z0-9]+\)|\w+\))\s+").unwrap()
});

/// Compute features for every segment of one page, in order.
///
/// The previous segment's bottom edge carries across visual lines but
/// starts fresh on each page.
pub fn page_features(
    segments: &[Segment],
    page_width: f32,
    page_height: f32,
    margin: f32,
) -> Vec<FeatureVector> {
    let mut prev_bottom = None;
    segments
        .iter()
        .map(|segment| {
            let features = compute(segment, page_width, page_height, prev_bottom, margin);
            prev_bottom = Some(round2(segment.bbox.bottom));
            features
        })
        .collect()
}

/// Feature vector of one segment. Pure in all of its inputs.
pub fn compute(
    segment: &Segment,
    page_width: f32,
    page_height: f32,
    prev_bottom: Option<f32>,
    margin: f32,
) -> FeatureVector {
    let x0 = round2(segment.bbox.left);
    let top = round2(segment.bbox.top);
    let stripped = segment.text.trim();

    FeatureVector {
        font_size: round2(segment.font_size),
        font_weight: segment.weight.numeric(),
        x0,
        top,
        indentation: round2((x0 - margin).max(0.0)),
        word_length: segment.text.split_whitespace().count(),
        char_length: segment.text.chars().count(),
        is_all_caps: u8::from(is_all_caps(stripped)),
        has_bullet_or_number: u8::from(has_bullet_or_number(stripped)),
        relative_x0: relative(x0, page_width),
        relative_top: relative(top, page_height),
        line_spacing_above: prev_bottom.map_or(0.0, |bottom| round2(top - bottom)),
        page: segment.page,
    }
}

/// Uppercase with at least one letter; digits and punctuation are ignored.
pub fn is_all_caps(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
        && text.chars().any(char::is_uppercase)
        && !text.chars().any(char::is_lowercase)
}

pub fn has_bullet_or_number(text: &str) -> bool {
    BULLET_OR_NUMBER_RE.is_match(text)
}

fn relative(value: f32, extent: f32) -> f32 {
    if extent > 0.0 {
        round_to(value / extent, 4)
    } else {
        0.0
    }
}

pub fn round2(value: f32) -> f32 {
    round_to(value, 2)
}

fn round_to(value: f32, places: i32) -> f32 {
    let factor = 10f64.powi(places);
    ((f64::from(value) * factor).round() / factor) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FontWeight, Rect};
    use proptest::prelude::*;

    fn segment(text: &str, left: f32, top: f32, bottom: f32) -> Segment {
        Segment {
            id: 0,
            text: text.into(),
            bbox: Rect::new(left, top, left + 100.0, bottom),
            font_size: 11.996,
            font_name: "Arial".into(),
            weight: FontWeight::Bold,
            page: 3,
        }
    }

    #[test]
    fn bullet_line_is_flagged() {
        let f = compute(&segment("• Introduction", 72.0, 100.0, 112.0), 612.0, 792.0, None, 72.0);
        assert_eq!(f.has_bullet_or_number, 1);
        assert_eq!(f.indentation, 0.0);
    }

    #[test]
    fn bullet_and_numbering_patterns() {
        for text in ["- item", "* item", "– item", "— item", "1. Scope", "12. Scope", "(a) first", "(3) third", "iv) roman", "b) second"] {
            assert!(has_bullet_or_number(text), "{text}");
        }
        for text in ["Introduction", "1.2 Overview", "-dash", "3.14", "2024 EDITION", "(a)no-space"] {
            assert!(!has_bullet_or_number(text), "{text}");
        }
    }

    #[test]
    fn all_caps_needs_a_letter() {
        assert!(is_all_caps("ANNUAL REPORT 2024"));
        assert!(!is_all_caps("2024"));
        assert!(!is_all_caps("Annual Report"));
        assert!(!is_all_caps("..."));
    }

    #[test]
    fn geometry_features_are_rounded() {
        let f = compute(&segment("  Two words ", 90.456, 123.4567, 135.0), 612.0, 792.0, Some(110.111), 72.0);
        assert_eq!(f.font_size, 12.0);
        assert_eq!(f.font_weight, 700);
        assert_eq!(f.x0, 90.46);
        assert_eq!(f.top, 123.46);
        assert_eq!(f.indentation, 18.46);
        assert_eq!(f.word_length, 2);
        assert_eq!(f.char_length, 12);
        assert_eq!(f.is_all_caps, 0);
        assert_eq!(f.relative_x0, 0.1478);
        assert_eq!(f.relative_top, 0.1559);
        assert_eq!(f.line_spacing_above, 13.35);
        assert_eq!(f.page, 3);
    }

    #[test]
    fn zero_sized_page_gives_zero_relative_positions() {
        let f = compute(&segment("Heading", 80.0, 40.0, 50.0), 0.0, 0.0, None, 72.0);
        assert_eq!(f.relative_x0, 0.0);
        assert_eq!(f.relative_top, 0.0);
        assert_eq!(f.line_spacing_above, 0.0);
    }

    #[test]
    fn spacing_chains_through_the_page() {
        let segments = vec![
            segment("first", 72.0, 100.0, 112.0),
            segment("second", 72.0, 120.0, 132.0),
            segment("third", 200.0, 120.0, 131.0),
        ];
        let features = page_features(&segments, 612.0, 792.0, 72.0);
        let spacing: Vec<f32> = features.iter().map(|f| f.line_spacing_above).collect();
        assert_eq!(spacing, [0.0, 8.0, -12.0]);
    }

    proptest! {
        #[test]
        fn features_are_pure(
            left in 0f32..600.0,
            top in 0f32..780.0,
            height in 1f32..40.0,
            prev in proptest::option::of(0f32..780.0),
            text in "[A-Za-z0-9 •.()-]{0,24}",
        ) {
            let s = segment(&text, left, top, top + height);
            let a = compute(&s, 612.0, 792.0, prev, 72.0);
            let b = compute(&s, 612.0, 792.0, prev, 72.0);
            prop_assert_eq!(a, b);
        }
    }
}
