use std::collections::BTreeSet;

use log::debug;

use crate::types::LabeledSegment;

/// Column schema the classifier is trained on, in order.
pub const BASE_COLUMNS: [&str; 13] = [
    "font_size",
    "font_weight",
    "x0",
    "top",
    "indentation",
    "word_length",
    "char_length",
    "is_all_caps",
    "has_bullet_or_number",
    "relative_x0",
    "relative_top",
    "line_spacing_above",
    "page",
];

/// Prefix of one-hot font name columns.
pub const FONT_NAME_PREFIX: &str = "font_name_";

/// Row-major numeric table handed to the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Base feature columns for every segment.
    pub fn from_segments(segments: &[LabeledSegment]) -> Self {
        Self {
            columns: BASE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: segments.iter().map(|s| s.features.values().to_vec()).collect(),
        }
    }

    /// Table shaped for a classifier expecting `expected` columns, if known.
    ///
    /// Font names are one-hot encoded only when the classifier asks for any
    /// `font_name_*` column. Missing columns are filled with zero and
    /// unexpected ones dropped.
    pub fn for_classifier(segments: &[LabeledSegment], expected: Option<&[String]>) -> Self {
        let mut table = Self::from_segments(segments);
        let Some(expected) = expected else {
            return table;
        };
        if expected.iter().any(|c| c.starts_with(FONT_NAME_PREFIX)) {
            table.add_font_names(segments);
        }
        table.reindex(expected)
    }

    fn add_font_names(&mut self, segments: &[LabeledSegment]) {
        let fonts: BTreeSet<&str> = segments.iter().map(|s| s.segment.font_name.as_str()).collect();
        for font in &fonts {
            self.columns.push(format!("{FONT_NAME_PREFIX}{font}"));
        }
        for (row, segment) in self.rows.iter_mut().zip(segments) {
            row.extend(
                fonts
                    .iter()
                    .map(|font| if *font == segment.segment.font_name { 1.0 } else { 0.0 }),
            );
        }
    }

    /// Reorder columns to `expected`, zero-filling missing ones.
    pub fn reindex(&self, expected: &[String]) -> Self {
        let positions: Vec<Option<usize>> = expected.iter().map(|c| self.column(c)).collect();
        let missing: Vec<&str> = expected
            .iter()
            .zip(&positions)
            .filter(|(_, p)| p.is_none())
            .map(|(c, _)| c.as_str())
            .collect();
        let dropped = self.columns.iter().filter(|c| !expected.contains(c)).count();
        if !missing.is_empty() || dropped > 0 {
            debug!(
                "Feature schema mismatch: {} missing column(s) {:?}, {dropped} dropped",
                missing.len(),
                missing
            );
        }

        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|p| p.map_or(0.0, |i| row[i])).collect())
            .collect();
        Self { columns: expected.to_vec(), rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features;
    use crate::types::{FontWeight, Label, Rect, Segment};

    pub(crate) fn labeled(id: usize, font: &str, size: f32) -> LabeledSegment {
        let segment = Segment {
            id,
            text: format!("segment {id}"),
            bbox: Rect::new(72.0, 100.0 + id as f32 * 20.0, 300.0, 112.0 + id as f32 * 20.0),
            font_size: size,
            font_name: font.into(),
            weight: FontWeight::Regular,
            page: 0,
        };
        let features = features::compute(&segment, 612.0, 792.0, None, 72.0);
        LabeledSegment { segment, features, label: Label::Other }
    }

    fn names(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn base_table_follows_the_fixed_schema() {
        let table = FeatureTable::for_classifier(&[labeled(0, "Arial", 12.0)], None);
        assert_eq!(table.columns(), BASE_COLUMNS);
        assert_eq!(table.rows()[0][0], 12.0);
        assert_eq!(table.rows()[0][1], 400.0);
    }

    #[test]
    fn reindex_fills_missing_and_drops_extra() {
        let segments = [labeled(0, "Arial", 12.0), labeled(1, "Arial", 16.0)];
        let expected = names(&["page", "font_size", "line_height"]);
        let table = FeatureTable::for_classifier(&segments, Some(&expected));
        assert_eq!(table.columns(), expected);
        assert_eq!(table.rows(), [vec![0.0, 12.0, 0.0], vec![0.0, 16.0, 0.0]]);
    }

    #[test]
    fn font_names_are_one_hot_when_requested() {
        let segments = [labeled(0, "Arial", 12.0), labeled(1, "Times-Bold", 16.0)];
        let expected = names(&["font_size", "font_name_Times-Bold", "font_name_Courier"]);
        let table = FeatureTable::for_classifier(&segments, Some(&expected));
        assert_eq!(table.rows(), [vec![12.0, 0.0, 0.0], vec![16.0, 1.0, 0.0]]);
    }

    #[test]
    fn font_names_are_skipped_when_not_requested() {
        let segments = [labeled(0, "Arial", 12.0)];
        let expected = names(&BASE_COLUMNS);
        let table = FeatureTable::for_classifier(&segments, Some(&expected));
        assert!(table.column("font_name_Arial").is_none());
        assert_eq!(table.len(), 1);
    }
}
