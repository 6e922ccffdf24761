use std::ops::Range;

use crate::types::{DocumentResult, HeadingLevel, Label, LabeledSegment, OutlineEntry};

/// Repair raw classifier labels into a title and a properly nested outline.
///
/// `segments` must be in document order (page, then reading order within
/// the page). Labels are rewritten in place, addressed by index.
pub fn reconcile(segments: &mut [LabeledSegment], title_spacing: f32) -> DocumentResult {
    let title = detect_title(segments, title_spacing);
    repair_level_gaps(segments);
    DocumentResult {
        title,
        outline: assemble_outline(segments),
    }
}

/// First segment with the largest font size on page 0.
fn find_title_anchor(segments: &[LabeledSegment]) -> Option<usize> {
    let mut anchor: Option<usize> = None;
    for (i, s) in segments.iter().enumerate() {
        if s.features.page != 0 {
            continue;
        }
        if anchor.is_none_or(|a| s.features.font_size > segments[a].features.font_size) {
            anchor = Some(i);
        }
    }
    anchor
}

/// End (exclusive) of the title run that starts at `anchor`.
///
/// Following segments join while they repeat the anchor's page, font size
/// and weight and sit closer than `title_spacing` font sizes below the
/// previous segment.
fn title_run_end(segments: &[LabeledSegment], anchor: usize, title_spacing: f32) -> usize {
    let first = &segments[anchor].features;
    let max_spacing = first.font_size * title_spacing;
    let joined = segments[anchor + 1..]
        .iter()
        .take_while(|s| {
            let f = &s.features;
            f.page == first.page
                && f.font_size == first.font_size
                && f.font_weight == first.font_weight
                && f.line_spacing_above < max_spacing
        })
        .count();
    anchor + 1 + joined
}

fn detect_title(segments: &mut [LabeledSegment], title_spacing: f32) -> String {
    let run = match find_title_anchor(segments) {
        Some(anchor) if segments[anchor].text().chars().any(char::is_alphanumeric) => {
            anchor..title_run_end(segments, anchor, title_spacing)
        }
        Some(anchor) => {
            if segments[anchor].label == Label::Title {
                segments[anchor].label = Label::Other;
            }
            anchor..anchor
        }
        None => 0..0,
    };

    for s in &mut segments[run.clone()] {
        s.label = Label::Title;
    }
    relabel_stray_titles(segments, &run);

    segments[run]
        .iter()
        .map(LabeledSegment::text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Titles outside the detected run are read as top-level headings.
fn relabel_stray_titles(segments: &mut [LabeledSegment], run: &Range<usize>) {
    for (i, s) in segments.iter_mut().enumerate() {
        if s.label == Label::Title && !run.contains(&i) {
            s.label = Label::H1;
        }
    }
}

/// Indices of matching segments sorted by (page, top); ties keep document order.
fn reading_order(segments: &[LabeledSegment], keep: impl Fn(Label) -> bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..segments.len()).filter(|&i| keep(segments[i].label)).collect();
    order.sort_by(|&a, &b| {
        let (fa, fb) = (&segments[a].features, &segments[b].features);
        fa.page.cmp(&fb.page).then(fa.top.total_cmp(&fb.top))
    });
    order
}

/// Clamp any heading deeper than one level below its predecessor.
fn repair_level_gaps(segments: &mut [LabeledSegment]) {
    let mut last_level = 0;
    for i in reading_order(segments, |label| label.level().is_some()) {
        let Some(mut level) = segments[i].label.level() else {
            continue;
        };
        if level > last_level + 1 {
            level = last_level + 1;
            if let Some(label) = Label::from_level(level) {
                segments[i].label = label;
            }
        }
        last_level = level;
    }
}

fn assemble_outline(segments: &[LabeledSegment]) -> Vec<OutlineEntry> {
    reading_order(segments, |label| HeadingLevel::from_label(label).is_some())
        .into_iter()
        .filter_map(|i| {
            let s = &segments[i];
            Some(OutlineEntry {
                level: HeadingLevel::from_label(s.label)?,
                text: s.text().to_string(),
                page: s.features.page,
            })
        })
        .collect()
}
