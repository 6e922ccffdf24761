use crate::style::WeightPolicy;
use crate::types::{ContentBlock, FontWeight, Fragment, PageContent, Rect, Segment, Span, VisualLine};

/// Reconstruct the segments of one page in reading order.
///
/// `next_id` carries the document-wide segment counter so ids stay unique
/// and follow document order across pages.
pub fn reconstruct_page(
    page: &PageContent,
    top_tolerance: f32,
    policy: &WeightPolicy,
    next_id: &mut usize,
) -> Vec<Segment> {
    group_visual_lines(page, top_tolerance)
        .iter()
        .flat_map(|line| split_segments(line, page.index, policy, next_id))
        .collect()
}

/// Group text fragments into visual lines by their top coordinate.
///
/// Fragments are swept in (top, left) order; a fragment joins the current
/// line while its top is within `tolerance` of the line's first fragment.
pub fn group_visual_lines(page: &PageContent, tolerance: f32) -> Vec<VisualLine> {
    let mut fragments: Vec<&Fragment> = page
        .blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text(fragments) => Some(fragments),
            ContentBlock::Image => None,
        })
        .flatten()
        .collect();
    fragments.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.left.total_cmp(&b.bbox.left))
    });

    let mut lines: Vec<VisualLine> = Vec::new();
    let mut current: Vec<Fragment> = Vec::new();
    for fragment in fragments {
        let joins = current
            .first()
            .is_some_and(|first| (fragment.bbox.top - first.bbox.top).abs() < tolerance);
        if !joins && !current.is_empty() {
            lines.push(VisualLine { fragments: std::mem::take(&mut current) });
        }
        current.push(fragment.clone());
    }
    if !current.is_empty() {
        lines.push(VisualLine { fragments: current });
    }
    lines
}

struct SegmentAccum {
    text: String,
    bbox: Rect,
    font_size: f32,
    font_name: String,
    weight: Option<FontWeight>,
}

impl SegmentAccum {
    fn new() -> Self {
        Self {
            text: String::new(),
            bbox: Rect::new(0.0, 0.0, 0.0, 0.0),
            font_size: 0.0,
            font_name: String::new(),
            weight: None,
        }
    }

    fn start(&mut self, span: &Span, weight: FontWeight) {
        self.text.clear();
        self.text.push_str(&span.text);
        self.bbox = span.bbox;
        self.font_size = span.font_size;
        self.font_name.clone_from(&span.font_name);
        self.weight = Some(weight);
    }

    fn extend(&mut self, span: &Span) {
        self.text.push_str(&span.text);
        self.bbox = self.bbox.union(&span.bbox);
    }

    fn flush(&mut self, segments: &mut Vec<Segment>, page: usize, next_id: &mut usize) {
        let Some(weight) = self.weight.take() else {
            return;
        };
        if self.text.trim().is_empty() {
            return;
        }
        segments.push(Segment {
            id: *next_id,
            text: std::mem::take(&mut self.text),
            bbox: self.bbox,
            font_size: self.font_size,
            font_name: std::mem::take(&mut self.font_name),
            weight,
            page,
        });
        *next_id += 1;
    }
}

/// Split a visual line into boldness-homogeneous segments.
///
/// Spans from all fragments are re-sorted by left edge, since a renderer may
/// split one printed line into interleaving fragments. Empty spans still
/// close a segment when their boldness differs.
pub fn split_segments(
    line: &VisualLine,
    page: usize,
    policy: &WeightPolicy,
    next_id: &mut usize,
) -> Vec<Segment> {
    let mut spans: Vec<&Span> = line.fragments.iter().flat_map(|f| &f.spans).collect();
    spans.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));

    let mut segments = Vec::new();
    let mut acc = SegmentAccum::new();
    for span in spans {
        let weight = policy.classify(span);
        match acc.weight {
            Some(current) if current == weight => acc.extend(span),
            Some(_) => {
                acc.flush(&mut segments, page, next_id);
                acc.start(span, weight);
            }
            None => acc.start(span, weight),
        }
    }
    acc.flush(&mut segments, page, next_id);
    segments
}
