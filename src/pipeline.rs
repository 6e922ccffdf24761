use std::path::Path;

use log::debug;

use crate::config::ExtractConfig;
use crate::error::{OutlineError, Result};
use crate::features;
use crate::layout;
use crate::model::LabelClassifier;
use crate::pdf::PageSource;
use crate::reconcile;
use crate::table::FeatureTable;
use crate::types::{DocumentResult, Label, LabeledSegment, PageContent};

/// Reconstruct segments and compute their features for a whole document.
///
/// Segments come back in document order with ids equal to their index;
/// every label starts as `other` until classified.
pub fn extract_segments(pages: &[PageContent], config: &ExtractConfig) -> Vec<LabeledSegment> {
    let mut next_id = 0;
    let mut labeled = Vec::new();
    for page in pages {
        let segments =
            layout::reconstruct_page(page, config.top_tolerance, &config.weight_policy, &mut next_id);
        let features = features::page_features(&segments, page.width, page.height, config.margin);
        debug!("page {}: {} segment(s)", page.index + 1, segments.len());
        labeled.extend(
            segments
                .into_iter()
                .zip(features)
                .map(|(segment, features)| LabeledSegment { segment, features, label: Label::Other }),
        );
    }
    labeled
}

/// Assign classifier labels to every segment.
pub fn classify(segments: &mut [LabeledSegment], classifier: &dyn LabelClassifier) -> Result<()> {
    let table = FeatureTable::for_classifier(segments, classifier.expected_columns());
    if table.is_empty() {
        return Ok(());
    }
    let labels = classifier.predict(&table)?;
    if labels.len() != table.len() {
        return Err(OutlineError::ModelUnavailable(format!(
            "classifier returned {} labels for {} segments",
            labels.len(),
            table.len()
        )));
    }
    for (segment, label) in segments.iter_mut().zip(labels) {
        segment.label = label;
    }
    Ok(())
}

/// Run the full pipeline over already-extracted pages.
///
/// Returns `None` when the document has no text to classify.
pub fn process_pages(
    pages: &[PageContent],
    classifier: &dyn LabelClassifier,
    config: &ExtractConfig,
) -> Result<Option<DocumentResult>> {
    let mut segments = extract_segments(pages, config);
    if segments.is_empty() {
        return Ok(None);
    }
    classify(&mut segments, classifier)?;
    Ok(Some(reconcile::reconcile(&mut segments, config.title_spacing)))
}

/// Load a document from `source` and run the pipeline on it.
pub fn process_document(
    source: &dyn PageSource,
    path: &Path,
    classifier: &dyn LabelClassifier,
    config: &ExtractConfig,
) -> Result<Option<DocumentResult>> {
    let pages = source.load_pages(path)?;
    process_pages(&pages, classifier, config)
}
