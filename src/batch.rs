use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{error, info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::config::ExtractConfig;
use crate::error::{OutlineError, Result};
use crate::model::LabelClassifier;
use crate::pdf::PageSource;
use crate::pipeline;
use crate::types::DocumentResult;

/// Outcome counts of one batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub written: usize,
    pub empty: usize,
    pub failed: Vec<(PathBuf, OutlineError)>,
}

/// PDF files directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Process every PDF in `input_dir`, writing `<stem>.json` into `output_dir`.
///
/// A failing document is logged and recorded; the rest of the batch still runs.
pub fn run(
    input_dir: &Path,
    output_dir: &Path,
    source: &dyn PageSource,
    classifier: &dyn LabelClassifier,
    config: &ExtractConfig,
) -> Result<BatchSummary> {
    let inputs = list_pdfs(input_dir)?;
    fs::create_dir_all(output_dir)?;

    let mut summary = BatchSummary::default();
    for input in inputs {
        let started = Instant::now();
        let outcome = pipeline::process_document(source, &input, classifier, config)
            .and_then(|result| match result {
                Some(result) => {
                    write_result(&result, &output_path(&input, output_dir))?;
                    Ok(true)
                }
                None => Ok(false),
            });
        let name = input.display();
        match outcome {
            Ok(true) => {
                summary.written += 1;
                info!("Processed {name} in {:.2} seconds", started.elapsed().as_secs_f64());
            }
            Ok(false) => {
                summary.empty += 1;
                warn!("No text segments in {name}, nothing written");
            }
            Err(e) => {
                error!("Failed to process {name}: {e}");
                summary.failed.push((input, e));
            }
        }
    }
    Ok(summary)
}

pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".json");
    output_dir.join(name)
}

/// JSON with 4-space indentation.
pub fn to_json_pretty(result: &DocumentResult) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    result.serialize(&mut serializer)?;
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn write_result(result: &DocumentResult, path: &Path) -> Result<()> {
    fs::write(path, to_json_pretty(result)?)?;
    Ok(())
}
