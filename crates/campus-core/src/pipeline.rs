use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ScheduleError;
use crate::extract::extract_reply;
use crate::gigachat::ChatProvider;
use crate::normalize::{Lesson, merge_fields, normalize_record};
use crate::prompt::{encode_sheet, fallback_parse};
use crate::table::read_table;

/// Outcome of one table row, in the shape the upload API returns.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RowOutcome {
    /// Fully normalized and valid.
    Lesson(Lesson),
    /// Normalized, but the record failed schema validation; all fields are
    /// kept alongside the marker.
    Invalid {
        #[serde(flatten)]
        fields: Lesson,
        error: &'static str,
    },
    /// The remote call for this row failed.
    Failed { raw: String, error: String },
}

#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub status: &'static str,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<Vec<RowOutcome>>,
}

impl PipelineResult {
    fn read_failure(file: String, error: String) -> Self {
        Self {
            status: "error",
            file,
            error: Some(error),
            count: None,
            normalized: None,
        }
    }

    fn completed(file: String, normalized: Vec<RowOutcome>, count: usize) -> Self {
        Self {
            status: "ok",
            file,
            error: None,
            count: Some(count),
            normalized: Some(normalized),
        }
    }
}

/// Runs the whole extraction pipeline over one uploaded table.
///
/// Table-read failures come back as a top-level error result; an
/// authentication failure aborts the run with an error (no partial results).
/// Everything after the token is row-isolated: a failing remote call or an
/// invalid record marks that row and processing continues. Rows run strictly
/// sequentially with no retries.
pub async fn run_pipeline(
    path: &Path,
    provider: &dyn ChatProvider,
) -> Result<PipelineResult, ScheduleError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let sheets = match read_table(path) {
        Ok(sheets) => sheets,
        Err(err) => {
            warn!(file = %file_name, error = %err, "table read failed");
            return Ok(PipelineResult::read_failure(
                file_name,
                format!("file read error: {err}"),
            ));
        }
    };

    let prompts: Vec<String> = sheets.iter().flat_map(encode_sheet).collect();
    info!(file = %file_name, rows = prompts.len(), "encoded table rows");

    if prompts.is_empty() {
        return Ok(PipelineResult::completed(file_name, Vec::new(), 0));
    }

    let token = provider.acquire_token().await?;

    let count = prompts.len();
    let mut normalized = Vec::with_capacity(count);
    for (index, prompt) in prompts.iter().enumerate() {
        match process_row(provider, &token, prompt).await {
            Ok(outcome) => normalized.push(outcome),
            Err(err) => {
                warn!(row = index, error = %err, "remote call failed, row isolated");
                normalized.push(RowOutcome::Failed {
                    raw: prompt.clone(),
                    error: err.marker(),
                });
            }
        }
    }

    info!(file = %file_name, count, "pipeline finished");
    Ok(PipelineResult::completed(file_name, normalized, count))
}

async fn process_row(
    provider: &dyn ChatProvider,
    token: &str,
    prompt: &str,
) -> Result<RowOutcome, ScheduleError> {
    let reply = provider.complete(token, prompt).await?;
    let (parsed, raw_text) = extract_reply(&reply);
    if parsed.is_none() {
        debug!(reply = %raw_text, "model reply carried no parsable JSON");
    }

    // Model fields first, fallback pairs overlaid; fallback wins on conflict.
    let fallback = fallback_parse(prompt);
    let merged = merge_fields(parsed.as_ref(), &fallback);
    let lesson = normalize_record(&merged, prompt);

    Ok(match lesson.validate() {
        Ok(()) => RowOutcome::Lesson(lesson),
        Err(reason) => {
            debug!(reason, "normalized record failed validation");
            RowOutcome::Invalid {
                fields: lesson,
                error: "validation_failed",
            }
        }
    })
}
