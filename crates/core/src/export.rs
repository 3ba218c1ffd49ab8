//! Report export.
//!
//! [`ReportExporter`] turns a locked report into a downloadable document.
//! The bundled [`CsvReportExporter`] writes a metadata block followed by one
//! row per checklist item.

use crate::error::InspectionError;
use crate::report::{InspectionReport, ReportRecord};

/// A rendered export ready to be sent to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub content_type: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Inspection(#[from] InspectionError),

    #[error("Export failed: {0}")]
    Render(String),
}

pub trait ReportExporter: Send + Sync {
    /// Render `record`. Fails with [`InspectionError::ReportNotLocked`] for
    /// unlocked reports.
    fn export(&self, record: &ReportRecord) -> Result<ExportedDocument, ExportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvReportExporter;

impl ReportExporter for CsvReportExporter {
    fn export(&self, record: &ReportRecord) -> Result<ExportedDocument, ExportError> {
        let report = &record.report;
        if !report.is_locked() {
            return Err(InspectionError::ReportNotLocked.into());
        }
        Ok(ExportedDocument {
            content_type: "text/csv",
            file_name: format!("inspection-report-{}.csv", record.id),
            bytes: build_report_csv(record.id, report).into_bytes(),
        })
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn build_report_csv(id: i64, report: &InspectionReport) -> String {
    let mut lines = Vec::new();
    let meta: [(&str, String); 8] = [
        ("report_id", id.to_string()),
        ("control", report.control_name().to_string()),
        ("asset", report.asset_name().unwrap_or_default().to_string()),
        ("location", report.location().unwrap_or_default().to_string()),
        ("inspector", report.inspector().display_name.clone()),
        ("started_at", report.started_at().to_rfc3339()),
        ("completed_at", report.completed_at().to_rfc3339()),
        ("overall_result", report.overall_result().label().to_string()),
    ];
    for (key, value) in meta {
        lines.push(format!("{key},{}", csv_escape(&value)));
    }
    if let Some(follow_up) = report.follow_up() {
        let date = follow_up
            .follow_up_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        lines.push(format!("follow_up_date,{date}"));
        lines.push(format!("follow_up_notes,{}", csv_escape(&follow_up.notes)));
        lines.push(format!("follow_up_resolved,{}", follow_up.resolved));
    }

    lines.push(String::new());
    lines.push("item_id,name,priority,status,notes,photo_count".to_string());
    for item in report.items() {
        lines.push(
            [
                csv_escape(item.item_id.as_str()),
                csv_escape(&item.name),
                item.priority.as_str().to_string(),
                item.status.label().to_string(),
                csv_escape(&item.notes),
                item.photo_refs.len().to_string(),
            ]
            .join(","),
        );
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
