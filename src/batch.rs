use std::io::{Read, Write};

use serde::Serialize;

use crate::form::StudentForm;
use crate::models::StudentRecord;
use crate::report;

#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    name: &'a str,
    student_id: &'a str,
    email: &'a str,
    attendance: f64,
    homework_completion: f64,
    test_scores: f64,
    prediction: bool,
    probability: f64,
    remarks: &'static str,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub scored: usize,
    pub skipped: usize,
}

/// Scores every row of a CSV with the form's column names and writes the
/// scored rows to `output`. Rows that fail validation are logged and skipped.
pub fn score_csv<R: Read, W: Write>(input: R, output: W) -> anyhow::Result<BatchSummary> {
    let mut reader = csv::Reader::from_reader(input);
    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary::default();

    for (index, result) in reader.deserialize::<StudentForm>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let form = match result {
            Ok(form) => form,
            Err(err) => {
                tracing::warn!(line, error = %err, "skipping unreadable row");
                summary.skipped += 1;
                continue;
            }
        };

        let record = match form.validate() {
            Ok(input) => StudentRecord::score(input),
            Err(err) => {
                tracing::warn!(line, error = %err, "skipping invalid row");
                summary.skipped += 1;
                continue;
            }
        };

        writer.serialize(ScoredRow {
            name: &record.name,
            student_id: &record.student_id,
            email: &record.email,
            attendance: record.attendance,
            homework_completion: record.homework_completion,
            test_scores: record.test_scores,
            prediction: record.prediction,
            probability: record.probability,
            remarks: record.remarks(),
        })?;
        summary.scored += 1;
    }

    writer.flush()?;
    Ok(summary)
}

/// Human-readable line for one scored student, used by the CLI.
pub fn describe(record: &StudentRecord) -> String {
    format!(
        "{} ({}) weighted percentage {}% -> {}",
        record.name,
        record.student_id,
        report::display_number(record.probability),
        record.remarks()
    )
}
