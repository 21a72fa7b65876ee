use serde::{Deserialize, Serialize};

use crate::scoring;

/// Validated submission, numeric fields already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentInput {
    pub name: String,
    pub student_id: String,
    pub email: String,
    pub attendance: f64,
    pub homework_completion: f64,
    pub test_scores: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub prediction: bool,
    pub probability: f64,
}

/// One scored student, held in the session slot until the next submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub name: String,
    pub student_id: String,
    pub email: String,
    pub attendance: f64,
    pub homework_completion: f64,
    pub test_scores: f64,
    pub prediction: bool,
    pub probability: f64,
}

impl StudentRecord {
    pub fn score(input: StudentInput) -> Self {
        let outcome = scoring::score(
            input.attendance,
            input.homework_completion,
            input.test_scores,
        );

        StudentRecord {
            name: input.name,
            student_id: input.student_id,
            email: input.email,
            attendance: input.attendance,
            homework_completion: input.homework_completion,
            test_scores: input.test_scores,
            prediction: outcome.prediction,
            probability: outcome.probability,
        }
    }

    pub fn outcome(&self) -> ScoreOutcome {
        ScoreOutcome {
            prediction: self.prediction,
            probability: self.probability,
        }
    }

    pub fn remarks(&self) -> &'static str {
        if self.prediction {
            "Good Student"
        } else {
            "Needs Improvement"
        }
    }

    pub fn message(&self) -> &'static str {
        if self.prediction {
            "Good Result! The student is likely to perform well."
        } else {
            "Bad Result! The student may not succeed based on current indicators."
        }
    }
}
