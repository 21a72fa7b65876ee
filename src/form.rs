use serde::Deserialize;
use thiserror::Error;

use crate::models::StudentInput;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    Missing { field: &'static str },

    #[error("field {field} must be a number, got {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("field {field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("malformed form submission: {reason}")]
    Malformed { reason: String },
}

// Caps keep a worst-case record (every character JSON-escaped twice) well
// inside the 4064 bytes the cookie session store accepts.
pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_STUDENT_ID_CHARS: usize = 64;
pub const MAX_EMAIL_CHARS: usize = 254;

/// Raw submission as it arrives from a form post or CSV row. Every field is
/// optional here so absence is reported as a validation error instead of a
/// generic extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentForm {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub email: Option<String>,
    pub attendance: Option<String>,
    pub homework_completion: Option<String>,
    pub test_scores: Option<String>,
}

impl StudentForm {
    pub fn validate(self) -> Result<StudentInput, ValidationError> {
        Ok(StudentInput {
            attendance: parse_number("attendance", self.attendance.as_deref())?,
            homework_completion: parse_number(
                "homework_completion",
                self.homework_completion.as_deref(),
            )?,
            test_scores: parse_number("test_scores", self.test_scores.as_deref())?,
            name: require("name", self.name, MAX_NAME_CHARS)?,
            student_id: require("student_id", self.student_id, MAX_STUDENT_ID_CHARS)?,
            email: require("email", self.email, MAX_EMAIL_CHARS)?,
        })
    }
}

fn require(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing { field })?;
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value)
}

pub fn parse_number(field: &'static str, raw: Option<&str>) -> Result<f64, ValidationError> {
    let raw = raw.ok_or(ValidationError::Missing { field })?;
    let not_numeric = || ValidationError::NotNumeric {
        field,
        value: raw.to_string(),
    };

    let value: f64 = raw.trim().parse().map_err(|_| not_numeric())?;
    if !value.is_finite() {
        return Err(not_numeric());
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> StudentForm {
        StudentForm {
            name: Some("Avery Lee".to_string()),
            student_id: Some("S-1001".to_string()),
            email: Some("avery@example.com".to_string()),
            attendance: Some("80".to_string()),
            homework_completion: Some(" 90.5 ".to_string()),
            test_scores: Some("70".to_string()),
        }
    }

    #[test]
    fn parses_numeric_fields() {
        let input = sample_form().validate().unwrap();
        assert_eq!(input.attendance, 80.0);
        assert_eq!(input.homework_completion, 90.5);
        assert_eq!(input.test_scores, 70.0);
        assert_eq!(input.student_id, "S-1001");
    }

    #[test]
    fn rejects_non_numeric_value() {
        let form = StudentForm {
            test_scores: Some("seventy".to_string()),
            ..sample_form()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::NotNumeric {
                field: "test_scores",
                value: "seventy".to_string(),
            })
        );
    }

    #[test]
    fn rejects_missing_fields() {
        let form = StudentForm {
            attendance: None,
            ..sample_form()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::Missing { field: "attendance" })
        );

        let form = StudentForm {
            email: None,
            ..sample_form()
        };
        assert_eq!(form.validate(), Err(ValidationError::Missing { field: "email" }));
    }

    #[test]
    fn rejects_non_finite_numbers() {
        for raw in ["NaN", "inf", "-infinity", ""] {
            let result = parse_number("attendance", Some(raw));
            assert!(matches!(result, Err(ValidationError::NotNumeric { .. })), "{raw}");
        }
    }

    #[test]
    fn rejects_overlong_text_fields() {
        let form = StudentForm {
            name: Some("A".repeat(5000)),
            ..sample_form()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_CHARS,
            })
        );

        let form = StudentForm {
            email: Some("e".repeat(MAX_EMAIL_CHARS + 1)),
            ..sample_form()
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::TooLong { field: "email", .. })
        ));
    }

    #[test]
    fn accepts_text_at_the_cap() {
        let form = StudentForm {
            name: Some("é".repeat(MAX_NAME_CHARS)),
            student_id: Some("9".repeat(MAX_STUDENT_ID_CHARS)),
            email: Some("e".repeat(MAX_EMAIL_CHARS)),
            ..sample_form()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn keeps_out_of_range_values() {
        assert_eq!(parse_number("attendance", Some("150")), Ok(150.0));
        assert_eq!(parse_number("attendance", Some("-5")), Ok(-5.0));
    }
}
