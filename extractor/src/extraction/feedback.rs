//! Feedback builders for guided retries.
//!
//! After a failed attempt the extractor appends the model's own output as an
//! assistant turn, followed by a user turn built here that explains what was
//! wrong and asks for a corrected answer.

use serde_json::Value;

use super::error::ExtractionError;
use crate::decode::DecodeError;
use crate::message::Message;
use crate::response::RawResponse;
use crate::schema::{FieldViolation, Schema};

const RAW_PREVIEW_CHARS: usize = 500;

/// Build validation feedback with the attempt counter, every violation, the
/// expected schema (optional) and the echoed submission.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use structured_extractor::extraction::build_validation_feedback;
/// use structured_extractor::schema::{FieldViolation, ViolationReason};
///
/// let violations = vec![FieldViolation::new("category", ViolationReason::Missing)];
/// let feedback = build_validation_feedback(&violations, &json!({}), None, 1, 3);
/// assert!(feedback.contains("Attempt 1/3"));
/// assert!(feedback.contains("`category`: required field is missing"));
/// ```
#[must_use]
pub fn build_validation_feedback(
    violations: &[FieldViolation],
    submission: &Value,
    schema: Option<&Value>,
    attempt: usize,
    max_attempts: usize,
) -> String {
    let mut feedback =
        format!("Attempt {attempt}/{max_attempts}: your answer did not match the required schema.\n\n");

    feedback.push_str("Errors:\n");
    for violation in violations {
        feedback.push_str("  - ");
        feedback.push_str(&violation.to_string());
        feedback.push('\n');
    }

    if let Some(schema) = schema {
        feedback.push_str("\nExpected schema:\n");
        feedback.push_str(&pretty(schema));
    }

    feedback.push_str("\n\nYour submission:\n");
    feedback.push_str(&pretty(submission));

    feedback.push_str(
        "\n\nUse exactly the field names and allowed values above. Fix all errors and answer again.",
    );

    feedback
}

/// Build feedback for output that could not be decoded as a JSON object.
///
/// # Examples
///
/// ```
/// use structured_extractor::extraction::build_parse_error_feedback;
///
/// let feedback = build_parse_error_feedback("not json", "expected value", None, 2, 3);
/// assert!(feedback.contains("Attempt 2/3"));
/// assert!(feedback.contains("Could not parse"));
/// ```
#[must_use]
pub fn build_parse_error_feedback(
    raw_text: &str,
    parse_error: &str,
    schema: Option<&Value>,
    attempt: usize,
    max_attempts: usize,
) -> String {
    let mut feedback =
        format!("Attempt {attempt}/{max_attempts}: Could not parse your response as a JSON object.\n\n");

    feedback.push_str("Parse error: ");
    feedback.push_str(parse_error);
    feedback.push_str("\n\n");

    feedback.push_str("Your response (first 500 chars):\n");
    feedback.push_str(&truncate(raw_text, RAW_PREVIEW_CHARS));

    if let Some(schema) = schema {
        feedback.push_str("\n\nExpected schema:\n");
        feedback.push_str(&pretty(schema));
    }

    feedback.push_str("\n\nRespond with a single valid JSON object and nothing else.");

    feedback
}

/// The two messages appended to the conversation after a failed attempt:
/// the model's own output, then the correction request.
#[must_use]
pub fn feedback_turn(
    raw: &RawResponse,
    error: &ExtractionError,
    schema: &Schema,
    include_schema: bool,
    attempt: usize,
    max_attempts: usize,
) -> [Message; 2] {
    let json_schema = include_schema.then(|| schema.to_json_schema());
    let correction = match error {
        ExtractionError::Validation(validation) => {
            let submission = serde_json::from_str(raw.payload())
                .unwrap_or_else(|_| Value::String(raw.payload().to_string()));
            build_validation_feedback(
                &validation.violations,
                &submission,
                json_schema.as_ref(),
                attempt,
                max_attempts,
            )
        }
        ExtractionError::Decode(DecodeError { message, raw: text }) => build_parse_error_feedback(
            text,
            message,
            json_schema.as_ref(),
            attempt,
            max_attempts,
        ),
        other => format!("Attempt {attempt}/{max_attempts} failed: {other}. Please answer again."),
    };

    [
        Message::assistant(raw.as_assistant_content()),
        Message::user(correction),
    ]
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::schema::{Field, ValidationError, ViolationReason};
    use serde_json::json;

    fn reply_schema() -> Schema {
        Schema::builder("reply")
            .field(Field::string("content"))
            .field(Field::enumeration("category", ["general", "order", "billing"]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_validation_feedback() {
        let schema = json!({"type": "object"});
        let violations = vec![FieldViolation::new(
            "category",
            ViolationReason::NotInEnum {
                value: "banana".into(),
                allowed: vec!["general".into(), "order".into()],
            },
        )];

        let feedback =
            build_validation_feedback(&violations, &json!({"category": "banana"}), Some(&schema), 1, 3);

        assert!(feedback.contains("Attempt 1/3"));
        assert!(feedback.contains("Errors:"));
        assert!(feedback.contains("\"banana\" is not one of [general, order]"));
        assert!(feedback.contains("Expected schema:"));
        assert!(feedback.contains("Your submission:"));
        assert!(feedback.contains("Fix all errors"));
    }

    #[test]
    fn test_schema_omitted_when_not_requested() {
        let feedback = build_validation_feedback(&[], &json!({}), None, 1, 2);
        assert!(!feedback.contains("Expected schema:"));
    }

    #[test]
    fn test_build_parse_error_feedback() {
        let schema = json!({"type": "object"});
        let feedback =
            build_parse_error_feedback("This is not JSON!", "expected value", Some(&schema), 2, 3);

        assert!(feedback.contains("Attempt 2/3"));
        assert!(feedback.contains("Could not parse"));
        assert!(feedback.contains("Parse error: expected value"));
        assert!(feedback.contains("This is not JSON!"));
        assert!(feedback.contains("Expected schema:"));
    }

    #[test]
    fn test_parse_error_feedback_truncates_long_text() {
        let raw_text = "é".repeat(1000);
        let feedback = build_parse_error_feedback(&raw_text, "error", None, 1, 3);

        let response_section = feedback.split("Your response").nth(1).unwrap();
        assert!(response_section.contains("..."));
        assert!(response_section.chars().count() < 600);
    }

    #[test]
    fn test_feedback_turn_echoes_output_then_corrects() {
        let raw = RawResponse::text(r#"{"content": "ok", "category": "banana"}"#);
        let error = ExtractionError::Validation(ValidationError {
            violations: vec![FieldViolation::new("category", ViolationReason::Missing)],
        });

        let [echo, correction] = feedback_turn(&raw, &error, &reply_schema(), true, 1, 2);

        assert_eq!(echo.role, Role::Assistant);
        assert_eq!(echo.content, raw.payload());
        assert_eq!(correction.role, Role::User);
        assert!(correction.content.contains("Attempt 1/2"));
        assert!(correction.content.contains("\"enum\""));
    }
}
