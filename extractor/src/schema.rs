//! Immutable schema descriptors and the validator that checks decoded
//! candidates against them.
//!
//! A [`Schema`] is a closed set of named fields, each with a primitive or enum
//! type and optional constraints. Schemas are built once through
//! [`SchemaBuilder`], which rejects malformed descriptors up front, and can be
//! rendered to JSON Schema for response-format directives and tool parameters.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt::Write;
use thiserror::Error;

/// Errors raised while building a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema name is empty or contains characters unusable as a tool name.
    #[error("invalid schema name `{0}`: use 1-64 ASCII letters, digits, '_' or '-'")]
    InvalidName(String),

    /// The schema declares no fields.
    #[error("schema `{0}` declares no fields")]
    NoFields(String),

    /// A field has an empty name.
    #[error("field names must not be empty")]
    EmptyFieldName,

    /// Two fields share a name.
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),

    /// An enum field has no variants.
    #[error("enum field `{0}` has no variants")]
    EmptyEnum(String),

    /// An enum field repeats a variant.
    #[error("enum field `{field}` repeats variant `{variant}`")]
    DuplicateVariant {
        /// Offending field.
        field: String,
        /// Repeated variant.
        variant: String,
    },

    /// A numeric range is inverted or not finite.
    #[error("field `{0}` has an invalid range")]
    InvalidRange(String),
}

/// Type and constraint of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// UTF-8 text, optionally with a minimum length in characters.
    String {
        /// Minimum number of characters.
        min_length: Option<usize>,
    },
    /// Whole number with optional inclusive bounds.
    Integer {
        /// Inclusive lower bound.
        min: Option<i64>,
        /// Inclusive upper bound.
        max: Option<i64>,
    },
    /// Floating point number with optional inclusive bounds.
    Number {
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
    },
    /// `true` or `false`.
    Boolean,
    /// A string drawn from a closed set, matched exactly.
    Enum {
        /// Allowed values.
        variants: Vec<String>,
    },
}

impl FieldType {
    const fn json_type(&self) -> &'static str {
        match self {
            Self::String { .. } | Self::Enum { .. } => "string",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// A named field of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    description: Option<String>,
    kind: FieldType,
    required: bool,
}

impl Field {
    /// Creates a required field of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            required: true,
        }
    }

    /// Required string field without length constraint.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String { min_length: None })
    }

    /// Required integer field without bounds.
    #[must_use]
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer { min: None, max: None })
    }

    /// Required integer field constrained to `[min, max]`.
    #[must_use]
    pub fn integer_range(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(
            name,
            FieldType::Integer {
                min: Some(min),
                max: Some(max),
            },
        )
    }

    /// Required number field without bounds.
    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number { min: None, max: None })
    }

    /// Required number field constrained to `[min, max]`.
    #[must_use]
    pub fn number_range(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(
            name,
            FieldType::Number {
                min: Some(min),
                max: Some(max),
            },
        )
    }

    /// Required boolean field.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Required enum field with the given variants.
    #[must_use]
    pub fn enumeration<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldType::Enum {
                variants: variants.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Attaches a description shown to the model.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the field optional: it may be absent or `null`.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Field name, matched exactly during validation.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Field type and constraint.
    #[must_use]
    pub const fn kind(&self) -> &FieldType {
        &self.kind
    }

    /// Whether the field must be present.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    fn check_descriptor(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyFieldName);
        }
        match &self.kind {
            FieldType::Enum { variants } => {
                if variants.is_empty() {
                    return Err(SchemaError::EmptyEnum(self.name.clone()));
                }
                let mut seen = HashSet::new();
                for variant in variants {
                    if !seen.insert(variant.as_str()) {
                        return Err(SchemaError::DuplicateVariant {
                            field: self.name.clone(),
                            variant: variant.clone(),
                        });
                    }
                }
            }
            FieldType::Integer {
                min: Some(min),
                max: Some(max),
            } if min > max => return Err(SchemaError::InvalidRange(self.name.clone())),
            FieldType::Number { min, max } => {
                let finite = min.is_none_or(f64::is_finite) && max.is_none_or(f64::is_finite);
                let ordered = match (min, max) {
                    (Some(min), Some(max)) => min <= max,
                    _ => true,
                };
                if !finite || !ordered {
                    return Err(SchemaError::InvalidRange(self.name.clone()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Checks one present, non-null value, returning its normalized form.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::float_cmp
    )]
    fn check_value(&self, value: &Value) -> Result<Value, ViolationReason> {
        let wrong_type = || ViolationReason::WrongType {
            expected: self.kind.json_type(),
            found: json_type_name(value),
        };

        match &self.kind {
            FieldType::String { min_length } => {
                let text = value.as_str().ok_or_else(wrong_type)?;
                if self.required && text.trim().is_empty() {
                    return Err(ViolationReason::Empty);
                }
                let length = text.chars().count();
                if let Some(min) = *min_length {
                    if length < min {
                        return Err(ViolationReason::TooShort { min, length });
                    }
                }
                Ok(value.clone())
            }
            FieldType::Integer { min, max } => {
                let number = value.as_i64().or_else(|| {
                    value
                        .as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                        .map(|f| f as i64)
                });
                let number = number.ok_or_else(wrong_type)?;
                if min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max) {
                    return Err(ViolationReason::OutOfRange {
                        value: number as f64,
                        min: min.map(|m| m as f64),
                        max: max.map(|m| m as f64),
                    });
                }
                Ok(Value::from(number))
            }
            FieldType::Number { min, max } => {
                let number = value.as_f64().ok_or_else(wrong_type)?;
                if min.is_some_and(|min| number < min) || max.is_some_and(|max| number > max) {
                    return Err(ViolationReason::OutOfRange {
                        value: number,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(value.clone())
            }
            FieldType::Boolean => {
                if value.is_boolean() {
                    Ok(value.clone())
                } else {
                    Err(wrong_type())
                }
            }
            FieldType::Enum { variants } => {
                let text = value.as_str().ok_or_else(wrong_type)?;
                if variants.iter().any(|variant| variant == text) {
                    Ok(value.clone())
                } else {
                    Err(ViolationReason::NotInEnum {
                        value: text.to_string(),
                        allowed: variants.clone(),
                    })
                }
            }
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut property = Map::new();
        if self.required {
            property.insert("type".into(), json!(self.kind.json_type()));
        } else {
            property.insert("type".into(), json!([self.kind.json_type(), "null"]));
        }
        if let Some(description) = &self.description {
            property.insert("description".into(), json!(description));
        }
        match &self.kind {
            FieldType::String { min_length } => {
                if let Some(min) = min_length {
                    property.insert("minLength".into(), json!(min));
                }
                if self.required {
                    property.insert("pattern".into(), json!("\\S"));
                }
            }
            FieldType::Integer { min, max } => {
                if let Some(min) = min {
                    property.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    property.insert("maximum".into(), json!(max));
                }
            }
            FieldType::Number { min, max } => {
                if let Some(min) = min {
                    property.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    property.insert("maximum".into(), json!(max));
                }
            }
            FieldType::Boolean => {}
            FieldType::Enum { variants } => {
                let mut allowed: Vec<Value> = variants.iter().map(|v| json!(v)).collect();
                if !self.required {
                    allowed.push(Value::Null);
                }
                property.insert("enum".into(), Value::Array(allowed));
            }
        }
        Value::Object(property)
    }

    #[allow(clippy::cast_precision_loss)]
    fn describe_rule(&self) -> String {
        let mut rule = match &self.kind {
            FieldType::String { min_length: Some(min) } => format!("string, at least {min} characters"),
            FieldType::String { min_length: None } => "string".to_string(),
            FieldType::Integer { min, max } => format!("integer{}", describe_bounds(
                min.map(|m| m as f64),
                max.map(|m| m as f64),
            )),
            FieldType::Number { min, max } => format!("number{}", describe_bounds(*min, *max)),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Enum { variants } => format!("one of: {}", variants.join(", ")),
        };
        rule.push_str(if self.required { ", required" } else { ", optional" });
        rule
    }
}

/// Why a field failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViolationReason {
    /// Required field absent or `null`.
    #[error("required field is missing")]
    Missing,

    /// Required string field present but blank.
    #[error("required field is empty")]
    Empty,

    /// Value has the wrong JSON type.
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// Expected JSON type.
        expected: &'static str,
        /// Actual JSON type.
        found: &'static str,
    },

    /// Value is not one of the enum variants.
    #[error("\"{value}\" is not one of [{}]", .allowed.join(", "))]
    NotInEnum {
        /// Submitted value.
        value: String,
        /// Allowed variants.
        allowed: Vec<String>,
    },

    /// Numeric value outside its bounds.
    #[error("{value} is outside the allowed range{}", range_suffix(.min, .max))]
    OutOfRange {
        /// Submitted value.
        value: f64,
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
    },

    /// String shorter than its minimum length.
    #[error("expected at least {min} characters, found {length}")]
    TooShort {
        /// Minimum length.
        min: usize,
        /// Submitted length.
        length: usize,
    },

    /// Key not declared by a schema that denies unknown fields.
    #[error("field is not part of the schema")]
    Unknown,

    /// The candidate is not a JSON object.
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// A field check rejected the value.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("`{field}`: {reason}")]
pub struct FieldViolation {
    /// Field name as declared in the schema (or the offending key).
    pub field: String,
    /// What went wrong.
    pub reason: ViolationReason,
}

impl FieldViolation {
    /// Creates a violation for the given field.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

/// A well-formed candidate that violates its schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("schema validation failed: {}", join_violations(.violations))]
pub struct ValidationError {
    /// Every violation found, in schema field order.
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Names of the offending fields, deduplicated, in report order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.violations
            .iter()
            .map(|v| v.field.as_str())
            .filter(|field| seen.insert(*field))
            .collect()
    }

    /// Whether the given field is among the violations.
    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[allow(clippy::ref_option)]
fn range_suffix(min: &Option<f64>, max: &Option<f64>) -> String {
    describe_bounds(*min, *max)
}

fn describe_bounds(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!(" [{min}, {max}]"),
        (Some(min), None) => format!(" >= {min}"),
        (None, Some(max)) => format!(" <= {max}"),
        (None, None) => String::new(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A validated value: every required field present, every value valid.
///
/// Only fields declared by the schema are kept; optional fields that were
/// absent or `null` are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaInstance {
    values: Map<String, Value>,
}

impl SchemaInstance {
    /// Value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// String value of a field (also used for enum fields).
    #[must_use]
    pub fn str(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }

    /// Numeric value of a field.
    #[must_use]
    pub fn f64(&self, field: &str) -> Option<f64> {
        self.values.get(field).and_then(Value::as_f64)
    }

    /// Underlying field map.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Converts the instance into a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    /// Deserializes the instance into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(Value::Object(self.values.clone()))
    }
}

/// An immutable structural contract for model output.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
    deny_unknown_fields: bool,
}

impl Schema {
    /// Starts building a schema with the given name.
    ///
    /// The name doubles as the tool/function name in tool-calling mode.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            deny_unknown_fields: false,
        }
    }

    /// Schema name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by exact name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether keys outside the schema are rejected.
    #[must_use]
    pub const fn denies_unknown_fields(&self) -> bool {
        self.deny_unknown_fields
    }

    /// Validates a decoded candidate.
    ///
    /// Field lookup is by exact name. Every violation is collected, not only
    /// the first one, so feedback can name all offending fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use structured_extractor::schema::{Field, Schema};
    ///
    /// let schema = Schema::builder("reply")
    ///     .field(Field::string("content"))
    ///     .field(Field::enumeration("category", ["general", "order", "billing"]))
    ///     .build()
    ///     .unwrap();
    ///
    /// let err = schema
    ///     .validate(&json!({"content": "ok", "category": "banana"}))
    ///     .unwrap_err();
    /// assert_eq!(err.fields(), vec!["category"]);
    /// ```
    pub fn validate(&self, candidate: &Value) -> Result<SchemaInstance, ValidationError> {
        let Some(object) = candidate.as_object() else {
            return Err(ValidationError {
                violations: vec![FieldViolation::new(
                    "$",
                    ViolationReason::NotAnObject(json_type_name(candidate)),
                )],
            });
        };

        let mut values = Map::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        violations.push(FieldViolation::new(&field.name, ViolationReason::Missing));
                    }
                }
                Some(value) => match field.check_value(value) {
                    Ok(normalized) => {
                        values.insert(field.name.clone(), normalized);
                    }
                    Err(reason) => violations.push(FieldViolation::new(&field.name, reason)),
                },
            }
        }

        if self.deny_unknown_fields {
            for key in object.keys() {
                if self.field(key).is_none() {
                    violations.push(FieldViolation::new(key, ViolationReason::Unknown));
                }
            }
        }

        if violations.is_empty() {
            Ok(SchemaInstance { values })
        } else {
            Err(ValidationError { violations })
        }
    }

    /// Renders the schema as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut schema = json!({
            "type": "object",
            "title": self.name,
            "properties": properties,
            "required": required,
        });
        if let Some(description) = &self.description {
            schema["description"] = json!(description);
        }
        if self.deny_unknown_fields {
            schema["additionalProperties"] = json!(false);
        }
        schema
    }

    /// Instruction text asking the model to answer with a conforming JSON object.
    #[must_use]
    pub fn instruction(&self) -> String {
        let mut text = String::from(
            "Always respond with a single JSON object and nothing else: no prose, no code fences.\n",
        );
        let _ = writeln!(text, "The object has these fields:");
        for field in &self.fields {
            let _ = write!(text, "- \"{}\" ({})", field.name, field.describe_rule());
            if let Some(description) = &field.description {
                let _ = write!(text, ": {description}");
            }
            text.push('\n');
        }
        let schema = serde_json::to_string_pretty(&self.to_json_schema())
            .unwrap_or_else(|_| self.to_json_schema().to_string());
        let _ = write!(text, "JSON schema:\n{schema}");
        text
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
    deny_unknown_fields: bool,
}

impl SchemaBuilder {
    /// Sets the schema description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Rejects keys the schema does not declare.
    #[must_use]
    pub const fn deny_unknown_fields(mut self) -> Self {
        self.deny_unknown_fields = true;
        self
    }

    /// Checks the descriptor and freezes it.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let valid_name = !self.name.is_empty()
            && self.name.len() <= 64
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            return Err(SchemaError::InvalidName(self.name));
        }
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields(self.name));
        }

        let mut names = HashSet::new();
        for field in &self.fields {
            field.check_descriptor()?;
            if !names.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        Ok(Schema {
            name: self.name,
            description: self.description,
            fields: self.fields,
            deny_unknown_fields: self.deny_unknown_fields,
        })
    }
}
