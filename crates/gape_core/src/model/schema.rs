//! Editable field declarations and payload validation per block family.
//!
//! # Responsibility
//! - Describe which fields an editing form offers for each block family.
//! - Validate a replacement payload before it is handed to the layout.
//!
//! # Invariants
//! - Validation never mutates the payload.
//! - Fields not declared by the schema are accepted untouched.
//! - Empty optional fields skip format checks.

use crate::model::block::{BlockData, BlockFamily, BlockType, FieldValue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("valid url regex"));

/// Input widget hint for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Url,
    Textarea,
}

/// Content format enforced on non-empty values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
    Url,
}

/// Declaration of one editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Minimum character count, checked when the value is present.
    pub min_len: Option<usize>,
    pub format: Option<FieldFormat>,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required: false,
        min_len: None,
        format: None,
    }
}

const fn required(spec: FieldSpec) -> FieldSpec {
    FieldSpec {
        required: true,
        ..spec
    }
}

const fn formatted(spec: FieldSpec, format: FieldFormat) -> FieldSpec {
    FieldSpec {
        format: Some(format),
        ..spec
    }
}

const PROFILE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        min_len: Some(2),
        ..required(field("name", "Name", FieldKind::Text))
    },
    required(field("title", "Title", FieldKind::Text)),
    field("description", "Description", FieldKind::Textarea),
    field("phone", "Phone", FieldKind::Text),
    required(formatted(
        field("email", "Email", FieldKind::Email),
        FieldFormat::Email,
    )),
    field("location", "Location", FieldKind::Text),
    required(formatted(
        field("imageUrl", "Profile Image URL", FieldKind::Url),
        FieldFormat::Url,
    )),
    formatted(field("github", "GitHub URL", FieldKind::Url), FieldFormat::Url),
    formatted(
        field("linkedin", "LinkedIn URL", FieldKind::Url),
        FieldFormat::Url,
    ),
    formatted(field("x", "X/Twitter URL", FieldKind::Url), FieldFormat::Url),
    formatted(field("url", "Website URL", FieldKind::Url), FieldFormat::Url),
];

const PROJECT_FIELDS: &[FieldSpec] = &[
    required(field("project", "Project Name", FieldKind::Text)),
    field("company", "Company", FieldKind::Text),
    field("role", "Role", FieldKind::Text),
    field("dateRange", "Date Range", FieldKind::Text),
    formatted(
        field("Heyperlink", "Project URL", FieldKind::Url),
        FieldFormat::Url,
    ),
    field("location", "Location", FieldKind::Text),
    field("description", "Description", FieldKind::Textarea),
    formatted(
        field("image", "Project Image URL", FieldKind::Url),
        FieldFormat::Url,
    ),
];

const EDUCATION_FIELDS: &[FieldSpec] = &[
    required(field("institution", "Institution", FieldKind::Text)),
    field("location", "Location", FieldKind::Text),
    required(field("degree", "Degree", FieldKind::Text)),
    required(field("field", "Field of Study", FieldKind::Text)),
    field("gpa", "GPA", FieldKind::Text),
    field("minor", "Minor", FieldKind::Text),
    field("dateRange", "Date Range", FieldKind::Text),
    field("description", "Description", FieldKind::Textarea),
    field("logoUrl", "Institution Logo URL", FieldKind::Url),
];

const PUBLICATION_FIELDS: &[FieldSpec] = &[
    required(field("title", "Publication Title", FieldKind::Text)),
    required(field("authors", "Authors", FieldKind::Text)),
    field("year", "Year", FieldKind::Text),
    field("type", "Publication Type", FieldKind::Text),
    field("description", "Description", FieldKind::Textarea),
    field("journal", "Journal/Conference", FieldKind::Text),
];

const EXPERIENCE_FIELDS: &[FieldSpec] = &[
    required(field("company", "Company", FieldKind::Text)),
    required(field("title", "Title", FieldKind::Text)),
    field("location", "Location", FieldKind::Text),
    field("dateRange", "Date Range", FieldKind::Text),
    field("description", "Description", FieldKind::Textarea),
    field("logoUrl", "Company Logo URL", FieldKind::Url),
    field("type", "Employment Type", FieldKind::Text),
];

/// Returns the editable fields for a block type.
///
/// Both size classes of a family share one declaration.
pub fn fields_for(block_type: BlockType) -> &'static [FieldSpec] {
    match block_type.family() {
        BlockFamily::Profile => PROFILE_FIELDS,
        BlockFamily::Project => PROJECT_FIELDS,
        BlockFamily::Education => EDUCATION_FIELDS,
        BlockFamily::Publication => PUBLICATION_FIELDS,
        BlockFamily::Experience => EXPERIENCE_FIELDS,
    }
}

/// Field-level payload validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockValidationError {
    MissingField(&'static str),
    TooShort { field: &'static str, min: usize },
    InvalidEmail(&'static str),
    InvalidUrl(&'static str),
    /// A declared text field holds a list.
    ExpectedText(&'static str),
}

impl Display for BlockValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
            Self::TooShort { field, min } => {
                write!(f, "field `{field}` must have at least {min} characters")
            }
            Self::InvalidEmail(field) => write!(f, "field `{field}` is not a valid email address"),
            Self::InvalidUrl(field) => write!(f, "field `{field}` is not a valid URL"),
            Self::ExpectedText(field) => write!(f, "field `{field}` must be text"),
        }
    }
}

impl Error for BlockValidationError {}

/// Validates a payload against the declared fields of `block_type`.
///
/// Returns the first failure in declaration order.
pub fn validate_block_data(
    block_type: BlockType,
    data: &BlockData,
) -> Result<(), BlockValidationError> {
    for spec in fields_for(block_type) {
        let value = match data.get(spec.name) {
            None => None,
            Some(FieldValue::Text(value)) => Some(value.trim()),
            Some(FieldValue::List(_)) => return Err(BlockValidationError::ExpectedText(spec.name)),
        };
        let value = value.filter(|value| !value.is_empty());

        let Some(value) = value else {
            if spec.required {
                return Err(BlockValidationError::MissingField(spec.name));
            }
            continue;
        };

        if let Some(min) = spec.min_len {
            if value.chars().count() < min {
                return Err(BlockValidationError::TooShort {
                    field: spec.name,
                    min,
                });
            }
        }

        match spec.format {
            Some(FieldFormat::Email) if !EMAIL_RE.is_match(value) => {
                return Err(BlockValidationError::InvalidEmail(spec.name));
            }
            Some(FieldFormat::Url) if !URL_RE.is_match(value) => {
                return Err(BlockValidationError::InvalidUrl(spec.name));
            }
            _ => {}
        }
    }
    Ok(())
}
