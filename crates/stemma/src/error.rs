use crate::model::{Relationship, RelationshipType};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

/// Input-graph violations. All of them block layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ValidationError {
    #[error("{relationship_type} relationship of `{person_id}` with themself")]
    SelfReference {
        person_id: String,
        relationship_type: RelationshipType,
    },

    #[error("duplicate {relationship_type} relationship from `{from}` to `{to}`")]
    DuplicateRelationship {
        from: String,
        to: String,
        relationship_type: RelationshipType,
    },

    #[error("parent relationship `{parent}` -> `{child}` closes an ancestry cycle")]
    CycleDetected { parent: String, child: String },

    #[error("`{child}` has more than two recorded parents: {}", .parents.join(", "))]
    TooManyParents { child: String, parents: Vec<String> },
}

/// Failures of the layout computation itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LayoutError {
    #[error(
        "generation depths did not settle after {iterations} passes (involving {})",
        .people.join(", ")
    )]
    UnresolvedCycle {
        iterations: usize,
        people: Vec<String>,
    },

    #[error("invalid layout config: `{field}` must be a positive number, got {value}")]
    InvalidConfig { field: &'static str, value: f64 },

    #[error("malformed layout config: {message}")]
    MalformedConfig { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("relationship validation failed: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl Error {
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(errors) => errors,
            Self::Layout(_) => &[],
        }
    }
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Self::Validation(vec![value])
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

/// Non-blocking findings returned next to a successful layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Warning {
    /// Parent/child birth years are less than 10 or more than 80 years apart.
    ImplausibleAgeGap {
        parent: String,
        child: String,
        gap_years: i32,
    },
    /// A relationship naming a person that is not part of the input was ignored.
    DroppedRelationship {
        relationship: Relationship,
        missing_person_id: String,
    },
    /// A second person record with an already-seen id was ignored.
    DuplicatePerson { person_id: String },
}
