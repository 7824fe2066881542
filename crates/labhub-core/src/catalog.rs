//! Compendium catalog records.

use serde::{Deserialize, Serialize};

/// Name of the singleton parent group every imported test hangs under.
pub const DATASET_GROUP_NAME: &str = "Quest Clinical Dataset";

/// An orderable test, keyed uniquely by procedure code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureType {
    pub procedure_code: String,
    pub name: String,
    pub specimen: String,
    pub notes: String,
    pub parent_group_id: i64,
    pub active: bool,
}

/// Input type of an Ask-at-Order-Entry question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldType {
    #[default]
    Text,
    Select,
    Number,
    Date,
}

impl FieldType {
    /// Maps a compendium field type code. Question (`Q`) and unknown codes fall back to text.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "S" => Self::Select,
            "N" => Self::Number,
            "D" => Self::Date,
            _ => Self::Text,
        }
    }

    /// Single-letter code stored in the `fldtype` column.
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Text => "T",
            Self::Select => "S",
            Self::Number => "N",
            Self::Date => "D",
        }
    }
}

/// An AOE question attached to a procedure code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureQuestion {
    pub lab_id: i64,
    pub procedure_code: String,
    pub question_code: String,
    pub text: String,
    pub tips: String,
    pub field_type: FieldType,
    pub active: bool,
}
