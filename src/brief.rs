//! Campaign brief collected from the user

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub target_group: String,
    pub purpose: String,
    #[serde(default)]
    pub is_ready_for_action: bool,
    pub value: String,
    pub draft: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BriefField {
    TargetGroup,
    Purpose,
    IsReadyForAction,
    Value,
    Draft,
}

impl BriefField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BriefField::TargetGroup => "targetGroup",
            BriefField::Purpose => "purpose",
            BriefField::IsReadyForAction => "isReadyForAction",
            BriefField::Value => "value",
            BriefField::Draft => "draft",
        }
    }
}

/// New value for a single form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BriefError {
    #[error("missing required field: {}", .0.as_str())]
    MissingField(BriefField),
    #[error("field {} expects {expected}", .field.as_str())]
    WrongValueType {
        field: BriefField,
        expected: &'static str,
    },
}

impl Brief {
    /// Every text field must hold something other than whitespace
    pub fn validate(&self) -> Result<(), BriefError> {
        let required = [
            (BriefField::TargetGroup, &self.target_group),
            (BriefField::Purpose, &self.purpose),
            (BriefField::Value, &self.value),
            (BriefField::Draft, &self.draft),
        ];
        match required.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((field, _)) => Err(BriefError::MissingField(*field)),
            None => Ok(()),
        }
    }

    /// Apply a form edit. The checkbox also accepts "true"/"false" text.
    pub fn set_field(&mut self, field: BriefField, value: FieldValue) -> Result<(), BriefError> {
        match (field, value) {
            (BriefField::IsReadyForAction, FieldValue::Flag(b)) => self.is_ready_for_action = b,
            (BriefField::IsReadyForAction, FieldValue::Text(s)) => {
                self.is_ready_for_action = match s.trim() {
                    "true" => true,
                    "false" => false,
                    _ => {
                        return Err(BriefError::WrongValueType {
                            field,
                            expected: "a boolean",
                        });
                    }
                }
            }
            (_, FieldValue::Flag(_)) => {
                return Err(BriefError::WrongValueType {
                    field,
                    expected: "a string",
                });
            }
            (BriefField::TargetGroup, FieldValue::Text(s)) => self.target_group = s,
            (BriefField::Purpose, FieldValue::Text(s)) => self.purpose = s,
            (BriefField::Value, FieldValue::Text(s)) => self.value = s,
            (BriefField::Draft, FieldValue::Text(s)) => self.draft = s,
        }
        Ok(())
    }
}
