//! Intake Model
//!
//! The health-intake form, its enumerated fields, and the `Diagnosis`
//! payload returned by the analysis service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GateError;

pub const FALLBACK_DIAGNOSIS: &str = "Unable to process request";
pub const FALLBACK_RECOMMENDATION: &str = "Please try again later or consult a healthcare professional";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeGroup {
    Child,
    Teen,
    Adult,
    Senior,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 4] = [AgeGroup::Child, AgeGroup::Teen, AgeGroup::Adult, AgeGroup::Senior];

    /// Value sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "Child",
            AgeGroup::Teen => "Teen",
            AgeGroup::Adult => "Adult",
            AgeGroup::Senior => "Senior",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Child => "Child (0-12)",
            AgeGroup::Teen => "Teen (13-19)",
            AgeGroup::Adult => "Adult (20-64)",
            AgeGroup::Senior => "Senior (65+)",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AgeGroup::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GateError::InvalidInput(format!(
                "Unknown age group '{}'. Expected one of: Child, Teen, Adult, Senior",
                wanted
            )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GateError::InvalidInput(format!(
                "Unknown gender '{}'. Expected one of: Male, Female, Other",
                wanted
            )))
    }
}

/// A single form edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Symptoms(String),
    AgeGroup(Option<AgeGroup>),
    Gender(Option<Gender>),
}

/// User-edited intake. Fields are optional until selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeForm {
    pub symptoms: String,
    pub age_group: Option<AgeGroup>,
    pub gender: Option<Gender>,
}

impl IntakeForm {
    pub fn apply(&mut self, field: FormField) {
        match field {
            FormField::Symptoms(text) => self.symptoms = text,
            FormField::AgeGroup(group) => self.age_group = group,
            FormField::Gender(gender) => self.gender = gender,
        }
    }

    /// Names of the fields that still need a value, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.symptoms.trim().is_empty() {
            missing.push("symptoms");
        }
        if self.age_group.is_none() {
            missing.push("age_group");
        }
        if self.gender.is_none() {
            missing.push("gender");
        }
        missing
    }

    /// Build the wire payload, failing with `InvalidInput` if anything is missing.
    pub fn to_request(&self) -> Result<SymptomRequest, GateError> {
        match (self.age_group, self.gender) {
            (Some(age_group), Some(gender)) if !self.symptoms.trim().is_empty() => Ok(SymptomRequest {
                symptoms: self.symptoms.clone(),
                age_group,
                gender,
            }),
            _ => Err(GateError::InvalidInput(format!(
                "Please fill in all fields (missing: {})",
                self.missing_fields().join(", ")
            ))),
        }
    }
}

/// Body of `POST /check-symptoms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRequest {
    pub symptoms: String,
    pub age_group: AgeGroup,
    pub gender: Gender,
}

/// Structured analysis result. Order of both lists is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub diagnoses: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Diagnosis {
    pub fn new(diagnoses: Vec<String>, recommendations: Vec<String>) -> Self {
        Self {
            diagnoses,
            recommendations,
            source: None,
        }
    }

    /// Substitute shown when the analysis service fails for any reason
    /// other than authorization.
    pub fn fallback() -> Self {
        Self::new(
            vec![FALLBACK_DIAGNOSIS.to_string()],
            vec![FALLBACK_RECOMMENDATION.to_string()],
        )
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}
