//! Classes, modules and the academic profile of a school.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::UnknownVariant;
use crate::ids::{ClassId, ModuleId, SchoolId, TeacherId};

/// Maximum number of A-Level combinations or TVET specializations per school.
pub const MAX_TRACKS: usize = 6;

/// Education tier of a class or module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum EducationLever {
    Primary,
    OLevel,
    ALevel,
    #[serde(rename = "TVET")]
    Tvet,
}

impl EducationLever {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "Primary",
            Self::OLevel => "OLevel",
            Self::ALevel => "ALevel",
            Self::Tvet => "TVET",
        }
    }
}

impl fmt::Display for EducationLever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EducationLever {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Primary" => Ok(Self::Primary),
            "OLevel" => Ok(Self::OLevel),
            "ALevel" => Ok(Self::ALevel),
            "TVET" => Ok(Self::Tvet),
            other => Err(UnknownVariant::new("education lever", other)),
        }
    }
}

impl TryFrom<String> for EducationLever {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ModuleType {
    General,
    Optional,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Optional => "Optional",
        }
    }
}

impl FromStr for ModuleType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "General" => Ok(Self::General),
            "Optional" => Ok(Self::Optional),
            other => Err(UnknownVariant::new("module type", other)),
        }
    }
}

impl TryFrom<String> for ModuleType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub name: String,
    pub code: String,
    pub username: String,
    #[sqlx(try_from = "String")]
    pub education_lever: EducationLever,
    pub curriculum: String,
    pub academic_year: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub const CLASS_COLUMNS: &str =
    "id, school_id, name, code, username, education_lever, curriculum, academic_year, created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Module {
    pub id: ModuleId,
    pub school_id: SchoolId,
    pub class_id: Option<ClassId>,
    pub teacher_id: Option<TeacherId>,
    pub name: String,
    pub code: String,
    #[sqlx(try_from = "String")]
    pub module_type: ModuleType,
    #[sqlx(try_from = "String")]
    pub education_lever: EducationLever,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub const MODULE_COLUMNS: &str =
    "id, school_id, class_id, teacher_id, name, code, module_type, education_lever, created_at";

/// Curriculum declared for a school, stored on the school row as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AcademicProfile {
    pub primary_subjects_offered: Vec<String>,
    pub o_level_core_subjects: Vec<String>,
    pub o_level_optional_subjects: Vec<String>,
    pub a_level_subject_combination: Vec<String>,
    pub a_level_optional_subjects: Vec<String>,
    pub tvet_specialization: Vec<String>,
    pub tvet_optional_subjects: Vec<String>,
    pub primary_pass_mark: Option<f64>,
    pub o_level_pass_mark: Option<f64>,
    pub a_level_pass_mark: Option<f64>,
    pub tvet_pass_mark: Option<f64>,
}

fn validate_subject_names(names: &[String]) -> Result<(), ValidationError> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(ValidationError::new("blank_subject")
            .with_message("subject names must not be blank".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetupAcademicStructureDto {
    pub school_id: SchoolId,
    #[serde(default)]
    #[validate(custom(function = "validate_subject_names"))]
    pub primary_subjects_offered: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_subject_names"))]
    pub o_level_core_subjects: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_subject_names"))]
    pub o_level_optional_subjects: Vec<String>,
    #[serde(default)]
    #[validate(
        length(max = 6, message = "at most 6 A-Level subject combinations are allowed"),
        custom(function = "validate_subject_names")
    )]
    pub a_level_subject_combination: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_subject_names"))]
    pub a_level_optional_subjects: Vec<String>,
    #[serde(default)]
    #[validate(
        length(max = 6, message = "at most 6 TVET specializations are allowed"),
        custom(function = "validate_subject_names")
    )]
    pub tvet_specialization: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_subject_names"))]
    pub tvet_optional_subjects: Vec<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "pass marks are percentages"))]
    pub primary_pass_mark: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "pass marks are percentages"))]
    pub o_level_pass_mark: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "pass marks are percentages"))]
    pub a_level_pass_mark: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "pass marks are percentages"))]
    pub tvet_pass_mark: Option<f64>,
}

fn trimmed(names: &[String]) -> Vec<String> {
    names.iter().map(|n| n.trim().to_string()).collect()
}

impl From<&SetupAcademicStructureDto> for AcademicProfile {
    fn from(dto: &SetupAcademicStructureDto) -> Self {
        Self {
            primary_subjects_offered: trimmed(&dto.primary_subjects_offered),
            o_level_core_subjects: trimmed(&dto.o_level_core_subjects),
            o_level_optional_subjects: trimmed(&dto.o_level_optional_subjects),
            a_level_subject_combination: trimmed(&dto.a_level_subject_combination),
            a_level_optional_subjects: trimmed(&dto.a_level_optional_subjects),
            tvet_specialization: trimmed(&dto.tvet_specialization),
            tvet_optional_subjects: trimmed(&dto.tvet_optional_subjects),
            primary_pass_mark: dto.primary_pass_mark,
            o_level_pass_mark: dto.o_level_pass_mark,
            a_level_pass_mark: dto.a_level_pass_mark,
            tvet_pass_mark: dto.tvet_pass_mark,
        }
    }
}

/// Counts produced by one run of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AcademicStructureResult {
    pub total_classes: i32,
    pub total_modules: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> SetupAcademicStructureDto {
        serde_json::from_value(serde_json::json!({
            "school_id": "00000000-0000-0000-0000-000000000001",
            "primary_subjects_offered": [" Math ", "English"]
        }))
        .unwrap()
    }

    #[test]
    fn test_omitted_lists_default_to_empty() {
        let dto = dto();
        assert!(dto.validate().is_ok());
        assert!(dto.tvet_specialization.is_empty());
        let profile = AcademicProfile::from(&dto);
        assert_eq!(profile.primary_subjects_offered, vec!["Math", "English"]);
        assert!(profile.o_level_core_subjects.is_empty());
    }

    #[test]
    fn test_too_many_combinations_rejected() {
        let mut dto = dto();
        dto.a_level_subject_combination = (0..7).map(|i| format!("C{}", i)).collect();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("a_level_subject_combination"));
    }

    #[test]
    fn test_blank_subject_rejected() {
        let mut dto = dto();
        dto.o_level_core_subjects = vec!["Physics".to_string(), "  ".to_string()];
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_education_lever_strings() {
        assert_eq!(EducationLever::Tvet.as_str(), "TVET");
        assert_eq!(
            "OLevel".parse::<EducationLever>().unwrap(),
            EducationLever::OLevel
        );
        assert_eq!(
            serde_json::to_value(EducationLever::Tvet).unwrap(),
            serde_json::json!("TVET")
        );
    }

    #[test]
    fn test_profile_reads_partial_json() {
        let profile: AcademicProfile =
            serde_json::from_value(serde_json::json!({"o_level_pass_mark": 50.0})).unwrap();
        assert_eq!(profile.o_level_pass_mark, Some(50.0));
        assert!(profile.primary_subjects_offered.is_empty());
    }
}
