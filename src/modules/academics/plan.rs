//! Expands an [`AcademicProfile`] into the classes and modules to create.
//!
//! A tier with nothing declared produces no classes. Every module belongs to
//! exactly one class, so a subject offered to six primary classes yields six
//! module rows.

use super::model::{AcademicProfile, EducationLever, ModuleType};

const PRIMARY_LEVELS: [&str; 6] = ["P1", "P2", "P3", "P4", "P5", "P6"];
const O_LEVEL_LEVELS: [&str; 3] = ["S1", "S2", "S3"];
const A_LEVEL_LEVELS: [&str; 3] = ["S4", "S5", "S6"];
const TVET_LEVELS: [&str; 3] = ["L3", "L4", "L5"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePlan {
    pub name: String,
    pub module_type: ModuleType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPlan {
    pub name: String,
    pub education_lever: EducationLever,
    pub modules: Vec<ModulePlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademicPlan {
    pub academic_year: String,
    pub classes: Vec<ClassPlan>,
}

/// `2025` becomes `"2025-2026"`.
pub fn academic_year(year: i32) -> String {
    format!("{}-{}", year, year + 1)
}

fn modules(general: &[String], optional: &[String]) -> Vec<ModulePlan> {
    let general = general.iter().map(|name| ModulePlan {
        name: name.clone(),
        module_type: ModuleType::General,
    });
    let optional = optional.iter().map(|name| ModulePlan {
        name: name.clone(),
        module_type: ModuleType::Optional,
    });
    general.chain(optional).collect()
}

fn classes(
    levels: &[&str],
    track: Option<&str>,
    lever: EducationLever,
    modules: &[ModulePlan],
) -> impl Iterator<Item = ClassPlan> {
    levels.iter().map(move |level| ClassPlan {
        name: match track {
            Some(track) => format!("{} {}", level, track),
            None => level.to_string(),
        },
        education_lever: lever,
        modules: modules.to_vec(),
    })
}

impl AcademicPlan {
    pub fn build(profile: &AcademicProfile, year: i32) -> Self {
        let mut plan = Vec::new();

        if !profile.primary_subjects_offered.is_empty() {
            let primary = modules(&profile.primary_subjects_offered, &[]);
            plan.extend(classes(&PRIMARY_LEVELS, None, EducationLever::Primary, &primary));
        }

        if !profile.o_level_core_subjects.is_empty() || !profile.o_level_optional_subjects.is_empty()
        {
            let o_level = modules(
                &profile.o_level_core_subjects,
                &profile.o_level_optional_subjects,
            );
            plan.extend(classes(&O_LEVEL_LEVELS, None, EducationLever::OLevel, &o_level));
        }

        for combination in &profile.a_level_subject_combination {
            let a_level = modules(
                std::slice::from_ref(combination),
                &profile.a_level_optional_subjects,
            );
            plan.extend(classes(
                &A_LEVEL_LEVELS,
                Some(combination.as_str()),
                EducationLever::ALevel,
                &a_level,
            ));
        }

        for specialization in &profile.tvet_specialization {
            let tvet = modules(
                std::slice::from_ref(specialization),
                &profile.tvet_optional_subjects,
            );
            plan.extend(classes(
                &TVET_LEVELS,
                Some(specialization.as_str()),
                EducationLever::Tvet,
                &tvet,
            ));
        }

        Self {
            academic_year: academic_year(year),
            classes: plan,
        }
    }

    pub fn total_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn total_modules(&self) -> usize {
        self.classes.iter().map(|c| c.modules.len()).sum()
    }
}
