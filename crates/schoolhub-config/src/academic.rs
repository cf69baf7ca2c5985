use std::env;

/// Settings for the academic structure generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcademicConfig {
    /// How many fresh identifiers to draw for one class or module before
    /// giving up on a collision.
    pub ident_max_attempts: u32,
    /// Curriculum tag stored on every generated class.
    pub curriculum: String,
}

impl Default for AcademicConfig {
    fn default() -> Self {
        Self {
            ident_max_attempts: 5,
            curriculum: "REB".to_string(),
        }
    }
}

impl AcademicConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ident_max_attempts: env::var("ACADEMIC_IDENT_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u32| *v > 0)
                .unwrap_or(defaults.ident_max_attempts),
            curriculum: env::var("ACADEMIC_CURRICULUM")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.curriculum),
        }
    }
}
