use anyhow::anyhow;
use chrono::Datelike;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, instrument, warn};

use schoolhub_config::AcademicConfig;
use schoolhub_core::{AppError, IdentSource, RandomIdents};
use schoolhub_models::{ClassId, ModuleId, SchoolId, UserId};

use crate::metrics;
use crate::modules::schools::service::SchoolService;

use super::model::{AcademicProfile, AcademicStructureResult, SetupAcademicStructureDto};
use super::plan::{AcademicPlan, ClassPlan, ModulePlan};

fn exhausted(what: &str) -> AppError {
    AppError::bad_request(anyhow!(
        "Could not generate a unique identifier for {}, please resubmit",
        what
    ))
}

pub struct AcademicService;

impl AcademicService {
    /// Generates classes and modules for the school's current academic year
    /// and stores the declared profile and counts on the school.
    ///
    /// Runs in one transaction. Calling it twice creates a second set of
    /// classes and modules.
    pub async fn setup_academic_structure(
        db: &PgPool,
        config: &AcademicConfig,
        acting_user_id: UserId,
        dto: SetupAcademicStructureDto,
    ) -> Result<AcademicStructureResult, AppError> {
        Self::setup_academic_structure_with(db, config, &RandomIdents, acting_user_id, dto).await
    }

    /// [`Self::setup_academic_structure`] with class and module identifiers
    /// drawn from `idents`.
    #[instrument(skip(db, config, idents, dto), fields(school.id = %dto.school_id, db.operation = "TRANSACTION"))]
    pub async fn setup_academic_structure_with(
        db: &PgPool,
        config: &AcademicConfig,
        idents: &dyn IdentSource,
        acting_user_id: UserId,
        dto: SetupAcademicStructureDto,
    ) -> Result<AcademicStructureResult, AppError> {
        let school = SchoolService::find_by_id(db, dto.school_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("School not found")))?;

        if school.created_by != Some(acting_user_id) {
            warn!(user.id = %acting_user_id, "Academic setup by someone other than the school creator");
            return Err(AppError::forbidden(
                "Only the creator of the school can set up its academic structure".to_string(),
            ));
        }

        let profile = AcademicProfile::from(&dto);
        let plan = AcademicPlan::build(&profile, chrono::Utc::now().year());
        debug!(
            classes = plan.total_classes(),
            modules = plan.total_modules(),
            academic_year = %plan.academic_year,
            "Academic plan built"
        );

        let mut tx = db.begin().await?;

        let mut total_modules: usize = 0;
        for class in &plan.classes {
            let class_id = Self::insert_class(
                &mut tx,
                config,
                idents,
                school.id,
                &plan.academic_year,
                class,
            )
            .await?;
            for module in &class.modules {
                Self::insert_module(&mut tx, config, idents, school.id, class_id, class, module)
                    .await?;
                total_modules += 1;
            }
        }
        let total_classes = plan.classes.len();

        let result = AcademicStructureResult {
            total_classes: i32::try_from(total_classes)?,
            total_modules: i32::try_from(total_modules)?,
        };

        sqlx::query(
            "UPDATE schools
             SET academic_profile = $2, total_classes = $3, total_modules = $4, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(school.id)
        .bind(Json(&profile))
        .bind(result.total_classes)
        .bind(result.total_modules)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error storing academic profile");
            AppError::from(e)
        })?;

        tx.commit().await?;

        metrics::track_academic_structure_generated(total_classes as u64, total_modules as u64);
        info!(
            school.id = %school.id,
            total_classes = result.total_classes,
            total_modules = result.total_modules,
            "Academic structure generated"
        );
        Ok(result)
    }

    /// Inserts a class, drawing fresh identifiers when they collide.
    async fn insert_class(
        conn: &mut PgConnection,
        config: &AcademicConfig,
        idents: &dyn IdentSource,
        school_id: SchoolId,
        academic_year: &str,
        class: &ClassPlan,
    ) -> Result<ClassId, AppError> {
        for attempt in 1..=config.ident_max_attempts {
            let inserted = sqlx::query_scalar::<_, ClassId>(
                "INSERT INTO classes
                    (school_id, name, code, username, education_lever, curriculum, academic_year)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT DO NOTHING
                 RETURNING id",
            )
            .bind(school_id)
            .bind(&class.name)
            .bind(idents.code())
            .bind(idents.username(&format!("{} {}", class.name, academic_year)))
            .bind(class.education_lever.as_str())
            .bind(&config.curriculum)
            .bind(academic_year)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                error!(error = %e, class.name = %class.name, "Database error inserting class");
                AppError::from(e)
            })?;

            if let Some(id) = inserted {
                return Ok(id);
            }
            debug!(attempt, class.name = %class.name, "Class identifier collision");
        }

        warn!(class.name = %class.name, "Gave up generating class identifiers");
        Err(exhausted(&format!("class {}", class.name)))
    }

    async fn insert_module(
        conn: &mut PgConnection,
        config: &AcademicConfig,
        idents: &dyn IdentSource,
        school_id: SchoolId,
        class_id: ClassId,
        class: &ClassPlan,
        module: &ModulePlan,
    ) -> Result<ModuleId, AppError> {
        for attempt in 1..=config.ident_max_attempts {
            let inserted = sqlx::query_scalar::<_, ModuleId>(
                "INSERT INTO modules (school_id, class_id, name, code, module_type, education_lever)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT DO NOTHING
                 RETURNING id",
            )
            .bind(school_id)
            .bind(class_id)
            .bind(&module.name)
            .bind(idents.code())
            .bind(module.module_type.as_str())
            .bind(class.education_lever.as_str())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                error!(error = %e, module.name = %module.name, "Database error inserting module");
                AppError::from(e)
            })?;

            if let Some(id) = inserted {
                return Ok(id);
            }
            debug!(attempt, module.name = %module.name, "Module code collision");
        }

        warn!(module.name = %module.name, "Gave up generating module codes");
        Err(exhausted(&format!("module {} of {}", module.name, class.name)))
    }
}
