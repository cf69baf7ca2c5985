use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use schoolhub_models::{
    AcademicProfile, AcademicStructureResult, AcceptJoinRequestResponse, AdministrationContactDto,
    Class, CreateJoinRequestDto, CreateSchoolDto, EducationLever, JoinByCodeResponse,
    JoinRequest, JoinRequestStatus, JoinSchoolByCodeDto, LoginRequest, LoginResponse,
    MembershipRole, Module, ModuleType, RegisterUserDto, SchoolMembersResponse,
    SchoolMembership, SchoolStaff, SchoolView, SetupAcademicStructureDto, Student, Teacher,
    UpdateJoinRequestDto, User, UserRole,
};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::users::controller::get_me,
        crate::modules::schools::controller::create_school,
        crate::modules::schools::controller::get_school,
        crate::modules::schools::controller::get_school_by_username,
        crate::modules::schools::controller::get_school_classes,
        crate::modules::schools::controller::get_school_modules,
        crate::modules::schools::controller::get_school_members,
        crate::modules::academics::controller::setup_academic_structure,
        crate::modules::join_requests::controller::create_join_request,
        crate::modules::join_requests::controller::get_join_requests,
        crate::modules::join_requests::controller::get_join_requests_by_school,
        crate::modules::join_requests::controller::get_join_requests_by_email,
        crate::modules::join_requests::controller::get_join_request,
        crate::modules::join_requests::controller::update_join_request,
        crate::modules::join_requests::controller::delete_join_request,
        crate::modules::join_requests::controller::accept_join_request,
        crate::modules::join_requests::controller::reject_join_request,
        crate::modules::join_requests::controller::join_school_by_code,
    ),
    components(
        schemas(
            User,
            UserRole,
            RegisterUserDto,
            LoginRequest,
            LoginResponse,
            SchoolView,
            CreateSchoolDto,
            AdministrationContactDto,
            Class,
            Module,
            EducationLever,
            ModuleType,
            AcademicProfile,
            SetupAcademicStructureDto,
            AcademicStructureResult,
            JoinRequest,
            JoinRequestStatus,
            CreateJoinRequestDto,
            UpdateJoinRequestDto,
            JoinSchoolByCodeDto,
            AcceptJoinRequestResponse,
            JoinByCodeResponse,
            MembershipRole,
            SchoolMembership,
            Teacher,
            Student,
            SchoolStaff,
            SchoolMembersResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and login"),
        (name = "Users", description = "The signed-in account"),
        (name = "Schools", description = "Schools and their members"),
        (name = "Academics", description = "Generated classes and modules"),
        (name = "Join Requests", description = "Requests to join a school and joining by code")
    ),
    info(
        title = "Schoolhub API",
        version = "0.1.0",
        description = "Multi-tenant school management: schools, join requests, memberships and academic structure.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
