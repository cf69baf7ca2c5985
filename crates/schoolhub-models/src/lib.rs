//! # Schoolhub Models
//!
//! Domain models and DTOs for the schoolhub API.
//!
//! # Modules
//!
//! - [`academics`]: Classes, modules and the academic profile
//! - [`ids`]: Typed UUID newtypes
//! - [`join_requests`]: School join requests and the join roles
//! - [`memberships`]: Teacher, student and staff memberships
//! - [`schools`]: Schools and their join codes
//! - [`users`]: User accounts and login DTOs
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_models::join_requests::JoinRole;
//!
//! match JoinRole::parse(&request.role) {
//!     Some(JoinRole::Staff(role)) => println!("staff: {}", role.as_str()),
//!     Some(other) => println!("{}", other.as_str()),
//!     None => println!("unknown role"),
//! }
//! ```

use std::fmt;

pub mod academics;
pub mod ids;
pub mod join_requests;
pub mod memberships;
pub mod schools;
pub mod users;

/// A stored string did not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// Re-export commonly used types at crate root for convenience
pub use academics::{
    AcademicProfile, AcademicStructureResult, Class, EducationLever, Module, ModuleType,
    SetupAcademicStructureDto,
};
pub use ids::{ClassId, JoinRequestId, ModuleId, SchoolId, SchoolStaffId, StudentId, TeacherId, UserId};
pub use join_requests::{
    AcceptJoinRequestResponse, CreateJoinRequestDto, JoinByCodeResponse, JoinRequest,
    JoinRequestFilterParams, JoinRequestStatus, JoinRole, JoinSchoolByCodeDto, StaffRole,
    UpdateJoinRequestDto,
};
pub use memberships::{
    MembershipProfile, MembershipRole, NewMembership, SchoolMembership, SchoolMembersResponse,
    SchoolStaff, Student, Teacher,
};
pub use schools::{AdministrationContactDto, CreateSchoolDto, School, SchoolView};
pub use users::{LoginRequest, LoginResponse, RegisterUserDto, User, UserRole};
