use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{User, UserProfile};
use crate::db::types::UserRole;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserCreate {
    #[validate(length(min = 1, max = 128, message = "uid must be 1..128 characters"))]
    pub(crate) uid: String,
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: String,
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: String,
    pub(crate) role: UserRole,
    #[serde(default)]
    #[serde(alias = "classId")]
    pub(crate) class_id: Option<String>,
    #[serde(default)]
    pub(crate) nis: Option<String>,
    #[serde(default)]
    #[serde(alias = "subjectIds")]
    pub(crate) subject_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserUpdate {
    #[serde(default)]
    #[validate(email(message = "email must be a valid address"))]
    pub(crate) email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "classId")]
    pub(crate) class_id: Option<String>,
    #[serde(default)]
    pub(crate) nis: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubjectAssignment {
    #[serde(alias = "subjectIds")]
    pub(crate) subject_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    pub(crate) role: Option<UserRole>,
    #[serde(default)]
    #[serde(alias = "classId")]
    pub(crate) class_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) uid: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) nis: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) subject_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) homeroom_class_ids: Vec<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        let role = user.role();
        let (class_id, nis, subject_ids, homeroom_class_ids) = match user.profile {
            UserProfile::Admin => (None, None, Vec::new(), Vec::new()),
            UserProfile::Guru { subject_ids, homeroom_class_ids } => {
                (None, None, subject_ids, homeroom_class_ids)
            }
            UserProfile::Siswa { class_id, nis } => (Some(class_id), nis, Vec::new(), Vec::new()),
        };

        Self {
            uid: user.id,
            email: user.email,
            name: user.name,
            role,
            class_id,
            nis,
            subject_ids,
            homeroom_class_ids,
            created_at: format_primitive(user.created_at),
            updated_at: format_primitive(user.updated_at),
        }
    }
}
