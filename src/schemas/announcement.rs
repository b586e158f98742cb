use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Announcement;
use crate::db::types::Audience;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnnouncementCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1..200 characters"))]
    pub(crate) title: String,
    #[validate(length(min = 1, max = 10000, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(default = "default_audience")]
    pub(crate) audience: Audience,
}

fn default_audience() -> Audience {
    Audience::Semua
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnnouncementListQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be in range 1..100"))]
    pub(crate) limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub(crate) struct AnnouncementResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) audience: Audience,
    pub(crate) author_id: String,
    pub(crate) created_at: String,
}

impl AnnouncementResponse {
    pub(crate) fn from_db(announcement: Announcement) -> Self {
        Self {
            id: announcement.id,
            title: announcement.title,
            content: announcement.content,
            audience: announcement.audience,
            author_id: announcement.author_id,
            created_at: format_primitive(announcement.created_at),
        }
    }
}
