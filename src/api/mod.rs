pub(crate) mod academic_years;
pub(crate) mod announcements;
pub(crate) mod attendance;
pub(crate) mod auth;
pub(crate) mod classes;
pub(crate) mod errors;
pub(crate) mod grade_settings;
pub(crate) mod grades;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod print;
pub(crate) mod reports;
pub(crate) mod router;
pub(crate) mod schedules;
pub(crate) mod subjects;
pub(crate) mod users;
pub(crate) mod validation;
