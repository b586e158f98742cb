pub(crate) mod academic_years;
pub(crate) mod announcements;
pub(crate) mod attendance;
pub(crate) mod classes;
pub(crate) mod grade_settings;
pub(crate) mod grades;
pub(crate) mod health;
pub(crate) mod schedules;
pub(crate) mod subjects;
pub(crate) mod users;
