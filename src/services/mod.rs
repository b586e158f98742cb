pub(crate) mod attendance_tally;
pub(crate) mod grade_aggregator;
pub(crate) mod grade_policy;
pub(crate) mod print;
pub(crate) mod report_card;
