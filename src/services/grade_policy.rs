use thiserror::Error;

use crate::db::models::GradeSettings;

/// Sum of all five percentages may drift this far from 100 before it is
/// rejected.
pub(crate) const SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PercentageInput {
    pub(crate) tugas: f64,
    pub(crate) uts: f64,
    pub(crate) uas: f64,
    pub(crate) lainnya: Option<f64>,
    pub(crate) absence: Option<f64>,
}

impl PercentageInput {
    pub(crate) fn total(&self) -> f64 {
        self.tugas + self.uts + self.uas + self.lainnya.unwrap_or(0.0) + self.absence.unwrap_or(0.0)
    }
}

impl From<&GradeSettings> for PercentageInput {
    fn from(settings: &GradeSettings) -> Self {
        Self {
            tugas: settings.tugas_percentage,
            uts: settings.uts_percentage,
            uas: settings.uas_percentage,
            lainnya: settings.lainnya_percentage,
            absence: settings.absence_percentage,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub(crate) enum PolicyViolation {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be greater than 0")]
    NotPositive { field: &'static str },
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("percentages must add up to 100 (got {total:.2})")]
    BadTotal { total: f64 },
}

/// Rules a weight configuration must satisfy before it is stored.
pub(crate) fn validate(input: &PercentageInput) -> Result<(), PolicyViolation> {
    let required = [
        ("tugas_percentage", input.tugas),
        ("uts_percentage", input.uts),
        ("uas_percentage", input.uas),
    ];
    let optional = [("lainnya_percentage", input.lainnya), ("absence_percentage", input.absence)];

    for (field, value) in required {
        if !value.is_finite() {
            return Err(PolicyViolation::NotFinite { field });
        }
        if value <= 0.0 {
            return Err(PolicyViolation::NotPositive { field });
        }
    }

    for (field, value) in optional {
        let Some(value) = value else { continue };
        if !value.is_finite() {
            return Err(PolicyViolation::NotFinite { field });
        }
        if value < 0.0 {
            return Err(PolicyViolation::Negative { field });
        }
    }

    let total = input.total();
    if (total - 100.0).abs() > SUM_TOLERANCE {
        return Err(PolicyViolation::BadTotal { total });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(
        tugas: f64,
        uts: f64,
        uas: f64,
        lainnya: Option<f64>,
        absence: Option<f64>,
    ) -> PercentageInput {
        PercentageInput { tugas, uts, uas, lainnya, absence }
    }

    #[test]
    fn accepts_exact_hundred() {
        assert_eq!(validate(&input(40.0, 30.0, 20.0, Some(10.0), Some(0.0))), Ok(()));
        assert_eq!(validate(&input(50.0, 25.0, 25.0, None, None)), Ok(()));
    }

    #[test]
    fn tolerates_rounding_noise() {
        assert_eq!(validate(&input(33.335, 33.33, 33.33, None, None)), Ok(()));
    }

    #[test]
    fn rejects_totals_outside_tolerance() {
        let err = validate(&input(40.0, 30.0, 20.0, Some(9.0), None)).unwrap_err();
        assert!(matches!(err, PolicyViolation::BadTotal { .. }));

        let err = validate(&input(40.0, 30.0, 20.0, Some(10.0), Some(0.02))).unwrap_err();
        assert!(matches!(err, PolicyViolation::BadTotal { .. }));
    }

    #[test]
    fn core_weights_must_be_positive() {
        let err = validate(&input(0.0, 50.0, 50.0, None, None)).unwrap_err();
        assert_eq!(err, PolicyViolation::NotPositive { field: "tugas_percentage" });
    }

    #[test]
    fn optional_weights_must_not_be_negative() {
        let err = validate(&input(50.0, 30.0, 30.0, Some(-10.0), None)).unwrap_err();
        assert_eq!(err, PolicyViolation::Negative { field: "lainnya_percentage" });
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = validate(&input(f64::NAN, 50.0, 50.0, None, None)).unwrap_err();
        assert_eq!(err, PolicyViolation::NotFinite { field: "tugas_percentage" });

        let err = validate(&input(50.0, 25.0, 25.0, None, Some(f64::INFINITY))).unwrap_err();
        assert_eq!(err, PolicyViolation::NotFinite { field: "absence_percentage" });
    }
}
