use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Portal a user belongs to. Persisted as plain text so that rows written by
/// other clients with an unknown role can be detected instead of failing the
/// whole query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Guru,
    Siswa,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Guru => "guru",
            Self::Siswa => "siswa",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "guru" => Ok(Self::Guru),
            "siswa" => Ok(Self::Siswa),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub(crate) enum AttendanceStatus {
    Hadir,
    Sakit,
    Izin,
    Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "assessmenttype")]
pub(crate) enum AssessmentType {
    #[serde(rename = "Tugas Harian")]
    #[sqlx(rename = "Tugas Harian")]
    TugasHarian,
    #[serde(rename = "UTS")]
    #[sqlx(rename = "UTS")]
    Uts,
    #[serde(rename = "UAS")]
    #[sqlx(rename = "UAS")]
    Uas,
    #[serde(rename = "Lainnya")]
    #[sqlx(rename = "Lainnya")]
    Lainnya,
}

impl AssessmentType {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::TugasHarian => "Tugas Harian",
            Self::Uts => "UTS",
            Self::Uas => "UAS",
            Self::Lainnya => "Lainnya",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "schoolday", rename_all = "lowercase")]
pub(crate) enum SchoolDay {
    Senin,
    Selasa,
    Rabu,
    Kamis,
    Jumat,
    Sabtu,
    Minggu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "announcementaudience", rename_all = "lowercase")]
pub(crate) enum Audience {
    Semua,
    Guru,
    Siswa,
}

impl Audience {
    /// Audiences a user of `role` is allowed to read. Admins see everything.
    pub(crate) fn visible_to(role: UserRole) -> &'static [Audience] {
        match role {
            UserRole::Admin => &[Audience::Semua, Audience::Guru, Audience::Siswa],
            UserRole::Guru => &[Audience::Semua, Audience::Guru],
            UserRole::Siswa => &[Audience::Semua, Audience::Siswa],
        }
    }
}
