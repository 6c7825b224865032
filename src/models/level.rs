// src/models/level.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of education levels partitioning quiz content.
///
/// Serialized with the Vietnamese display tags used by the frontend
/// (e.g. "Lớp 1", "Đại học"), which are also the values stored in the
/// `level` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "Mẫu giáo")]
    Kindergarten,
    #[serde(rename = "Lớp 1")]
    Grade1,
    #[serde(rename = "Lớp 2")]
    Grade2,
    #[serde(rename = "Lớp 3")]
    Grade3,
    #[serde(rename = "Lớp 4")]
    Grade4,
    #[serde(rename = "Lớp 5")]
    Grade5,
    #[serde(rename = "Lớp 6")]
    Grade6,
    #[serde(rename = "Lớp 7")]
    Grade7,
    #[serde(rename = "Lớp 8")]
    Grade8,
    #[serde(rename = "Lớp 9")]
    Grade9,
    #[serde(rename = "Lớp 10")]
    Grade10,
    #[serde(rename = "Lớp 11")]
    Grade11,
    #[serde(rename = "Lớp 12")]
    Grade12,
    #[serde(rename = "Đại học")]
    University,
    #[serde(rename = "TOEIC")]
    Toeic,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 15] = [
        EducationLevel::Kindergarten,
        EducationLevel::Grade1,
        EducationLevel::Grade2,
        EducationLevel::Grade3,
        EducationLevel::Grade4,
        EducationLevel::Grade5,
        EducationLevel::Grade6,
        EducationLevel::Grade7,
        EducationLevel::Grade8,
        EducationLevel::Grade9,
        EducationLevel::Grade10,
        EducationLevel::Grade11,
        EducationLevel::Grade12,
        EducationLevel::University,
        EducationLevel::Toeic,
    ];

    /// The canonical tag stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Kindergarten => "Mẫu giáo",
            EducationLevel::Grade1 => "Lớp 1",
            EducationLevel::Grade2 => "Lớp 2",
            EducationLevel::Grade3 => "Lớp 3",
            EducationLevel::Grade4 => "Lớp 4",
            EducationLevel::Grade5 => "Lớp 5",
            EducationLevel::Grade6 => "Lớp 6",
            EducationLevel::Grade7 => "Lớp 7",
            EducationLevel::Grade8 => "Lớp 8",
            EducationLevel::Grade9 => "Lớp 9",
            EducationLevel::Grade10 => "Lớp 10",
            EducationLevel::Grade11 => "Lớp 11",
            EducationLevel::Grade12 => "Lớp 12",
            EducationLevel::University => "Đại học",
            EducationLevel::Toeic => "TOEIC",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EducationLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EducationLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or(())
    }
}
