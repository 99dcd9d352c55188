use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub kdp_format: KdpFormat,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Trim sizes offered for new manuscripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KdpFormat {
    #[serde(rename = "5x8")]
    FiveByEight,
    #[default]
    #[serde(rename = "6x9")]
    SixByNine,
    #[serde(rename = "8.5x11")]
    Letter,
}

impl KdpFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            KdpFormat::FiveByEight => "5x8",
            KdpFormat::SixByNine => "6x9",
            KdpFormat::Letter => "8.5x11",
        }
    }
}

impl FromStr for KdpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "5x8" => Ok(KdpFormat::FiveByEight),
            "6x9" => Ok(KdpFormat::SixByNine),
            "8.5x11" => Ok(KdpFormat::Letter),
            other => Err(format!("unknown format '{}' (expected 5x8, 6x9 or 8.5x11)", other)),
        }
    }
}
