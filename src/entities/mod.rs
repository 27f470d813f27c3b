use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Where a product code is in the scrape workflow.
///
/// The stored strings are part of the table contract and are shared with
/// other tools reading the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStatus {
    #[serde(rename = "Not started")]
    NotStarted,
    #[serde(rename = "Started", alias = "In progress")]
    Started,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "No data found")]
    NoDataFound,
    #[serde(rename = "Failed")]
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not started",
            Self::Started => "Started",
            Self::Completed => "Completed",
            Self::NoDataFound => "No data found",
            Self::Failed => "Failed",
        }
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown processing status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for ProcessingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not started" => Ok(Self::NotStarted),
            "Started" | "In progress" => Ok(Self::Started),
            "Completed" => Ok(Self::Completed),
            "No data found" => Ok(Self::NoDataFound),
            "Failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One row of the product-code table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub product_code: String,
    pub status: ProcessingStatus,
    /// Extracted record on success, `{"error_message": ...}` on failure.
    pub data: Option<serde_json::Value>,
    pub create_at: Option<DateTime<Utc>>,
    pub update_at: Option<DateTime<Utc>>,
}

impl StatusRecord {
    pub fn not_started(product_code: impl Into<String>) -> Self {
        Self {
            product_code: product_code.into(),
            status: ProcessingStatus::NotStarted,
            data: None,
            create_at: None,
            update_at: None,
        }
    }
}
