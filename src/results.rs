use crate::heuristics::Classification;
use serde::{Serialize, Serializer};
use std::fmt;

/// Placeholder for empty evidence or banned-term columns
pub const NONE_MARKER: &str = "None";

/// Placeholder for the evidence columns of rows whose fetch failed
pub const NOT_APPLICABLE: &str = "N/A";

/// Column names matching [`ResultRecord::to_row`]
pub const HEADER: [&str; 4] = ["URL", "Status", "Found Keywords", "Banned Keywords"];

/// Display status of a result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Detected,
    NotDetected,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Detected => f.write_str("Online shop detected"),
            Status::NotDetected => f.write_str("No shop found"),
            Status::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One output row per input URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    /// The URL exactly as given in the input
    pub url: String,

    pub status: Status,

    /// Matched keywords or other evidence, `None`, or `N/A` on error
    pub evidence: String,

    /// Banned keyword that suppressed detection, `None`, or `N/A` on error
    pub banned_keyword: String,
}

impl ResultRecord {
    /// Flatten a classification into a display row
    pub fn new(url: impl Into<String>, outcome: Classification) -> Self {
        let url = url.into();
        match outcome {
            Classification::ShopDetected { evidence } => Self {
                url,
                status: Status::Detected,
                evidence,
                banned_keyword: NONE_MARKER.to_string(),
            },
            Classification::NoShopFound { banned_term } => Self {
                url,
                status: Status::NotDetected,
                evidence: NONE_MARKER.to_string(),
                banned_keyword: banned_term.unwrap_or_else(|| NONE_MARKER.to_string()),
            },
            Classification::FetchError { message } => Self::error(url, message),
        }
    }

    /// A row for a URL that could not be classified
    pub fn error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: Status::Error(message.into()),
            evidence: NOT_APPLICABLE.to_string(),
            banned_keyword: NOT_APPLICABLE.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, Status::Error(_))
    }

    /// The four display columns, in [`HEADER`] order
    pub fn to_row(&self) -> [String; 4] {
        [
            self.url.clone(),
            self.status.to_string(),
            self.evidence.clone(),
            self.banned_keyword.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_row() {
        let record = ResultRecord::new(
            "https://a.example",
            Classification::detected("add to cart, cart"),
        );
        assert_eq!(
            record.to_row(),
            [
                "https://a.example".to_string(),
                "Online shop detected".to_string(),
                "add to cart, cart".to_string(),
                "None".to_string(),
            ]
        );
    }

    #[test]
    fn test_banned_row() {
        let record = ResultRecord::new("u", Classification::banned("workshop"));
        assert_eq!(record.status, Status::NotDetected);
        assert_eq!(record.status.to_string(), "No shop found");
        assert_eq!(record.evidence, NONE_MARKER);
        assert_eq!(record.banned_keyword, "workshop");
    }

    #[test]
    fn test_error_row() {
        let record = ResultRecord::new(
            "u",
            Classification::FetchError {
                message: "connection refused".to_string(),
            },
        );
        assert!(record.is_error());
        assert_eq!(record.status.to_string(), "Error: connection refused");
        assert_eq!(record.evidence, NOT_APPLICABLE);
        assert_eq!(record.banned_keyword, NOT_APPLICABLE);
    }

    #[test]
    fn test_serializes_status_as_text() {
        let record = ResultRecord::new("u", Classification::not_found());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "No shop found");
        assert_eq!(json["banned_keyword"], "None");
    }
}
