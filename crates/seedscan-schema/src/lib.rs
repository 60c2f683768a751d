use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label assigned by the classifier. Serialized as the bare integer the
/// prediction API uses on the wire (0 = organic, 1 = seeding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Prediction {
    NotSeeding,
    Seeding,
}

impl Prediction {
    pub fn is_seeding(self) -> bool {
        matches!(self, Prediction::Seeding)
    }

    /// Label text used in tables and CSV exports.
    pub fn label(self) -> &'static str {
        match self {
            Prediction::Seeding => "Seeding",
            Prediction::NotSeeding => "Not Seeding",
        }
    }
}

impl From<Prediction> for u8 {
    fn from(p: Prediction) -> u8 {
        match p {
            Prediction::NotSeeding => 0,
            Prediction::Seeding => 1,
        }
    }
}

impl TryFrom<u8> for Prediction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Prediction::NotSeeding),
            1 => Ok(Prediction::Seeding),
            other => Err(format!("prediction must be 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One classified comment, immutable once produced by a backend.
///
/// `timestamp` is carried verbatim; its format is owned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: String,
    pub comment_text: String,
    pub like_count: u64,
    pub timestamp: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Comment {
    pub fn is_seeding(&self) -> bool {
        self.prediction.map(Prediction::is_seeding).unwrap_or(false)
    }
}

/// Aggregate counts over one analysis.
///
/// Invariants: `seeding + not_seeding == total` and `seeding_percentage ==
/// round(100 * seeding / total)`. Build via [`AnalysisStats::from_comments`]
/// to get them by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total: u64,
    pub seeding: u64,
    pub not_seeding: u64,
    pub seeding_percentage: u32,
}

impl AnalysisStats {
    pub fn from_comments(comments: &[Comment]) -> Self {
        let total = comments.len() as u64;
        let seeding = comments.iter().filter(|c| c.is_seeding()).count() as u64;
        let seeding_percentage = if total == 0 {
            0
        } else {
            ((seeding as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            total,
            seeding,
            not_seeding: total - seeding,
            seeding_percentage,
        }
    }
}

/// Result of one analysis request. Replaced wholesale by the next
/// submission, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub comments: Vec<Comment>,
    pub stats: AnalysisStats,
    #[serde(default)]
    pub keywords: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
}

/// What the user submitted. Transient: built from one form submission,
/// consumed by one analysis, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    Url(String),
    Urls(Vec<String>),
    File(PathBuf),
}

impl AnalysisInput {
    /// Human-readable descriptor attached to the result: the URL itself,
    /// `"<n> URLs"`, or the file name.
    pub fn source_label(&self) -> String {
        match self {
            AnalysisInput::Url(url) => url.clone(),
            AnalysisInput::Urls(urls) => format!("{} URLs", urls.len()),
            AnalysisInput::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }
}

/// Service-wide aggregates from `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_analyses: u64,
    pub total_comments_processed: u64,
    pub total_seeding_detected: u64,
    pub average_seeding_rate: f64,
    #[serde(default)]
    pub top_seeding_keywords: BTreeMap<String, u64>,
    pub model_accuracy: f64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub recent_activity: Vec<RecentAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentAnalysis {
    pub analysis_id: String,
    pub source: String,
    pub comment_count: u64,
    pub seeding_percentage: u32,
    pub processed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, prediction: Option<Prediction>) -> Comment {
        Comment {
            comment_id: id.into(),
            comment_text: "text".into(),
            like_count: 0,
            timestamp: "2024-01-15T10:30:00Z".into(),
            user_id: "user".into(),
            prediction,
            confidence: None,
        }
    }

    #[test]
    fn prediction_serializes_as_integer() {
        assert_eq!(serde_json::to_value(Prediction::Seeding).unwrap(), 1);
        assert_eq!(serde_json::to_value(Prediction::NotSeeding).unwrap(), 0);
        let parsed: Prediction = serde_json::from_value(serde_json::json!(1)).unwrap();
        assert_eq!(parsed, Prediction::Seeding);
    }

    #[test]
    fn prediction_rejects_unknown_codes() {
        let err = serde_json::from_value::<Prediction>(serde_json::json!(2)).unwrap_err();
        assert!(err.to_string().contains("prediction must be 0 or 1"));
    }

    #[test]
    fn comment_deserializes_without_prediction() {
        let raw = serde_json::json!({
            "comment_id": "1",
            "comment_text": "Hay quá!",
            "like_count": 10,
            "timestamp": "2024-01-15T10:30:00Z",
            "user_id": "user123"
        });
        let parsed: Comment = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.prediction, None);
        assert_eq!(parsed.confidence, None);
        assert!(!parsed.is_seeding());
    }

    #[test]
    fn analysis_result_matches_wire_shape() {
        let raw = serde_json::json!({
            "comments": [{
                "comment_id": "1",
                "comment_text": "inbox shop nhé",
                "like_count": 45,
                "timestamp": "2024-01-15T10:30:00Z",
                "user_id": "user123",
                "prediction": 1,
                "confidence": 0.92
            }],
            "stats": {
                "total": 1,
                "seeding": 1,
                "not_seeding": 0,
                "seeding_percentage": 100
            },
            "keywords": {"shop": 15},
            "source": "https://www.tiktok.com/@a/video/1",
            "processed_at": "2024-01-15T10:31:00Z",
            "analysis_id": "abc123"
        });
        let parsed: AnalysisResult = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.comments.len(), 1);
        assert_eq!(parsed.stats.seeding_percentage, 100);
        assert_eq!(parsed.keywords.get("shop"), Some(&15));
        assert_eq!(parsed.analysis_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn stats_from_comments_uphold_invariants() {
        let comments = vec![
            comment("1", Some(Prediction::Seeding)),
            comment("2", Some(Prediction::NotSeeding)),
            comment("3", None),
        ];
        let stats = AnalysisStats::from_comments(&comments);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.seeding + stats.not_seeding, stats.total);
        assert_eq!(stats.seeding_percentage, 33);
    }

    #[test]
    fn stats_from_empty_set() {
        let stats = AnalysisStats::from_comments(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.seeding_percentage, 0);
    }

    #[test]
    fn source_label_per_input_kind() {
        assert_eq!(
            AnalysisInput::Url("https://www.tiktok.com/@a/video/1".into()).source_label(),
            "https://www.tiktok.com/@a/video/1"
        );
        assert_eq!(
            AnalysisInput::Urls(vec!["a".into(), "b".into(), "c".into()]).source_label(),
            "3 URLs"
        );
        assert_eq!(
            AnalysisInput::File(PathBuf::from("/tmp/comments.json")).source_label(),
            "comments.json"
        );
    }
}
