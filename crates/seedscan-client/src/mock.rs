use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::sync::Mutex;

use seedscan_schema::{
    AnalysisInput, AnalysisResult, AnalysisStats, Comment, GlobalStats, Prediction,
};

use crate::{AnalysisBackend, ClientError};

/// Above this draw a comment is labelled seeding; keeps seeding the
/// minority branch in expectation.
const SEEDING_THRESHOLD: f64 = 0.6;

const DEFAULT_LATENCY: Duration = Duration::from_millis(2000);

/// Offline stand-in for the prediction service, used when the connectivity
/// probe fails. Interface matches the real backend; output is randomized
/// demo data with internally consistent stats. No correctness requirement
/// on prediction quality.
pub struct MockBackend {
    rng: Mutex<StdRng>,
    latency: Duration,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            latency: DEFAULT_LATENCY,
        }
    }

    /// Seeded variant so tests can assert exact outputs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            latency: DEFAULT_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Canned counterpart of `GET /stats` for the offline stats command.
    pub fn global_stats(&self) -> GlobalStats {
        GlobalStats {
            total_analyses: 214,
            total_comments_processed: 1250,
            total_seeding_detected: 312,
            average_seeding_rate: 25.0,
            top_seeding_keywords: demo_keywords(),
            model_accuracy: 94.5,
            last_updated: Utc::now(),
            recent_activity: Vec::new(),
        }
    }

    async fn classify(&self, mut comments: Vec<Comment>) -> AnalysisResult {
        {
            let mut rng = self.rng.lock().await;
            for comment in &mut comments {
                let prediction = if rng.gen::<f64>() > SEEDING_THRESHOLD {
                    Prediction::Seeding
                } else {
                    Prediction::NotSeeding
                };
                comment.prediction = Some(prediction);
                comment.confidence = Some(0.7 + rng.gen::<f64>() * 0.3);
            }
        }

        let stats = AnalysisStats::from_comments(&comments);
        AnalysisResult {
            comments,
            stats,
            keywords: demo_keywords(),
            source: None,
            processed_at: Some(Utc::now().to_rfc3339()),
            analysis_id: None,
        }
    }

    /// File payloads that are a JSON array of comment-like records are
    /// mapped to normalized comments; anything else falls back to the
    /// canned demo set.
    async fn load_records(path: &Path) -> Option<Vec<Comment>> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "mock falling back to demo data");
                return None;
            }
        };
        let records: Vec<RawRecord> = match serde_json::from_str(&text) {
            Ok(records) => records,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "mock falling back to demo data");
                return None;
            }
        };
        Some(
            records
                .into_iter()
                .enumerate()
                .map(|(index, record)| record.into_comment(index))
                .collect(),
        )
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl AnalysisBackend for MockBackend {
    async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, ClientError> {
        tokio::time::sleep(self.latency).await;

        let comments = match input {
            AnalysisInput::Url(_) | AnalysisInput::Urls(_) => demo_comments(),
            AnalysisInput::File(path) => {
                Self::load_records(path).await.unwrap_or_else(demo_comments)
            }
        };
        Ok(self.classify(comments).await)
    }
}

/// Imported record shape: the documented file columns, every field
/// optional so partial rows still map.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    comment_id: String,
    #[serde(default)]
    comment_text: String,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    timestamp: String,
    #[serde(default)]
    user_id: String,
}

impl RawRecord {
    fn into_comment(self, index: usize) -> Comment {
        let comment_id = if self.comment_id.is_empty() {
            format!("imported_{index}")
        } else {
            self.comment_id
        };
        Comment {
            comment_id,
            comment_text: self.comment_text,
            like_count: self.like_count,
            timestamp: self.timestamp,
            user_id: self.user_id,
            prediction: None,
            confidence: None,
        }
    }
}

fn demo_comment(
    id: &str,
    text: &str,
    like_count: u64,
    timestamp: &str,
    user_id: &str,
) -> Comment {
    Comment {
        comment_id: id.into(),
        comment_text: text.into(),
        like_count,
        timestamp: timestamp.into(),
        user_id: user_id.into(),
        prediction: None,
        confidence: None,
    }
}

fn demo_comments() -> Vec<Comment> {
    vec![
        demo_comment(
            "1",
            "Sản phẩm này tuyệt vời quá! Tôi đã mua và rất hài lòng. Bạn nào cần thì inbox shop nhé!",
            45,
            "2024-01-15T10:30:00Z",
            "user123",
        ),
        demo_comment(
            "2",
            "Video hay quá! Cảm ơn bạn đã chia sẻ",
            12,
            "2024-01-15T11:15:00Z",
            "user456",
        ),
        demo_comment(
            "3",
            "Shop này uy tín lắm các bạn ơi! Tôi đã mua nhiều lần rồi, chất lượng đảm bảo 100%",
            89,
            "2024-01-15T12:00:00Z",
            "user789",
        ),
        demo_comment(
            "4",
            "Âm nhạc trong video này hay quá!",
            23,
            "2024-01-15T13:20:00Z",
            "user101",
        ),
        demo_comment(
            "5",
            "Link mua ở đâu vậy admin? Inbox em với ạ! Cần gấp quá",
            67,
            "2024-01-15T14:45:00Z",
            "user202",
        ),
        demo_comment(
            "6",
            "Haha clip này vui ghê!",
            8,
            "2024-01-15T15:10:00Z",
            "user303",
        ),
    ]
}

fn demo_keywords() -> std::collections::BTreeMap<String, u64> {
    [
        ("shop", 15),
        ("mua", 12),
        ("inbox", 10),
        ("sản phẩm", 9),
        ("uy tín", 8),
        ("link", 7),
        ("chất lượng", 6),
        ("admin", 6),
        ("đảm bảo", 5),
        ("gấp", 4),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn quick_mock(seed: u64) -> MockBackend {
        MockBackend::with_seed(seed).with_latency(Duration::ZERO)
    }

    #[tokio::test]
    async fn url_input_returns_demo_set_with_fresh_predictions() {
        let mock = quick_mock(7);
        let result = mock
            .analyze(&AnalysisInput::Url(
                "https://www.tiktok.com/@a/video/1".into(),
            ))
            .await
            .unwrap();

        assert_eq!(result.comments.len(), 6);
        assert_eq!(result.stats.total, 6);
        assert!(result.comments.iter().all(|c| c.prediction.is_some()));
        assert!(result
            .comments
            .iter()
            .all(|c| (0.7..1.0).contains(&c.confidence.unwrap())));
        assert!(result.analysis_id.is_none());
    }

    #[tokio::test]
    async fn stats_invariants_hold() {
        for seed in 0..20 {
            let mock = quick_mock(seed);
            let result = mock
                .analyze(&AnalysisInput::Urls(vec!["https://tiktok.com/a".into()]))
                .await
                .unwrap();
            let stats = &result.stats;
            assert_eq!(stats.seeding + stats.not_seeding, stats.total);
            let expected =
                ((stats.seeding as f64 / stats.total as f64) * 100.0).round() as u32;
            assert_eq!(stats.seeding_percentage, expected);
        }
    }

    #[tokio::test]
    async fn same_seed_same_output() {
        let input = AnalysisInput::Url("https://www.tiktok.com/@a/video/1".into());
        let a = quick_mock(42).analyze(&input).await.unwrap();
        let b = quick_mock(42).analyze(&input).await.unwrap();
        assert_eq!(a.comments, b.comments);
        assert_eq!(a.stats, b.stats);
    }

    #[tokio::test]
    async fn json_file_records_are_mapped_and_classified() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"comment_id": "c1", "comment_text": "Hay quá", "like_count": 3,
                  "timestamp": "2024-02-01T00:00:00Z", "user_id": "u1"}},
                {{"comment_text": "thiếu id"}}
            ]"#
        )
        .unwrap();

        let mock = quick_mock(1);
        let result = mock
            .analyze(&AnalysisInput::File(file.path().to_path_buf()))
            .await
            .unwrap();

        assert_eq!(result.comments.len(), 2);
        assert_eq!(result.comments[0].comment_id, "c1");
        assert_eq!(result.comments[1].comment_id, "imported_1");
        assert!(result.comments.iter().all(|c| c.prediction.is_some()));
        assert_eq!(result.stats.total, 2);
    }

    #[tokio::test]
    async fn unparseable_file_falls_back_to_demo_set() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "comment_id,comment_text").unwrap();
        writeln!(file, "1,hello").unwrap();

        let mock = quick_mock(1);
        let result = mock
            .analyze(&AnalysisInput::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(result.comments.len(), 6);
    }

    #[tokio::test]
    async fn keywords_are_attached() {
        let mock = quick_mock(3);
        let result = mock
            .analyze(&AnalysisInput::Url("https://tiktok.com/x".into()))
            .await
            .unwrap();
        assert_eq!(result.keywords.get("shop"), Some(&15));
        assert_eq!(result.keywords.len(), 10);
    }
}
