use seedscan_schema::{Comment, Prediction};

const HEADER: &str = "comment_id,comment_text,like_count,timestamp,user_id,prediction,confidence";

/// Local CSV rendering, the fallback when no server-side download is
/// available. Column order is part of the export contract. The text column
/// is always quoted, internal quotes doubled (RFC 4180); predictions render
/// as their label and confidence to three decimals, `0.000` when absent.
///
/// Takes any comment iterator so callers can feed it a filtered view
/// without cloning.
pub fn generate_csv<'a>(comments: impl IntoIterator<Item = &'a Comment>) -> String {
    let mut lines = vec![HEADER.to_string()];
    for comment in comments {
        let prediction = comment.prediction.unwrap_or(Prediction::NotSeeding).label();
        let confidence = comment
            .confidence
            .map(|value| format!("{value:.3}"))
            .unwrap_or_else(|| "0.000".to_string());
        lines.push(format!(
            "{},{},{},{},{},{},{}",
            comment.comment_id,
            quote(&comment.comment_text),
            comment.like_count,
            comment.timestamp,
            comment.user_id,
            prediction,
            confidence,
        ));
    }
    lines.join("\n")
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
