use console::style;

use seedscan_core::{CommentFilter, ResultView, RiskLevel};
use seedscan_schema::{Comment, GlobalStats, Prediction};

const TEXT_WIDTH: usize = 56;

pub fn print_connection(online: bool, base_url: &str) {
    if online {
        println!("{} {}", style("API connected:").green().bold(), base_url);
    } else {
        println!("{} {}", style("API unreachable:").yellow().bold(), base_url);
    }
}

pub fn print_demo_notice() {
    eprintln!(
        "{}",
        style("prediction API unreachable — showing randomized demo data").yellow()
    );
}

pub fn print_summary(view: &ResultView<'_>) {
    let result = view.result();
    let stats = &result.stats;

    println!();
    match &result.source {
        Some(source) => println!(
            "{} {} ({} comments)",
            style("Analysis of").bold(),
            source,
            stats.total
        ),
        None => println!("{} ({} comments)", style("Analysis").bold(), stats.total),
    }
    if let Some(id) = &result.analysis_id {
        println!("  analysis id: {id}");
    }

    println!(
        "  seeding: {}   normal: {}   rate: {}%",
        style(stats.seeding).red(),
        style(stats.not_seeding).green(),
        stats.seeding_percentage
    );

    let risk = view.risk_level();
    let risk_text = match risk {
        RiskLevel::High => style(risk.describe()).red(),
        RiskLevel::Medium => style(risk.describe()).yellow(),
        RiskLevel::Low => style(risk.describe()).green(),
    };
    println!("  risk: {risk_text}");

    let keywords = view.top_keywords(10);
    if !keywords.is_empty() {
        let listed = keywords
            .iter()
            .map(|(keyword, count)| format!("{keyword} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  top keywords: {listed}");
    }
}

pub fn print_table(view: &ResultView<'_>, show_confidence: bool) {
    let page = view.current_page();

    println!();
    if show_confidence {
        println!(
            "{:<w$}  {:>6}  {:<20}  {:<12}  {:>6}",
            "comment",
            "likes",
            "timestamp",
            "label",
            "conf",
            w = TEXT_WIDTH
        );
    } else {
        println!(
            "{:<w$}  {:>6}  {:<20}  {:<12}",
            "comment",
            "likes",
            "timestamp",
            "label",
            w = TEXT_WIDTH
        );
    }

    for comment in &page {
        print_row(comment, show_confidence);
    }
    if page.is_empty() {
        println!("{}", style("no comments match this filter").dim());
    }

    let filter_name = match view.filter() {
        CommentFilter::All => "all",
        CommentFilter::Seeding => "seeding",
        CommentFilter::Normal => "normal",
    };
    println!(
        "\npage {}/{} — {} of {} comments (filter: {filter_name})",
        view.page(),
        view.page_count(),
        view.filtered().len(),
        view.result().stats.total
    );
    if view.has_next() {
        println!("{}", style("more pages available, pass --page to see them").dim());
    }
}

pub fn print_global_stats(stats: &GlobalStats, online: bool) {
    if !online {
        eprintln!("{}", style("showing canned demo statistics").yellow());
    }
    println!("{}", style("Service statistics").bold());
    println!("  analyses run:        {}", stats.total_analyses);
    println!("  comments processed:  {}", stats.total_comments_processed);
    println!("  seeding detected:    {}", stats.total_seeding_detected);
    println!("  average seeding:     {:.1}%", stats.average_seeding_rate);
    println!("  model accuracy:      {:.1}%", stats.model_accuracy);
    println!("  last updated:        {}", stats.last_updated);

    if !stats.recent_activity.is_empty() {
        println!("  recent analyses:");
        for recent in &stats.recent_activity {
            println!(
                "    {}  {:<24}  {} comments, {}% seeding",
                recent.processed_at,
                truncate(&recent.source, 24),
                recent.comment_count,
                recent.seeding_percentage
            );
        }
    }
}

fn print_row(comment: &Comment, show_confidence: bool) {
    // Pad before styling so ANSI escapes do not skew the column width.
    let label_text = match comment.prediction {
        Some(Prediction::Seeding) => "Seeding",
        Some(Prediction::NotSeeding) => "Not Seeding",
        None => "Unclassified",
    };
    let padded = format!("{label_text:<12}");
    let label = match comment.prediction {
        Some(Prediction::Seeding) => style(padded).red(),
        Some(Prediction::NotSeeding) => style(padded).green(),
        None => style(padded).dim(),
    };
    let text = truncate(&comment.comment_text, TEXT_WIDTH);

    if show_confidence {
        let confidence = comment
            .confidence
            .map(|value| format!("{:.1}%", value * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<w$}  {:>6}  {:<20}  {}  {:>6}",
            text,
            comment.like_count,
            truncate(&comment.timestamp, 20),
            label,
            confidence,
            w = TEXT_WIDTH
        );
    } else {
        println!(
            "{:<w$}  {:>6}  {:<20}  {}",
            text,
            comment.like_count,
            truncate(&comment.timestamp, 20),
            label,
            w = TEXT_WIDTH
        );
    }
}

/// Character-boundary-safe truncation with an ellipsis.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
