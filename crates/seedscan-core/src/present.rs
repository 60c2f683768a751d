use seedscan_schema::{AnalysisResult, Comment, Prediction};

pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentFilter {
    #[default]
    All,
    Seeding,
    Normal,
}

impl CommentFilter {
    fn matches(self, comment: &Comment) -> bool {
        match self {
            CommentFilter::All => true,
            CommentFilter::Seeding => comment.prediction == Some(Prediction::Seeding),
            CommentFilter::Normal => comment.prediction == Some(Prediction::NotSeeding),
        }
    }
}

/// Advisory banding of the seeding share. Display only, no side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_seeding_percentage(percentage: u32) -> Self {
        if percentage > 30 {
            RiskLevel::High
        } else if percentage > 10 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            RiskLevel::High => "high seeding rate, needs attention",
            RiskLevel::Medium => "moderate seeding rate",
            RiskLevel::Low => "low seeding rate",
        }
    }
}

/// Read-only projection of an [`AnalysisResult`] for rendering: filter,
/// fixed-size pagination, keyword ranking, risk banding. Owns no data.
pub struct ResultView<'a> {
    result: &'a AnalysisResult,
    filter: CommentFilter,
    page: usize,
}

impl<'a> ResultView<'a> {
    pub fn new(result: &'a AnalysisResult) -> Self {
        Self {
            result,
            filter: CommentFilter::All,
            page: 1,
        }
    }

    pub fn result(&self) -> &'a AnalysisResult {
        self.result
    }

    pub fn filter(&self) -> CommentFilter {
        self.filter
    }

    /// Current page, 1-based and always within range.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Switching filters always lands on page 1 of the new partition.
    pub fn set_filter(&mut self, filter: CommentFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn count(&self, filter: CommentFilter) -> usize {
        self.result
            .comments
            .iter()
            .filter(|c| filter.matches(c))
            .count()
    }

    pub fn filtered(&self) -> Vec<&'a Comment> {
        self.result
            .comments
            .iter()
            .filter(|c| self.filter.matches(c))
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.count(self.filter).div_ceil(PAGE_SIZE).max(1)
    }

    /// The comments on the current page of the filtered partition.
    pub fn current_page(&self) -> Vec<&'a Comment> {
        let start = (self.page - 1) * PAGE_SIZE;
        self.filtered()
            .into_iter()
            .skip(start)
            .take(PAGE_SIZE)
            .collect()
    }

    /// Out-of-range requests clamp; pages never wrap.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    /// Keywords ranked by count descending. The sort is stable, so ties
    /// keep the map's iteration order.
    pub fn top_keywords(&self, limit: usize) -> Vec<(&'a str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .result
            .keywords
            .iter()
            .map(|(keyword, count)| (keyword.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);
        entries
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_seeding_percentage(self.result.stats.seeding_percentage)
    }
}
