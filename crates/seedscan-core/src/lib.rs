pub mod config;
pub mod present;
pub mod session;
pub mod validate;

pub use config::{load_config, AppConfig};
pub use present::{CommentFilter, ResultView, RiskLevel, PAGE_SIZE};
pub use session::{
    reduce, AnalysisSession, CsvExport, SessionEvent, SessionState, SubmitOutcome,
};
pub use validate::{parse_url_list, validate, ValidationError};
