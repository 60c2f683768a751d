use std::path::Path;

use thiserror::Error;
use url::Url;

use seedscan_schema::AnalysisInput;

pub const MAX_BATCH_URLS: usize = 10;
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

const ALLOWED_HOSTS: &[&str] = &["tiktok.com", "www.tiktok.com", "vm.tiktok.com"];
const ALLOWED_EXTENSIONS: &[&str] = &["json", "csv"];

/// Input problems that block a submission. Each carries the full
/// user-facing message; the input stays editable and nothing is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid TikTok URL: {0}")]
    InvalidUrl(String),
    #[error("no URLs provided")]
    EmptyBatch,
    #[error("at most 10 URLs per analysis, got {0}")]
    TooManyUrls(usize),
    #[error("cannot read file {0}")]
    FileUnreadable(String),
    #[error("file is {0} bytes; the limit is 10 MiB")]
    FileTooLarge(u64),
    #[error("unsupported file extension \".{0}\"; only .json and .csv are accepted")]
    UnsupportedFileType(String),
}

/// Splits a pasted URL list on newlines, trimming and dropping blanks.
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// True for `http(s)` URLs whose host is one of the accepted TikTok
/// domains, case-insensitively.
pub fn is_tiktok_url(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    url.host_str()
        .map(|host| {
            let host = host.to_ascii_lowercase();
            ALLOWED_HOSTS.contains(&host.as_str())
        })
        .unwrap_or(false)
}

/// Checks one submission before any backend is contacted. Never panics;
/// the first problem found is returned as a structured error.
pub fn validate(input: &AnalysisInput) -> Result<(), ValidationError> {
    match input {
        AnalysisInput::Url(url) => validate_url(url),
        AnalysisInput::Urls(urls) => validate_batch(urls),
        AnalysisInput::File(path) => validate_file(path),
    }
}

fn validate_url(url: &str) -> Result<(), ValidationError> {
    if is_tiktok_url(url) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(url.trim().to_string()))
    }
}

fn validate_batch(urls: &[String]) -> Result<(), ValidationError> {
    if urls.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    // The count rule wins over per-URL validity.
    if urls.len() > MAX_BATCH_URLS {
        return Err(ValidationError::TooManyUrls(urls.len()));
    }
    for url in urls {
        validate_url(url)?;
    }
    Ok(())
}

fn validate_file(path: &Path) -> Result<(), ValidationError> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| ValidationError::FileUnreadable(path.display().to_string()))?;
    if metadata.len() > MAX_FILE_BYTES {
        return Err(ValidationError::FileTooLarge(metadata.len()));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::UnsupportedFileType(extension));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn accepts_each_allowed_host() {
        for url in [
            "https://tiktok.com/@a/video/1",
            "https://www.tiktok.com/@a/video/1",
            "https://vm.tiktok.com/ZMxyz/",
            "http://WWW.TIKTOK.COM/@a/video/1",
        ] {
            assert!(is_tiktok_url(url), "{url} should be accepted");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for url in [
            "https://youtube.com/watch?v=1",
            "https://tiktok.com.evil.example/@a",
            "https://m.tiktok.com/@a/video/1",
            "ftp://tiktok.com/file",
            "tiktok.com/@a/video/1",
            "not a url",
            "",
        ] {
            assert!(!is_tiktok_url(url), "{url} should be rejected");
        }
    }

    #[test]
    fn single_url_error_names_the_offender() {
        let err = validate(&AnalysisInput::Url("https://youtube.com/x".into())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid TikTok URL: https://youtube.com/x"
        );
    }

    #[test]
    fn batch_names_first_offending_url() {
        let urls = vec![
            "https://www.tiktok.com/@a/video/1".to_string(),
            "https://youtube.com/bad".to_string(),
            "https://also.invalid/x".to_string(),
        ];
        let err = validate(&AnalysisInput::Urls(urls)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidUrl("https://youtube.com/bad".into())
        );
    }

    #[test]
    fn count_error_wins_regardless_of_validity() {
        let urls: Vec<String> = (0..11).map(|_| "https://youtube.com/bad".to_string()).collect();
        let err = validate(&AnalysisInput::Urls(urls)).unwrap_err();
        assert_eq!(err, ValidationError::TooManyUrls(11));
    }

    #[test]
    fn empty_batch_is_invalid() {
        let err = validate(&AnalysisInput::Urls(vec![])).unwrap_err();
        assert_eq!(err, ValidationError::EmptyBatch);
    }

    #[test]
    fn parse_url_list_trims_and_drops_blanks() {
        let urls = parse_url_list("  https://tiktok.com/a  \n\n https://tiktok.com/b\n   \n");
        assert_eq!(urls, vec!["https://tiktok.com/a", "https://tiktok.com/b"]);
    }

    #[test]
    fn file_extension_checked_case_insensitively() {
        let mut file = tempfile::Builder::new().suffix(".JSON").tempfile().unwrap();
        writeln!(file, "[]").unwrap();
        assert!(validate(&AnalysisInput::File(file.path().to_path_buf())).is_ok());
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = validate(&AnalysisInput::File(file.path().to_path_buf())).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedFileType("txt".into()));
    }

    #[test]
    fn rejects_missing_file() {
        let err =
            validate(&AnalysisInput::File(PathBuf::from("/nonexistent/comments.json"))).unwrap_err();
        assert!(matches!(err, ValidationError::FileUnreadable(_)));
    }

    #[test]
    fn rejects_oversized_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.as_file_mut()
            .set_len(MAX_FILE_BYTES + 1)
            .unwrap();
        write!(file, "x").unwrap();
        let err = validate(&AnalysisInput::File(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge(_)));
    }
}
