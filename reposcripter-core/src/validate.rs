//! Repository URL validation applied by consumers before a run is started.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::PipelineError;

pub const MISSING_URL: &str = "Please enter a GitHub repository URL.";
pub const INVALID_URL: &str =
    "Invalid GitHub repository URL. Format should be: https://github.com/user/repo";

fn github_repo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(https|http)://github\.com/[A-Za-z0-9_-]+/[A-Za-z0-9_.-]+$")
            .unwrap_or_else(|e| unreachable!("static pattern failed to compile: {e}"))
    })
}

/// Accept `http(s)://github.com/<owner>/<repo>` and nothing else.
pub fn validate_repo_url(url: &str) -> Result<&str, PipelineError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(PipelineError::Validation(MISSING_URL.to_string()));
    }
    if !github_repo_pattern().is_match(url) {
        return Err(PipelineError::Validation(INVALID_URL.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_owner_and_repo_urls() {
        assert!(validate_repo_url("https://github.com/reactjs/reactjs.org").is_ok());
        assert!(validate_repo_url("http://github.com/user/my-repo").is_ok());
        assert_eq!(
            validate_repo_url("  https://github.com/a/b  ").unwrap(),
            "https://github.com/a/b"
        );
    }

    #[test]
    fn rejects_empty_input_with_prompting_message() {
        let err = validate_repo_url("").unwrap_err();
        assert_eq!(err.to_string(), MISSING_URL);
    }

    #[test]
    fn rejects_other_hosts_and_deeper_paths() {
        for url in [
            "https://example.com/acme/widget-api",
            "https://github.com/only-owner",
            "https://github.com/a/b/tree/main",
            "ftp://github.com/a/b",
        ] {
            let err = validate_repo_url(url).unwrap_err();
            assert_eq!(err.to_string(), INVALID_URL, "url: {url}");
        }
    }

    #[test]
    fn rejects_non_ascii_owner_and_repo_names() {
        for url in ["https://github.com/us\u{e9}r/repo", "https://github.com/user/r\u{e9}po"] {
            let err = validate_repo_url(url).unwrap_err();
            assert_eq!(err.to_string(), INVALID_URL, "url: {url}");
        }
    }
}
