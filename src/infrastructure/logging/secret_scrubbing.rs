use std::sync::LazyLock;

use regex::Regex;

/// Scrubs Lacework credentials from text before it is logged or returned
#[derive(Debug, Clone)]
pub struct SecretScrubber {
    patterns: Vec<(Regex, &'static str)>,
}

impl SecretScrubber {
    /// Create a scrubber with the built-in credential patterns
    pub fn new() -> Self {
        let patterns = [
            // Bearer tokens in Authorization headers
            (r"(?i)\bbearer\s+[A-Za-z0-9\-_.=+/]+", "Bearer [REDACTED]"),
            // The X-LW-UAKS header carries the API secret
            (
                r#"(?i)(x-lw-uaks["']?\s*[:=]\s*["']?)[^"'\s,}]+"#,
                "${1}[REDACTED]",
            ),
            // Credential fields in JSON bodies or key=value pairs
            (
                r#"(?i)(["']?\b(?:keyId|api_key|apikey|api_secret|secret|token|accessToken)["']?\s*[:=]\s*["']?)[^"'\s,}]+"#,
                "${1}[REDACTED]",
            ),
        ];

        Self {
            patterns: patterns
                .into_iter()
                .filter_map(|(pattern, replacement)| {
                    Regex::new(pattern).ok().map(|re| (re, replacement))
                })
                .collect(),
        }
    }

    /// Scrub a message of sensitive data
    pub fn scrub(&self, message: &str) -> String {
        self.patterns
            .iter()
            .fold(message.to_string(), |text, (re, replacement)| {
                re.replace_all(&text, *replacement).into_owned()
            })
    }
}

impl Default for SecretScrubber {
    fn default() -> Self {
        Self::new()
    }
}

static SCRUBBER: LazyLock<SecretScrubber> = LazyLock::new(SecretScrubber::new);

/// Scrub `message` with the shared scrubber
pub fn scrub_secrets(message: &str) -> String {
    SCRUBBER.scrub(message)
}
