//! Strict mode: artifact-ID-only response enforcement
//!
//! When enabled, anything the orchestrator surfaces externally must cite at
//! least one content-derived artifact identifier (64 hex chars) and carry at
//! most 50 characters of residual formatting text once identifiers are
//! stripped.

use std::sync::LazyLock;

use regex::Regex;

static ARTIFACT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-f0-9]{64}").expect("artifact id regex is valid"));

/// Maximum characters of non-identifier text a strict response may carry.
const MAX_RESIDUAL_CHARS: usize = 50;

/// Enforces artifact-ID-only responses.
#[derive(Debug, Clone, Copy)]
pub struct StrictMode {
    enabled: bool,
}

impl StrictMode {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// A response is valid when it cites at least one artifact id and the
    /// remaining text, after stripping all ids and collapsing whitespace,
    /// fits in the residual budget. Disabled mode accepts everything.
    #[must_use]
    pub fn validate_response(&self, response: &str) -> bool {
        if !self.enabled {
            return true;
        }
        if !ARTIFACT_ID_RE.is_match(response) {
            return false;
        }
        let residual = ARTIFACT_ID_RE.replace_all(response, "");
        let collapsed = residual.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().count() <= MAX_RESIDUAL_CHARS
    }

    /// All artifact ids cited in `text`, in order of appearance.
    #[must_use]
    pub fn extract_artifact_ids(&self, text: &str) -> Vec<String> {
        ARTIFACT_ID_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Render a strict-compliant response listing the given ids.
    #[must_use]
    pub fn format_artifact_response(&self, artifact_ids: &[String], context: Option<&str>) -> String {
        if artifact_ids.is_empty() {
            return "No artifacts".to_string();
        }

        let mut lines = Vec::new();
        if let Some(context) = context {
            lines.push(context.to_string());
        }
        lines.push("Artifacts:".to_string());
        for artifact_id in artifact_ids {
            lines.push(format!("  {artifact_id}"));
        }
        lines.join("\n")
    }
}

impl Default for StrictMode {
    fn default() -> Self {
        Self::new(true)
    }
}
