//! The normalized record shared by all collectors.

/// Items whose normalized fingerprint is shorter than this are discarded
/// before entering the pipeline — a bare keyword echo or an empty search
/// result carries no briefing value.
pub const MIN_FINGERPRINT_LEN: usize = 12;

/// One unit of collected market news.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Collector/channel that produced this item (query keyword, feed name).
    pub source_tag: String,
    pub title: String,
    /// May be truncated by the collector.
    pub body: String,
    /// Source-provided time; opaque string when no structured time exists.
    pub timestamp: Option<String>,
}

impl Item {
    pub fn new(
        source_tag: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            source_tag: source_tag.into(),
            title: title.into(),
            body: body.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// The canonical string used to test item equality across runs.
    ///
    /// Whitespace-normalized concatenation of `source_tag`, `title` and
    /// `body`, so re-collecting an unchanged item yields a byte-identical
    /// fingerprint regardless of incidental whitespace. The timestamp is
    /// excluded: sources re-stamp unchanged items and that must not make
    /// them look novel.
    pub fn fingerprint(&self) -> String {
        format!(
            "{} | {} | {}",
            normalize_ws(&self.source_tag),
            normalize_ws(&self.title),
            normalize_ws(&self.body),
        )
    }

    /// Whether this item is substantial enough to enter the pipeline.
    pub fn is_substantial(&self) -> bool {
        self.fingerprint().len() >= MIN_FINGERPRINT_LEN
    }

    /// One line of prompt input: `- {title}: {body}`.
    pub fn prompt_line(&self) -> String {
        format!("- {}: {}", self.title.trim(), self.body.trim())
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
