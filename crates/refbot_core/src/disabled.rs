use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Markup regions whose contents are not live wiki structure: HTML comments,
/// `<nowiki>`, `<pre>`, `<source>`/`<syntaxhighlight>`, and `<includeonly>`.
/// Unclosed tags are left alone; only complete open/close pairs disable text.
static DISABLED_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<!--.*?-->",
        r"|<nowiki\b[^>]*>.*?</nowiki\s*>",
        r"|<pre\b[^>]*>.*?</pre\s*>",
        r"|<source\b[^>]*>.*?</source\s*>",
        r"|<syntaxhighlight\b[^>]*>.*?</syntaxhighlight\s*>",
        r"|<includeonly\b[^>]*>.*?</includeonly\s*>",
    ))
    .expect("disabled-part pattern")
});

/// Byte spans of disabled markup, computed once per document and consulted
/// at every candidate match location during placement scans.
#[derive(Debug, Clone, Default)]
pub struct DisabledRegions {
    spans: Vec<Range<usize>>,
}

impl DisabledRegions {
    pub fn compute(text: &str) -> Self {
        let spans = DISABLED_PART
            .find_iter(text)
            .map(|found| found.start()..found.end())
            .collect();
        Self { spans }
    }

    /// Whether the given byte offset falls inside a disabled region.
    pub fn contains(&self, offset: usize) -> bool {
        // Spans are non-overlapping and ordered by start offset.
        let candidate = self
            .spans
            .partition_point(|span| span.start <= offset)
            .checked_sub(1);
        match candidate {
            Some(position) => offset < self.spans[position].end,
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }
}

/// Return the text with every disabled region removed, for classification
/// passes that must not see commented-out markers.
pub fn remove_disabled_parts(text: &str) -> String {
    DISABLED_PART.replace_all(text, "").into_owned()
}
