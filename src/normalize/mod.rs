//! Content normalizer
//!
//! A deterministic, I/O-free cleaning pass applied to extracted body text
//! before it reaches the sink. Two cuts compose:
//!
//! 1. An optional leading cut that drops a site-chrome header block: if the
//!    configured header-end marker appears within the first N lines, every
//!    line up to and including it is removed.
//! 2. A trailing cut that truncates at the first line containing a stop
//!    marker, provided the line is short enough to be a navigational label
//!    rather than body prose.

/// Rules controlling the cleaning pass, derived from target configuration.
#[derive(Debug, Clone)]
pub struct CleanRules {
    /// Markers whose presence on a short line truncates everything from
    /// that line onward ("related articles", byline footers, tag blocks).
    pub stop_markers: Vec<String>,

    /// A line containing a stop marker only triggers truncation when its
    /// trimmed character count is below this bound. The markers are short
    /// navigational labels that can also occur inside long legitimate
    /// paragraphs, which must survive.
    pub marker_line_max_len: usize,

    /// Marker for the last line of a leading header block, if the target
    /// has one.
    pub header_end_marker: Option<String>,

    /// How many lines from the top to search for the header-end marker.
    pub header_scan_lines: usize,
}

impl CleanRules {
    /// Rules with the observed defaults and no markers: a pass-through.
    pub fn passthrough() -> Self {
        Self {
            stop_markers: Vec::new(),
            marker_line_max_len: 100,
            header_end_marker: None,
            header_scan_lines: 30,
        }
    }
}

impl Default for CleanRules {
    fn default() -> Self {
        Self::passthrough()
    }
}

/// Cleans raw extracted body text according to the given rules.
///
/// Pure and deterministic: empty input yields empty output, and with no
/// stop markers and no header marker the output equals the input.
pub fn clean_content(raw: &str, rules: &CleanRules) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let lines: Vec<&str> = raw.split('\n').collect();

    // Leading cut first, trailing cut on what remains.
    let start = header_end(&lines, rules);
    let body = &lines[start..];

    let end = body
        .iter()
        .position(|line| is_stop_line(line, rules))
        .unwrap_or(body.len());

    body[..end].join("\n")
}

/// Index of the first line after the header block, or 0 when no header-end
/// marker is configured or found within the scan window.
fn header_end(lines: &[&str], rules: &CleanRules) -> usize {
    let Some(marker) = &rules.header_end_marker else {
        return 0;
    };

    lines
        .iter()
        .take(rules.header_scan_lines)
        .position(|line| line.contains(marker.as_str()))
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

fn is_stop_line(line: &str, rules: &CleanRules) -> bool {
    if line.trim().chars().count() >= rules.marker_line_max_len {
        return false;
    }
    rules
        .stop_markers
        .iter()
        .any(|marker| line.contains(marker.as_str()))
}
