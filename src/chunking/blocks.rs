//! Line scanning that groups code fences and tables into atomic segments.

use super::sections::is_code_fence;

/// Kind of region that must never be split across chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Code,
    Table,
}

/// What a segment holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// One ordinary, non-blank line.
    Line,
    /// A whole protected block spanning one or more lines.
    Protected(BlockKind),
}

/// Byte span inside a section, trimmed of surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    pub(crate) kind: SegmentKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// A table row starts and ends with a pipe.
pub(crate) fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

/// A table separator row such as `|---|:---:|`.
pub(crate) fn is_table_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|')
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

/// Split section text into ordered segments.
///
/// Blank lines produce no segment; the gaps they leave are covered again when adjacent segments
/// are merged into one chunk. A code fence without a closing line runs to the end of the section.
pub(crate) fn scan_segments(text: &str) -> Vec<Segment> {
    let lines = line_spans(text);
    let mut segments = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let (start, end) = lines[i];
        let line = &text[start..end];

        if is_code_fence(line) {
            let mut last = i;
            let mut j = i + 1;
            while j < lines.len() {
                last = j;
                let (s, e) = lines[j];
                if is_code_fence(&text[s..e]) {
                    break;
                }
                j += 1;
            }
            segments.push(trimmed_segment(
                text,
                SegmentKind::Protected(BlockKind::Code),
                start,
                lines[last].1,
            ));
            i = last + 1;
            continue;
        }

        if is_table_row(line) {
            let mut last = i;
            while last + 1 < lines.len() {
                let (s, e) = lines[last + 1];
                if !is_table_row(&text[s..e]) {
                    break;
                }
                last += 1;
            }
            segments.push(trimmed_segment(
                text,
                SegmentKind::Protected(BlockKind::Table),
                start,
                lines[last].1,
            ));
            i = last + 1;
            continue;
        }

        if !line.trim().is_empty() {
            segments.push(trimmed_segment(text, SegmentKind::Line, start, end));
        }
        i += 1;
    }

    segments
}

/// Byte ranges of each line, excluding the line terminator.
fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        spans.push((offset, offset + bare.len()));
        offset += line.len();
    }
    spans
}

fn trimmed_segment(text: &str, kind: SegmentKind, start: usize, end: usize) -> Segment {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trailing = slice.len() - slice.trim_end().len();
    Segment {
        kind,
        start: start + leading,
        end: end - trailing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(SegmentKind, &str)> {
        scan_segments(text)
            .into_iter()
            .map(|segment| (segment.kind, &text[segment.start..segment.end]))
            .collect()
    }

    #[test]
    fn groups_code_fence_into_one_segment() {
        let text = "intro\n```rust\nfn main() {}\n\n```\noutro";
        assert_eq!(
            kinds(text),
            vec![
                (SegmentKind::Line, "intro"),
                (
                    SegmentKind::Protected(BlockKind::Code),
                    "```rust\nfn main() {}\n\n```"
                ),
                (SegmentKind::Line, "outro"),
            ]
        );
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let text = "```\ncode\nmore";
        assert_eq!(
            kinds(text),
            vec![(SegmentKind::Protected(BlockKind::Code), "```\ncode\nmore")]
        );
    }

    #[test]
    fn groups_table_rows() {
        let text = "| a | b |\n|---|---|\n| 1 | 2 |\nafter";
        assert_eq!(
            kinds(text),
            vec![
                (
                    SegmentKind::Protected(BlockKind::Table),
                    "| a | b |\n|---|---|\n| 1 | 2 |"
                ),
                (SegmentKind::Line, "after"),
            ]
        );
    }

    #[test]
    fn skips_blank_lines() {
        assert_eq!(
            kinds("one\n\n   \ntwo"),
            vec![(SegmentKind::Line, "one"), (SegmentKind::Line, "two")]
        );
    }

    #[test]
    fn recognizes_separator_rows() {
        assert!(is_table_separator("|---|:---:|"));
        assert!(is_table_separator("| --- | --- |"));
        assert!(!is_table_separator("| a | b |"));
        assert!(!is_table_separator("---"));
    }
}
