//! Greedy size-bounded accumulation of segments into chunk spans.

use super::blocks::{Segment, SegmentKind, scan_segments};

/// Byte span of one chunk inside its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split a section into spans of at most `chunk_size` characters.
///
/// Protected blocks are atomic: a block larger than `chunk_size` becomes a span of its own.
/// Ordinary lines longer than `chunk_size` are cut at whitespace (or hard-cut when none exists).
pub(crate) fn split_section(text: &str, chunk_size: usize) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut buffer: Option<Span> = None;

    for segment in scan_segments(text) {
        let units = match segment.kind {
            SegmentKind::Line if char_len(&text[segment.start..segment.end]) > chunk_size => {
                split_long_line(text, segment, chunk_size)
            }
            _ => vec![Span {
                start: segment.start,
                end: segment.end,
            }],
        };

        for unit in units {
            buffer = Some(match buffer {
                None => unit,
                Some(current) if char_len(&text[current.start..unit.end]) > chunk_size => {
                    spans.push(current);
                    unit
                }
                Some(current) => Span {
                    start: current.start,
                    end: unit.end,
                },
            });
        }
    }

    if let Some(current) = buffer {
        spans.push(current);
    }

    spans
}

/// Cut one long line into pieces of at most `limit` characters, preferring whitespace.
fn split_long_line(text: &str, segment: Segment, limit: usize) -> Vec<Span> {
    let mut pieces = Vec::new();
    let mut cursor = segment.start;

    while cursor < segment.end {
        let rest = &text[cursor..segment.end];
        if char_len(rest) <= limit {
            pieces.push(Span {
                start: cursor,
                end: segment.end,
            });
            break;
        }

        let window_end = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(offset, _)| offset);
        let window = &rest[..window_end];
        let cut = window
            .char_indices()
            .filter(|(offset, c)| *offset > 0 && c.is_whitespace())
            .map(|(offset, _)| offset)
            .last();

        let (piece_end, next) = match cut {
            Some(offset) => (cursor + window[..offset].trim_end().len(), cursor + offset),
            None => (cursor + window_end, cursor + window_end),
        };
        pieces.push(Span {
            start: cursor,
            end: piece_end,
        });

        let remainder = &text[next..segment.end];
        cursor = next + (remainder.len() - remainder.trim_start().len());
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str, chunk_size: usize) -> Vec<&str> {
        split_section(text, chunk_size)
            .into_iter()
            .map(|span| &text[span.start..span.end])
            .collect()
    }

    #[test]
    fn packs_lines_until_limit() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(texts(text, 9), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(texts(text, 100), vec![text]);
    }

    #[test]
    fn keeps_blank_lines_between_packed_lines() {
        let text = "one\n\ntwo";
        assert_eq!(texts(text, 8), vec!["one\n\ntwo"]);
        assert_eq!(texts(text, 7), vec!["one", "two"]);
    }

    #[test]
    fn oversized_block_stands_alone() {
        let text = "before\n```\n0123456789\n0123456789\n```\nafter";
        assert_eq!(
            texts(text, 12),
            vec!["before", "```\n0123456789\n0123456789\n```", "after"]
        );
    }

    #[test]
    fn long_line_breaks_at_whitespace() {
        let pieces = texts("alpha beta gamma delta", 11);
        assert_eq!(pieces, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn long_word_is_hard_cut() {
        let pieces = texts("abcdefghij", 4);
        assert_eq!(pieces, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn respects_multibyte_characters() {
        let pieces = texts("ééééé ééééé", 5);
        assert_eq!(pieces, vec!["ééééé", "ééééé"]);
        for piece in pieces {
            assert!(char_len(piece) <= 5);
        }
    }
}
