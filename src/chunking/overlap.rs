//! Post-processing passes: overlap prefixes and boundary markers.

use super::types::Chunk;

const OVERLAP_PREFIX: &str = "[...] ";
const BREAK_PREFERENCE: [&str; 3] = ["\n\n", ". ", "\n"];

/// Prefix every chunk after the first with trailing context from its predecessor.
///
/// Context is always taken from the predecessor's undecorated content, so prefixes never nest.
/// Offsets are left untouched.
pub(crate) fn apply_overlap(chunks: &mut [Chunk], overlap: usize) {
    if overlap == 0 || chunks.len() < 2 {
        return;
    }

    let originals: Vec<String> = chunks.iter().map(|chunk| chunk.content.clone()).collect();
    for (chunk, previous) in chunks.iter_mut().skip(1).zip(originals.iter()) {
        if let Some(context) = overlap_context(previous, overlap) {
            chunk.content = format!("{OVERLAP_PREFIX}{context}\n\n{}", chunk.content);
        }
    }
}

/// Append `<!-- chunk_boundary: N -->` to every chunk.
pub(crate) fn append_markers(chunks: &mut [Chunk]) {
    for chunk in chunks {
        chunk.content = format!("{}\n\n<!-- chunk_boundary: {} -->", chunk.content, chunk.index);
    }
}

/// Last `overlap` characters of `previous`, trimmed forward to the first natural break.
///
/// Returns `None` when nothing but whitespace survives the trim.
fn overlap_context(previous: &str, overlap: usize) -> Option<&str> {
    let total = previous.chars().count();
    let skip = total.saturating_sub(overlap);
    let tail_start = previous
        .char_indices()
        .nth(skip)
        .map_or(previous.len(), |(offset, _)| offset);
    let mut tail = &previous[tail_start..];

    for separator in BREAK_PREFERENCE {
        if let Some(position) = tail.find(separator) {
            tail = &tail[position + separator.len()..];
            break;
        }
    }

    let trimmed = tail.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::metadata::inspect;

    fn chunk(index: usize, content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            index,
            start_char: 0,
            end_char: content.chars().count(),
            metadata: inspect(content, "", 0),
        }
    }

    #[test]
    fn break_at_tail_start_is_taken() {
        assert_eq!(overlap_context("abc\n\ndef", 5), Some("def"));
    }

    #[test]
    fn prefers_paragraph_break() {
        let context = overlap_context("first para.\n\nsecond para. tail", 40);
        assert_eq!(context, Some("second para. tail"));
    }

    #[test]
    fn falls_back_to_sentence_then_line() {
        assert_eq!(
            overlap_context("one sentence. another one", 100),
            Some("another one")
        );
        assert_eq!(overlap_context("line one\nline two", 100), Some("line two"));
    }

    #[test]
    fn keeps_whole_tail_without_breaks() {
        assert_eq!(overlap_context("abcdefghij", 4), Some("ghij"));
    }

    #[test]
    fn blank_remainder_yields_nothing() {
        assert_eq!(overlap_context("ends here. ", 100), None);
    }

    #[test]
    fn decorates_from_undecorated_predecessor() {
        let mut chunks = vec![chunk(0, "alpha"), chunk(1, "beta"), chunk(2, "gamma")];
        apply_overlap(&mut chunks, 10);
        assert_eq!(chunks[0].content, "alpha");
        assert_eq!(chunks[1].content, "[...] alpha\n\nbeta");
        assert_eq!(chunks[2].content, "[...] beta\n\ngamma");
        assert_eq!(chunks[2].start_char, 0);
        assert_eq!(chunks[2].end_char, 5);
    }

    #[test]
    fn markers_use_chunk_index() {
        let mut chunks = vec![chunk(0, "a"), chunk(1, "b")];
        append_markers(&mut chunks);
        assert_eq!(chunks[0].content, "a\n\n<!-- chunk_boundary: 0 -->");
        assert_eq!(chunks[1].content, "b\n\n<!-- chunk_boundary: 1 -->");
    }
}
