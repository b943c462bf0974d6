//! Content inspection that derives structural flags for a chunk.

use super::{
    blocks::{is_table_row, is_table_separator},
    sections::{is_code_fence, parse_heading},
    types::{ChunkMetadata, ContentType},
};

/// Build metadata for a chunk's own (undecorated) text.
pub(crate) fn inspect(content: &str, section_title: &str, section_index: usize) -> ChunkMetadata {
    let (heading_path, heading_levels) = headings_in(content);

    let has_table = content
        .lines()
        .any(|line| is_table_row(line) && !is_table_separator(line))
        && content.lines().any(is_table_separator);
    let has_image = content.contains("![") || content.contains("[Image:");
    let has_code = content.contains("```");

    let content_type = if has_table {
        ContentType::Table
    } else if has_code {
        ContentType::Code
    } else if has_image {
        ContentType::Image
    } else {
        ContentType::Text
    };

    ChunkMetadata {
        section_title: section_title.to_string(),
        section_index,
        heading_path,
        heading_levels,
        has_table,
        has_image,
        has_code,
        content_type,
    }
}

fn headings_in(content: &str) -> (Vec<String>, Vec<u8>) {
    let mut titles = Vec::new();
    let mut levels = Vec::new();
    let mut in_fence = false;

    for line in content.lines() {
        if is_code_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some((level, title)) = parse_heading(line) {
            titles.push(title);
            levels.push(level);
        }
    }

    (titles, levels)
}
