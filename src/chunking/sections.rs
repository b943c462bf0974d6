//! Frontmatter extraction and heading-based section splitting.

use regex::Regex;
use std::sync::LazyLock;

const FRONTMATTER_DELIMITER: &str = "---";

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6}) (.*)$").expect("heading pattern is valid"));

/// A heading-delimited slice of the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Section<'a> {
    /// Heading text that opens the section; empty for the leading untitled section.
    pub(crate) title: String,
    /// Section body including its own heading line, trimmed of surrounding whitespace.
    pub(crate) text: &'a str,
}

/// Parse a heading line into its level and trimmed title.
pub(crate) fn parse_heading(line: &str) -> Option<(u8, String)> {
    let line = line.trim_end_matches('\r');
    let captures = HEADING.captures(line)?;
    let level = captures.get(1).map_or(0, |m| m.len()) as u8;
    let title = captures.get(2).map_or("", |m| m.as_str()).trim().to_string();
    Some((level, title))
}

/// Whether the line opens or closes a fenced code block.
pub(crate) fn is_code_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Split a leading `---` delimited frontmatter block from the body.
///
/// Returns `(None, text)` unchanged when the first line is not exactly `---` or no closing
/// delimiter line exists.
pub(crate) fn split_frontmatter(text: &str) -> (Option<String>, &str) {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end_matches(['\r', '\n']) != FRONTMATTER_DELIMITER {
        return (None, text);
    }

    let body_start = first.len();
    let mut offset = body_start;
    for line in lines {
        if line.trim_end_matches(['\r', '\n']) == FRONTMATTER_DELIMITER {
            let frontmatter = text[body_start..offset].trim().to_string();
            let rest = &text[offset + line.len()..];
            return (Some(frontmatter), rest);
        }
        offset += line.len();
    }

    (None, text)
}

/// Split a body into sections at heading lines outside of code fences.
///
/// Text preceding the first heading forms an untitled section. Sections that are blank after
/// trimming are dropped.
pub(crate) fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current_title = String::new();
    let mut current_start = 0;
    let mut offset = 0;
    let mut in_fence = false;

    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches('\n');
        if is_code_fence(bare) {
            in_fence = !in_fence;
        } else if !in_fence {
            if let Some((_, title)) = parse_heading(bare) {
                push_section(&mut sections, &current_title, &text[current_start..offset]);
                current_title = title;
                current_start = offset;
            }
        }
        offset += line.len();
    }
    push_section(&mut sections, &current_title, &text[current_start..]);

    sections
}

/// Treat the whole body as one untitled section.
pub(crate) fn single_section(text: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    push_section(&mut sections, "", text);
    sections
}

fn push_section<'a>(sections: &mut Vec<Section<'a>>, title: &str, text: &'a str) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    sections.push(Section {
        title: title.to_string(),
        text: trimmed,
    });
}
