//! Deterministic cleanup of model-generated Markdown.
//!
//! Models occasionally wrap the whole answer in ` ```markdown ` fences,
//! emit CRLF line endings, or mangle GFM table separators. These passes
//! repair structure without touching content, and they run on the full
//! concatenated response before it is written to disk.
//!
//! Local image links (`![...](image_3.png)`) are left strictly alone:
//! the reconciliation pass afterwards keys file deletion off exactly the
//! links that survive here.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup pass, in order.
///
/// Order matters: fences are stripped before line-ending normalisation so
/// the fence regex sees the raw shape, heading spacing runs on already
/// trimmed lines, and the final-newline pass runs last.
pub fn clean_markdown(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = normalise_heading_spacing(&s);
    let s = fix_broken_tables(&s);
    let s = remove_mid_table_separators(&s);
    let s = remove_invisible_chars(&s);
    ensure_final_newline(&s)
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown)?\r?\n(.*)\r?\n```\s*$").unwrap());

/// Unwrap a response the model fenced despite instructions not to.
fn strip_outer_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Allow at most one blank line between blocks.
fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

fn ensure_final_newline(input: &str) -> String {
    let mut out = input.trim_end().to_string();
    out.push('\n');
    out
}

/// Insert a blank line before each heading that lacks one.
fn normalise_heading_spacing(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 64);
    for line in input.lines() {
        if line.starts_with('#') && !out.is_empty() {
            while out.ends_with('\n') {
                out.pop();
            }
            out.push_str("\n\n");
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Insert a missing separator row after a table header.
///
/// GFM requires `| --- |` as the second row of every table; models
/// sometimes skip it, which turns the whole table into plain text.
fn fix_broken_tables(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut result = Vec::with_capacity(lines.len() + 8);
    let mut prev_was_table = false;

    for (i, line) in lines.iter().enumerate() {
        if is_table_row(line) && !is_separator_row(line) && !prev_was_table {
            result.push(line.to_string());
            let next = lines.get(i + 1).copied().unwrap_or("");
            if is_table_row(next) && !is_separator_row(next) {
                let cols = line.matches('|').count().saturating_sub(1).max(1);
                let mut sep = String::from("|");
                for _ in 0..cols {
                    sep.push_str(" --- |");
                }
                result.push(sep);
            }
            prev_was_table = true;
            continue;
        }

        prev_was_table = is_table_row(line);
        result.push(line.to_string());
    }

    result.join("\n")
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() > 2 && t.starts_with('|') && t.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    t.starts_with('|') && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Drop separator rows that appear anywhere other than row two of a table.
fn remove_mid_table_separators(input: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut row_in_table = 0usize;

    for line in input.lines() {
        if is_table_row(line) {
            row_in_table += 1;
            if is_separator_row(line) && row_in_table != 2 {
                continue;
            }
        } else {
            row_in_table = 0;
        }
        kept.push(line);
    }

    kept.join("\n")
}

const INVISIBLE_CHARS: [char; 6] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{00AD}', '\u{FEFF}',
];

/// Strip zero-width and other invisible code points that leak from OCR.
fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_outer_fences() {
        assert_eq!(
            strip_outer_fences("```markdown\n# Hello\nWorld\n```"),
            "# Hello\nWorld"
        );
        assert_eq!(
            strip_outer_fences("```\n# Hello\nWorld\n```"),
            "# Hello\nWorld"
        );
        assert_eq!(strip_outer_fences("# Hello\nWorld"), "# Hello\nWorld");
    }

    #[test]
    fn inner_fences_survive() {
        let input = "text\n```rust\nfn main() {}\n```\nmore";
        assert_eq!(strip_outer_fences(input), input);
    }

    #[test]
    fn normalises_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn trims_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  hello   \nworld  "),
            "  hello\nworld"
        );
    }

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn ensures_final_newline() {
        assert_eq!(ensure_final_newline("hello"), "hello\n");
        assert_eq!(ensure_final_newline("hello\n\n\n"), "hello\n");
        assert_eq!(ensure_final_newline(""), "\n");
    }

    #[test]
    fn blank_line_before_heading() {
        let result = normalise_heading_spacing("some text\n# Heading\nmore text");
        assert!(result.contains("\n\n# Heading\n"));
    }

    #[test]
    fn inserts_missing_table_separator() {
        let result = fix_broken_tables("| A | B |\n| 1 | 2 |");
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(is_separator_row(lines[1]));
    }

    #[test]
    fn well_formed_table_unchanged() {
        let input = "| A | B |\n| --- | --- |\n| 1 | 2 |";
        assert_eq!(fix_broken_tables(input), input);
    }

    #[test]
    fn drops_mid_table_separator() {
        let input = "| A | B |\n| --- | --- |\n| 1 | 2 |\n| --- | --- |\n| 3 | 4 |";
        let result = remove_mid_table_separators(input);
        let sep_count = result.lines().filter(|l| is_separator_row(l)).count();
        assert_eq!(sep_count, 1);
        assert!(result.contains("| 3 | 4 |"));
    }

    #[test]
    fn removes_invisible_chars() {
        assert_eq!(
            remove_invisible_chars("hello\u{200B}world\u{FEFF}foo\u{00AD}bar"),
            "helloworldfoobar"
        );
    }

    #[test]
    fn local_image_links_untouched() {
        let input = "Intro\n\n![diagram](image_1.png)\n\n![scan](image_2.jpg)\n";
        let result = clean_markdown(input);
        assert!(result.contains("![diagram](image_1.png)"));
        assert!(result.contains("![scan](image_2.jpg)"));
    }

    #[test]
    fn full_pipeline() {
        let input =
            "```markdown\n# Title\r\n\r\nSome text   \n\n\n\n\n\n## Section\n\n| A | B |\n| 1 | 2 |\n```";
        let result = clean_markdown(input);
        assert!(result.starts_with("# Title"));
        assert!(result.ends_with('\n'));
        assert!(!result.contains("\n\n\n"));
        assert!(result.contains("| --- |"));
    }
}
