//! Line normalizer
//!
//! Single forward pass over a line-oriented byte stream that produces the
//! canonical form of a text file:
//! - trailing spaces and tabs are stripped from every line
//! - interior runs of blank lines are kept with their exact length
//! - leading and trailing blank lines are dropped
//! - non-empty output ends with exactly one `\n`
//!
//! Working memory is bounded by the longest line; the input is never loaded
//! whole.

use std::io::{self, BufRead, BufWriter, Write};

/// Strip trailing space and tab bytes. Leading and interior whitespace stays.
pub fn trim_trailing_blanks(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b' ' && b != b'\t')
        .map(|i| i + 1)
        .unwrap_or(0);
    &line[..end]
}

/// Normalize `input` into `output`.
///
/// Returns `true` if the canonical form differs from the input. The output
/// is flushed before returning, even when nothing changed, so callers can
/// decide afterwards whether to keep it.
pub fn normalize<R: BufRead, W: Write>(mut input: R, output: W) -> io::Result<bool> {
    let mut writer = BufWriter::new(output);
    let mut line = Vec::new();

    let mut changed = false;
    let mut pending_blanks = 0usize;
    let mut has_content = false;
    let mut ends_with_newline = false;

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        ends_with_newline = line.last() == Some(&b'\n');
        if ends_with_newline {
            line.pop();
        }

        let stripped = trim_trailing_blanks(&line);
        if stripped.len() != line.len() {
            changed = true;
        }

        if stripped.is_empty() {
            pending_blanks += 1;
            continue;
        }

        if has_content {
            // Terminate the previous content line, then replay the blank run.
            for _ in 0..=pending_blanks {
                writer.write_all(b"\n")?;
            }
        } else if pending_blanks > 0 {
            // Leading blank lines are dropped.
            changed = true;
        }
        pending_blanks = 0;
        has_content = true;
        writer.write_all(stripped)?;
    }

    if pending_blanks > 0 {
        changed = true;
    }

    if has_content {
        if !ends_with_newline {
            changed = true;
        }
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(changed)
}

/// Normalize an in-memory buffer.
#[cfg(test)]
pub fn normalize_bytes(input: &[u8]) -> (Vec<u8>, bool) {
    let mut out = Vec::new();
    let changed = normalize(input, &mut out).expect("in-memory io cannot fail");
    (out, changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(input: &str, expected: &str, expected_changed: bool) {
        let (out, changed) = normalize_bytes(input.as_bytes());
        assert_eq!(String::from_utf8(out).unwrap(), expected, "input: {:?}", input);
        assert_eq!(changed, expected_changed, "input: {:?}", input);
    }

    #[test]
    fn test_trim_trailing_blanks() {
        assert_eq!(trim_trailing_blanks(b"abc \t "), b"abc");
        assert_eq!(trim_trailing_blanks(b"  abc"), b"  abc");
        assert_eq!(trim_trailing_blanks(b"a b\tc"), b"a b\tc");
        assert_eq!(trim_trailing_blanks(b" \t "), b"");
        assert_eq!(trim_trailing_blanks(b""), b"");
    }

    #[test]
    fn test_trim_keeps_carriage_return() {
        assert_eq!(trim_trailing_blanks(b"abc \r"), b"abc \r");
    }

    #[test]
    fn test_canonical_input_unchanged() {
        check("hello world\n", "hello world\n", false);
    }

    #[test]
    fn test_trailing_spaces_removed() {
        check("hello world   \n", "hello world\n", true);
    }

    #[test]
    fn test_trailing_tabs_removed() {
        check("hello world\t\t\n", "hello world\n", true);
    }

    #[test]
    fn test_mixed_trailing_whitespace() {
        check("hello world \t \n", "hello world\n", true);
    }

    #[test]
    fn test_leading_whitespace_preserved() {
        check(
            "  line with spaces   \nsecond line\t\nthird line",
            "  line with spaces\nsecond line\nthird line\n",
            true,
        );
    }

    #[test]
    fn test_interior_blank_runs_preserved() {
        check("line1\n\n\nline2\n", "line1\n\n\nline2\n", false);
        check(
            "start\n\n\nmiddle\n\n\nend\n",
            "start\n\n\nmiddle\n\n\nend\n",
            false,
        );
    }

    #[test]
    fn test_whitespace_only_interior_lines_become_blank() {
        check("a\n  \t\nb\n", "a\n\nb\n", true);
    }

    #[test]
    fn test_trailing_blank_lines_removed() {
        check("content\n\n\n", "content\n", true);
        check("content\n   \n\t\n", "content\n", true);
    }

    #[test]
    fn test_empty_input() {
        check("", "", false);
    }

    #[test]
    fn test_only_blank_lines() {
        check("\n\n\n", "", true);
        check("   ", "", true);
    }

    #[test]
    fn test_missing_final_newline_is_a_change() {
        check("content", "content\n", true);
    }

    // Policy: blank lines before the first content line are dropped rather
    // than kept as an interior run.
    #[test]
    fn test_leading_blank_lines_dropped() {
        check("\n\nfirst\nsecond\n", "first\nsecond\n", true);
    }

    #[test]
    fn test_crlf_content_untouched() {
        check("a\r\nb\r\n", "a\r\nb\r\n", false);
    }

    #[test]
    fn test_non_utf8_bytes_pass_through() {
        let input = b"caf\xe9  \n\xff\xfe\n";
        let (out, changed) = normalize_bytes(input);
        assert_eq!(out, b"caf\xe9\n\xff\xfe\n");
        assert!(changed);
    }

    #[test]
    fn test_second_pass_is_stable() {
        let inputs = [
            "  a  \n\n\n b\t\n\n",
            "\n\nx",
            "x\n\n\n\n",
            "a\n \n \nb \n",
            "",
            "\t\n",
        ];
        for input in inputs {
            let (first, _) = normalize_bytes(input.as_bytes());
            let (second, changed) = normalize_bytes(&first);
            assert_eq!(first, second, "input: {:?}", input);
            assert!(!changed, "input: {:?}", input);
        }
    }

    #[test]
    fn test_output_has_no_trailing_blanks_and_one_final_newline() {
        let input = "a \n\tb\t\n\n\nc  \n \n\n";
        let (out, _) = normalize_bytes(input.as_bytes());
        let text = String::from_utf8(out).unwrap();
        for line in text.lines() {
            assert!(!line.ends_with(' ') && !line.ends_with('\t'));
        }
        assert!(text.ends_with('\n'));
        assert!(!text.ends_with("\n\n"));
        assert_eq!(text, "a\n\tb\n\n\nc\n");
    }

    #[test]
    fn test_long_line_streams() {
        let long = "x".repeat(200_000);
        let input = format!("{}   \n", long);
        let (out, changed) = normalize_bytes(input.as_bytes());
        assert_eq!(out.len(), long.len() + 1);
        assert!(changed);
    }
}
