// Path and text helpers

use std::io::{self, Write};

/// Normalises an uploaded file name into a relative path: backslashes become
/// `/`, `.` segments vanish and `..` pops the previous segment. A `..` with
/// nothing left to pop is dropped, so the result never climbs out of the
/// prefix it is appended to.
pub fn clean_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();

    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Writes an object's content line by line, indented, then a blank line.
pub fn display_text<W: Write>(content: &[u8], out: &mut W) -> io::Result<()> {
    let text = String::from_utf8_lossy(content);
    for line in text.lines() {
        writeln!(out, "    {}", line)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_path_plain_name() {
        assert_eq!(clean_path("report.pdf"), "report.pdf");
    }

    #[test]
    fn test_clean_path_windows_separators() {
        assert_eq!(clean_path("C:\\Users\\me\\notes.txt"), "C:/Users/me/notes.txt");
    }

    #[test]
    fn test_clean_path_resolves_dots() {
        assert_eq!(clean_path("a/./b/../c.txt"), "a/c.txt");
        assert_eq!(clean_path("../../etc/passwd"), "etc/passwd");
        assert_eq!(clean_path("/abs/file"), "abs/file");
    }

    #[test]
    fn test_clean_path_only_dots() {
        assert_eq!(clean_path("./.."), "");
    }

    #[test]
    fn test_display_text_indents_lines() {
        let mut out = Vec::new();
        display_text(b"first\nsecond\r\n", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "    first\n    second\n\n");
    }
}
