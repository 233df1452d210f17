//! Text-level rewrites applied before reading a BCMH score
//!
//! Two rewrites make the corpus readable as plain **kern with lyrics:
//! - Dorian key designations (`*d:dor`) collapse to bare minor/major keys,
//!   since Roman numerals cannot be spelled against a Dorian tonic.
//! - The `**harm` spine is relabeled `**text` and given a `*staff` mapping
//!   covering every melodic spine, so each harmony token is attached to the
//!   notes sounding with it as lyric text.
//!
//! The rewrite is a single forward pass producing a new line sequence.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{ConversionError, Result};

pub const HARM_SPINE: &str = "**harm";
pub const TEXT_SPINE: &str = "**text";
pub const KERN_SPINE: &str = "**kern";

/// Staff mapping of the relabeled harmony spine: attached to staffs 1 to 4
const HARMONY_STAFFS: &str = "*staff1/2/3/4";

lazy_static! {
    static ref DORIAN_KEY: Regex =
        Regex::new(r"\*([A-Ga-g#-]):dor(\t?)").expect("Dorian key pattern should compile");
}

/// Drop the `dor` mode suffix from every key designation on the line
pub fn strip_dorian(line: &str) -> String {
    DORIAN_KEY.replace_all(line, "*${1}:${2}").into_owned()
}

/// `*staff` declaration for a harmony spine followed by `kern_spines` melodic spines
pub fn staff_declaration(kern_spines: usize) -> String {
    let mut line = String::from(HARMONY_STAFFS);
    for staff in 1..=kern_spines {
        line.push_str(&format!("\t*staff{}", staff));
    }
    line
}

/// Rewrite a whole score text
pub fn preprocess(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let collapsed = strip_dorian(line);
        if collapsed != line {
            log::debug!("line {}: collapsed Dorian key {:?} -> {:?}", index + 1, line, collapsed);
            lines.push(collapsed);
        } else if line.starts_with(HARM_SPINE) {
            let kern_spines = line.matches(KERN_SPINE).count();
            log::debug!(
                "line {}: relabeled {} as {} over {} kern spines",
                index + 1,
                HARM_SPINE,
                TEXT_SPINE,
                kern_spines
            );
            lines.push(line.replace(HARM_SPINE, TEXT_SPINE));
            lines.push(staff_declaration(kern_spines));
        } else {
            lines.push(line.to_string());
        }
    }

    let mut result = lines.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Read and rewrite a score file
pub fn preprocess_file(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path).map_err(|e| ConversionError::io(path, e))?;
    Ok(preprocess(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_dorian_major_designator() {
        assert_eq!(strip_dorian("*D:dor"), "*D:");
    }

    #[test]
    fn test_strip_dorian_keeps_tab() {
        assert_eq!(strip_dorian("*d:dor\t"), "*d:\t");
    }

    #[test]
    fn test_strip_dorian_all_spines() {
        assert_eq!(strip_dorian("*g:dor\t*g:dor\t*g:dor"), "*g:\t*g:\t*g:");
    }

    #[test]
    fn test_strip_dorian_accidentals() {
        assert_eq!(strip_dorian("*f#:dor"), "*f#:");
        assert_eq!(strip_dorian("*B-:dor"), "*B-:");
    }

    #[test]
    fn test_lines_without_dorian_unchanged() {
        for line in ["*d:", "*D:mix", "4d\t4f", "*M4/4", "!!!COM: Bach, Johann Sebastian"] {
            assert_eq!(strip_dorian(line), line);
        }
    }

    #[test]
    fn test_harmony_spine_rewrite_four_voices() {
        let text = "**harm\t**kern\t**kern\t**kern\t**kern\n4I\t4C\t4c\t4e\t4g\n";
        let result = preprocess(text);
        let lines: Vec<&str> = result.lines().collect();

        assert_eq!(lines[0], "**text\t**kern\t**kern\t**kern\t**kern");
        assert_eq!(lines[1], "*staff1/2/3/4\t*staff1\t*staff2\t*staff3\t*staff4");
        assert_eq!(lines[2], "4I\t4C\t4c\t4e\t4g");
        assert_eq!(lines[1].matches("*staff").count(), 5);
        assert!(!result.contains(HARM_SPINE));
    }

    #[test]
    fn test_harmony_spine_without_kern_spines() {
        assert_eq!(preprocess("**harm\n"), "**text\n*staff1/2/3/4\n");
    }

    #[test]
    fn test_other_lines_pass_through() {
        let text = "!!!COM: Bach\n**kern\n*M3/4\n=1\n4c\n*-";
        assert_eq!(preprocess(text), text);
    }

    #[test]
    fn test_duplicate_lines_rewritten_independently() {
        let text = "*d:dor\t*d:dor\n4d\t4f\n*d:dor\t*d:dor\n";
        assert_eq!(preprocess(text), "*d:\t*d:\n4d\t4f\n*d:\t*d:\n");
    }

    #[test]
    fn test_preprocess_file_missing() {
        let err = preprocess_file(Path::new("/nonexistent/chor000.krn")).unwrap_err();
        assert!(matches!(err, ConversionError::Io { .. }));
    }
}
