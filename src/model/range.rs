use std::path::PathBuf;

use serde::Serialize;

/// A span in an origin file, in 1-based lines. Every block and attribute in
/// the model carries one so findings can point at real source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Range {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

impl Range {
    pub fn new(file: impl Into<PathBuf>, start_line: usize, end_line: usize) -> Self {
        Self {
            file: file.into(),
            start_line,
            end_line,
        }
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.file.display(), self.start_line)
        } else {
            write!(
                f,
                "{}:{}-{}",
                self.file.display(),
                self.start_line,
                self.end_line
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_display() {
        let range = Range::new("main.tf", 4, 4);
        assert_eq!(range.to_string(), "main.tf:4");
    }

    #[test]
    fn multi_line_display() {
        let range = Range::new("main.tf", 4, 9);
        assert_eq!(range.to_string(), "main.tf:4-9");
    }
}
