//! The mutable working buffer of one compilation

use redeye_common::SourceLocation;

/// One line of the working buffer together with its line number in the input
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub text: String,
    pub number: u32,
}

/// Ordered lines of the input file; declarations are cut out of it in place
#[derive(Debug, Clone)]
pub struct SourceFile {
    filename: String,
    lines: Vec<SourceLine>,
}

impl SourceFile {
    pub fn parse(input: &str, filename: &str) -> Self {
        let lines = input
            .lines()
            .enumerate()
            .map(|(index, text)| SourceLine {
                text: text.to_string(),
                number: index as u32 + 1,
            })
            .collect();

        Self {
            filename: filename.to_string(),
            lines,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Location of the first column of the line currently at `index`
    pub fn location(&self, index: usize) -> SourceLocation {
        let number = self.lines.get(index).map(|line| line.number).unwrap_or(0);
        SourceLocation::line_start(&self.filename, number)
    }

    /// Remove `start..=end` from the buffer and hand the lines over
    pub fn take_span(&mut self, start: usize, end: usize) -> Vec<SourceLine> {
        self.lines.drain(start..=end).collect()
    }

    pub fn insert(&mut self, index: usize, line: SourceLine) {
        self.lines.insert(index, line);
    }

    /// Remaining lines followed by the generated declarations, one blank line apart
    pub fn render(&self, generated: &[String]) -> String {
        let mut output = String::new();
        for line in &self.lines {
            output.push_str(&line.text);
            output.push('\n');
        }
        for declaration in generated {
            output.push('\n');
            output.push_str(declaration);
        }
        output
    }
}
