//! Whitespace rules for spliced code.

use jtemplate_parser::ast::Space;

/// Formatting used when the surrounding code gives no indentation to copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatOptions {
    /// One level of indentation.
    pub indent: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
        }
    }
}

impl FormatOptions {
    pub fn with_indent(indent: impl Into<String>) -> Self {
        Self { indent: indent.into() }
    }

    /// Prefix of a statement on its own line at `base` plus one level.
    pub fn nested_line(&self, base: &str) -> Space {
        Space::new(format!("\n{base}{}", self.indent))
    }
}

/// Prefix of a new line indented like `space`, or `fallback` when `space`
/// stays on its line.
pub(crate) fn line_like(space: &Space, fallback: Space) -> Space {
    match space.indent() {
        Some(indent) => Space::new(format!("\n{indent}")),
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_lines() {
        let options = FormatOptions::default();
        assert_eq!(options.nested_line("  ").as_str(), "\n      ");
        assert_eq!(FormatOptions::with_indent("\t").nested_line("").as_str(), "\n\t");
    }

    #[test]
    fn lines_copy_the_indentation_of_a_sibling() {
        assert_eq!(line_like(&Space::new("\n\n    "), Space::single()).as_str(), "\n    ");
        assert_eq!(line_like(&Space::single(), Space::single()).as_str(), " ");
    }
}
