//! Output tree and its text printer.

use crate::types::LineEnding;

/// A node of the emitted declaration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNode {
    /// A single line.
    Line(String),
    /// Verbatim source, possibly spanning several lines; every line is
    /// re-indented to the enclosing depth.
    Text(String),
    /// `header {` children `}`
    Block {
        header: String,
        children: Vec<OutputNode>,
    },
    Blank,
}

impl OutputNode {
    pub fn line(text: impl Into<String>) -> Self {
        OutputNode::Line(text.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        OutputNode::Text(text.into())
    }

    pub fn block(header: impl Into<String>, children: Vec<OutputNode>) -> Self {
        OutputNode::Block {
            header: header.into(),
            children,
        }
    }
}

/// Renders output trees to text.
pub trait Printer {
    fn print(&self, nodes: &[OutputNode]) -> String;
}

#[derive(Debug, Clone)]
pub struct TextPrinter {
    indent: String,
    newline: LineEnding,
}

impl TextPrinter {
    pub fn new(newline: LineEnding) -> Self {
        Self {
            indent: "    ".to_string(),
            newline,
        }
    }

    fn write(&self, node: &OutputNode, depth: usize, out: &mut Vec<String>) {
        let pad = self.indent.repeat(depth);
        match node {
            OutputNode::Line(line) => out.push(format!("{pad}{line}")),
            OutputNode::Text(text) => {
                let text = dedent(text);
                for line in text.lines() {
                    if line.trim().is_empty() {
                        out.push(String::new());
                    } else {
                        out.push(format!("{pad}{}", line.trim_end()));
                    }
                }
            }
            OutputNode::Block { header, children } => {
                out.push(format!("{pad}{header} {{"));
                for child in children {
                    self.write(child, depth + 1, out);
                }
                out.push(format!("{pad}}}"));
            }
            OutputNode::Blank => out.push(String::new()),
        }
    }
}

impl Default for TextPrinter {
    fn default() -> Self {
        Self::new(LineEnding::Lf)
    }
}

impl Printer for TextPrinter {
    fn print(&self, nodes: &[OutputNode]) -> String {
        let mut lines = Vec::new();
        for node in nodes {
            self.write(node, 0, &mut lines);
        }
        let newline = self.newline.as_str();
        let mut out = lines.join(newline);
        out.push_str(newline);
        out
    }
}

/// Removes the indentation shared by every line after the first.
///
/// Declaration text is sliced out of its file, so the first line starts at
/// the statement while the rest keep their original indentation.
fn dedent(text: &str) -> String {
    let common = text
        .lines()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let closing = text
        .lines()
        .last()
        .filter(|_| text.lines().count() > 1)
        .map(|l| l.len() - l.trim_start().len())
        .unwrap_or(0);
    // the closing line sits at the statement's own indentation
    let strip = common.min(closing);
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim_start()
            } else {
                let cut = (line.len() - line.trim_start().len()).min(strip);
                &line[cut..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
