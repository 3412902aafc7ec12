//! Plain-text export of a rendered preview
//!
//! Lays a [`PreviewElement`] tree out for a terminal: headings are underlined,
//! lists get bullets, quotes get a bar, and math goes through
//! [`super::math::to_unicode`].

use super::math::to_unicode;
use super::preview::{ListItem, MathStyle, PreviewElement, StyledText};

/// Render a preview tree as terminal text
pub fn to_plain_text(elements: &[PreviewElement]) -> String {
    blocks(elements).join("\n\n")
}

fn blocks(elements: &[PreviewElement]) -> Vec<String> {
    elements.iter().map(block).collect()
}

fn block(element: &PreviewElement) -> String {
    match element {
        PreviewElement::Paragraph(spans) => spans_to_text(spans),
        PreviewElement::Heading { level, content } => {
            let title = spans_to_text(content);
            let width = title.chars().count();
            match level {
                1 => format!("{}\n{}", title, "=".repeat(width)),
                2 => format!("{}\n{}", title, "-".repeat(width)),
                _ => format!("{} {}", "#".repeat(usize::from(*level)), title),
            }
        }
        PreviewElement::CodeBlock { code, .. } => indent(code.trim_end_matches('\n'), "    "),
        PreviewElement::Blockquote(children) => indent(&to_plain_text(children), "│ "),
        PreviewElement::List { start, items } => list(*start, items),
        PreviewElement::Table { headers, rows } => table(headers, rows),
        PreviewElement::HorizontalRule => "─".repeat(40),
        PreviewElement::Html(html) => html.trim_end().to_string(),
    }
}

fn list(start: Option<u64>, items: &[ListItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = match start {
                Some(n) => format!("{}. ", n + i as u64),
                None => "• ".to_string(),
            };
            let task = match item.checked {
                Some(true) => "[x] ",
                Some(false) => "[ ] ",
                None => "",
            };
            let body = blocks(&item.content).join("\n");
            let continuation = " ".repeat(marker.chars().count());
            let mut lines = body.lines();
            let first = lines.next().unwrap_or_default();
            let mut out = format!("{}{}{}", marker, task, first);
            for line in lines {
                out.push('\n');
                out.push_str(&continuation);
                out.push_str(line);
            }
            out
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table(headers: &[Vec<StyledText>], rows: &[Vec<Vec<StyledText>>]) -> String {
    let row_text =
        |cells: &[Vec<StyledText>]| cells.iter().map(|c| spans_to_text(c)).collect::<Vec<_>>().join(" | ");
    let mut lines = Vec::new();
    if !headers.is_empty() {
        let header = row_text(headers);
        lines.push("-".repeat(header.chars().count()));
        lines.insert(0, header);
    }
    lines.extend(rows.iter().map(|row| row_text(row)));
    lines.join("\n")
}

fn spans_to_text(spans: &[StyledText]) -> String {
    let mut out = String::new();
    for span in spans {
        match span.math {
            Some(MathStyle::Display) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("    ");
                out.push_str(&to_unicode(&span.text));
                out.push('\n');
            }
            Some(MathStyle::Inline) => out.push_str(&to_unicode(&span.text)),
            None if span.code => {
                out.push('`');
                out.push_str(&span.text);
                out.push('`');
            }
            None => out.push_str(&span.text),
        }
    }
    out.trim_end_matches('\n').to_string()
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::PreviewRenderer;

    fn export(markdown: &str) -> String {
        to_plain_text(&PreviewRenderer::new().render(markdown))
    }

    #[test]
    fn test_heading_underline() {
        assert_eq!(export("# Title"), "Title\n=====");
        assert_eq!(export("### Deep"), "### Deep");
    }

    #[test]
    fn test_inline_math_is_typeset() {
        assert_eq!(export("Energy: $E = mc^2$."), "Energy: E = mc².");
    }

    #[test]
    fn test_display_math_on_own_line() {
        let text = export("$$\n\\frac{1}{2}\n$$");
        assert_eq!(text, "    1/2");
    }

    #[test]
    fn test_lists() {
        assert_eq!(export("- a\n- b"), "• a\n• b");
        assert_eq!(export("3. x\n4. y"), "3. x\n4. y");
        assert_eq!(export("- [x] done"), "• [x] done");
    }

    #[test]
    fn test_quote_and_code() {
        assert_eq!(export("> hi"), "│ hi");
        assert_eq!(export("```\nfn x() {}\n```"), "    fn x() {}");
    }
}
