//! Minimal markdown to ratatui text conversion for insight bodies.
//!
//! Block level: ATX headings, bullet and numbered lists, block quotes,
//! fenced code, horizontal rules and paragraphs. Inline: `**bold**`,
//! `__bold__`, `*italic*` and `` `code` ``. Everything else is shown as is.

use lazy_static::lazy_static;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use regex::Regex;
use textwrap::core::display_width;

use crate::tui::Theme;

struct Patterns {
    heading: Regex,
    bullet: Regex,
    numbered: Regex,
    quote: Regex,
    rule: Regex,
    inline: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            heading: Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$")?,
            bullet: Regex::new(r"^(\s*)[-*+]\s+(.*)$")?,
            numbered: Regex::new(r"^(\s*)(\d+)[.)]\s+(.*)$")?,
            quote: Regex::new(r"^\s*>\s?(.*)$")?,
            rule: Regex::new(r"^\s*([-*_])(\s*[-*_]){2,}\s*$")?,
            inline: Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__|\*([^*\s][^*]*)\*|`([^`]+)`")?,
        })
    }
}

lazy_static! {
    static ref PATTERNS: Option<Patterns> = Patterns::compile()
        .map_err(|e| tracing::error!("markdown patterns failed to compile: {e}"))
        .ok();
}

/// Convert markdown into lines wrapped to `width` columns
pub fn render(markdown: &str, width: u16, theme: &Theme) -> Vec<Line<'static>> {
    let width = width.max(8) as usize;
    let base = theme.normal_style();
    let Some(patterns) = PATTERNS.as_ref() else {
        return textwrap::wrap(markdown, width)
            .into_iter()
            .map(|l| Line::from(Span::styled(l.into_owned(), base)))
            .collect();
    };
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_code = false;

    for raw in markdown.lines() {
        let trimmed = raw.trim_end();

        if trimmed.trim_start().starts_with("```") {
            flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);
            in_code = !in_code;
            continue;
        }
        if in_code {
            lines.push(Line::from(Span::styled(format!("  {trimmed}"), theme.code_style())));
            continue;
        }
        if trimmed.trim().is_empty() {
            flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);
            if lines.last().is_some_and(|l| l.width() > 0) {
                lines.push(Line::from(""));
            }
            continue;
        }

        // A rule check must precede bullets: "- - -" would match both
        if patterns.rule.is_match(trimmed) {
            flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);
            lines.push(Line::from(Span::styled("─".repeat(width), theme.muted_style())));
        } else if let Some(caps) = patterns.heading.captures(trimmed) {
            flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);
            let level = caps[1].len();
            let mut style = theme.heading_style();
            if level == 1 {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            lines.extend(wrap_spans(inline_spans(patterns, &caps[2], style, theme), width, "", ""));
        } else if let Some(caps) = patterns.bullet.captures(trimmed) {
            flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);
            let indent = " ".repeat(caps[1].len() / 2 * 2);
            let first = format!("{indent}• ");
            let rest = " ".repeat(display_width(&first));
            lines.extend(wrap_spans(inline_spans(patterns, &caps[2], base, theme), width, &first, &rest));
        } else if let Some(caps) = patterns.numbered.captures(trimmed) {
            flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);
            let indent = " ".repeat(caps[1].len() / 2 * 2);
            let first = format!("{indent}{}. ", &caps[2]);
            let rest = " ".repeat(display_width(&first));
            lines.extend(wrap_spans(inline_spans(patterns, &caps[3], base, theme), width, &first, &rest));
        } else if let Some(caps) = patterns.quote.captures(trimmed) {
            flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);
            let style = theme.muted_style().add_modifier(Modifier::ITALIC);
            lines.extend(wrap_spans(inline_spans(patterns, &caps[1], style, theme), width, "│ ", "│ "));
        } else {
            paragraph.push(trimmed.trim_start());
        }
    }
    flush_paragraph(patterns, &mut paragraph, &mut lines, width, base, theme);

    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }
    lines
}

fn flush_paragraph(
    patterns: &Patterns,
    paragraph: &mut Vec<&str>,
    lines: &mut Vec<Line<'static>>,
    width: usize,
    base: Style,
    theme: &Theme,
) {
    if paragraph.is_empty() {
        return;
    }
    let text = paragraph.join(" ");
    paragraph.clear();
    lines.extend(wrap_spans(inline_spans(patterns, &text, base, theme), width, "", ""));
}

/// Split text into styled runs according to the inline markers
fn inline_spans(patterns: &Patterns, text: &str, base: Style, theme: &Theme) -> Vec<(String, Style)> {
    let mut runs = Vec::new();
    let mut last = 0;
    for caps in patterns.inline.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            runs.push((text[last..whole.start()].to_string(), base));
        }
        let (content, style) = if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            (m.as_str(), base.add_modifier(Modifier::BOLD))
        } else if let Some(m) = caps.get(3) {
            (m.as_str(), base.add_modifier(Modifier::ITALIC))
        } else if let Some(m) = caps.get(4) {
            (m.as_str(), theme.code_style())
        } else {
            (whole.as_str(), base)
        };
        runs.push((content.to_string(), style));
        last = whole.end();
    }
    if last < text.len() {
        runs.push((text[last..].to_string(), base));
    }
    runs
}

/// Greedy word wrap over styled runs. Words keep their style; a word longer
/// than the line is placed on its own line and left to the terminal to clip.
fn wrap_spans(
    runs: Vec<(String, Style)>,
    width: usize,
    first_prefix: &str,
    rest_prefix: &str,
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let prefix = |p: &str| -> Vec<Span<'static>> {
        if p.is_empty() {
            Vec::new()
        } else {
            vec![Span::raw(p.to_string())]
        }
    };
    let mut current = prefix(first_prefix);
    let mut used = display_width(first_prefix);
    let mut line_has_words = false;
    let mut pending_space = false;

    for (text, style) in runs {
        let mut chunks = text.split(' ').peekable();
        let leading_space = text.starts_with(' ');
        if leading_space {
            pending_space = true;
        }
        while let Some(word) = chunks.next() {
            let more = chunks.peek().is_some();
            if word.is_empty() {
                if more {
                    pending_space = line_has_words;
                }
                continue;
            }
            let word_width = display_width(word);
            let gap = usize::from(pending_space && line_has_words);
            if line_has_words && used + gap + word_width > width {
                out.push(Line::from(std::mem::replace(&mut current, prefix(rest_prefix))));
                used = display_width(rest_prefix);
            } else if gap == 1 {
                current.push(Span::styled(" ", style));
                used += 1;
            }
            current.push(Span::styled(word.to_string(), style));
            used += word_width;
            line_has_words = true;
            pending_space = more;
        }
    }
    if line_has_words {
        out.push(Line::from(current));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn test_headings_and_lists() {
        let md = "## Summary\n\n- North leads\n- South trails\n\n1. First\n2. Second";
        let lines = render(md, 40, &Theme::default());
        assert_eq!(
            plain(&lines),
            vec!["Summary", "", "• North leads", "• South trails", "", "1. First", "2. Second"]
        );
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_inline_markers_are_styled_and_removed() {
        let lines = render("Sales rose **12%** in *Q3* via `promo`.", 80, &Theme::default());
        assert_eq!(plain(&lines), vec!["Sales rose 12% in Q3 via promo."]);
        let bold = lines[0].spans.iter().find(|s| s.content == "12%").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        let italic = lines[0].spans.iter().find(|s| s.content == "Q3").unwrap();
        assert!(italic.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_paragraph_wraps_with_hanging_indent_for_bullets() {
        let lines = render("- alpha beta gamma delta", 14, &Theme::default());
        assert_eq!(plain(&lines), vec!["• alpha beta", "  gamma delta"]);
    }

    #[test]
    fn test_long_paragraph_wraps_over_several_lines() {
        let lines = render("aa bb cc dd ee ff gg", 8, &Theme::default());
        assert_eq!(plain(&lines), vec!["aa bb cc", "dd ee ff", "gg"]);
    }

    #[test]
    fn test_soft_breaks_join_paragraph_lines() {
        let lines = render("one two\nthree", 80, &Theme::default());
        assert_eq!(plain(&lines), vec!["one two three"]);
    }

    #[test]
    fn test_code_fence_and_rule() {
        let md = "```\nlet x = 1;\n```\n---\ndone";
        let lines = render(md, 10, &Theme::default());
        assert_eq!(plain(&lines), vec!["  let x = 1;", "──────────", "done"]);
    }

    #[test]
    fn test_snake_case_is_left_alone() {
        let lines = render("column table_name_x", 80, &Theme::default());
        assert_eq!(plain(&lines), vec!["column table_name_x"]);
    }
}
