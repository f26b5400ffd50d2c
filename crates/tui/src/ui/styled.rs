//! Display-token text → ratatui lines.
//!
//! Understands the tokens [`crate::markup`] emits: `[::b]`/`[::B]` style
//! toggles, `[color]` foreground changes, and `[-:-:-]` which returns to
//! the base style. `[[` is a literal `[`. A bracket that does not form a
//! known token is drawn as-is.

use {
    ratatui::{
        style::{Color, Modifier, Style},
        text::{Line, Span},
    },
    std::str::FromStr,
};

enum Token {
    Reset,
    Foreground(Color),
    Modifiers(Vec<(Modifier, bool)>),
}

fn modifier(flag: char) -> Option<(Modifier, bool)> {
    let modifier = match flag.to_ascii_lowercase() {
        'b' => Modifier::BOLD,
        'i' => Modifier::ITALIC,
        'u' => Modifier::UNDERLINED,
        's' => Modifier::CROSSED_OUT,
        'r' => Modifier::REVERSED,
        'd' => Modifier::DIM,
        _ => return None,
    };
    Some((modifier, flag.is_ascii_lowercase()))
}

fn token(body: &str) -> Option<Token> {
    if body == "-:-:-" || body == "-" {
        return Some(Token::Reset);
    }
    if let Some(flags) = body.strip_prefix("::") {
        if flags.is_empty() {
            return None;
        }
        return flags.chars().map(modifier).collect::<Option<Vec<_>>>().map(Token::Modifiers);
    }
    if body.is_empty() || body.contains([':', ' ']) {
        return None;
    }
    Color::from_str(body).ok().map(Token::Foreground)
}

fn apply(style: Style, token: &Token, base: Style) -> Style {
    match token {
        Token::Reset => base,
        Token::Foreground(color) => style.fg(*color),
        Token::Modifiers(flags) => flags.iter().fold(style, |style, (m, on)| {
            if *on {
                style.add_modifier(*m)
            } else {
                style.remove_modifier(*m)
            }
        }),
    }
}

/// Parse `text` into lines. Styles carry over line breaks.
pub fn to_lines(text: &str, base: Style) -> Vec<Line<'static>> {
    let mut style = base;
    text.split('\n')
        .map(|line| {
            let (spans, next) = parse_line(line, style, base);
            style = next;
            Line::from(spans)
        })
        .collect()
}

fn parse_line(line: &str, mut style: Style, base: Style) -> (Vec<Span<'static>>, Style) {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        current.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        if let Some(tail) = after.strip_prefix('[') {
            current.push('[');
            rest = tail;
            continue;
        }

        let parsed = after
            .find(']')
            .and_then(|close| token(&after[..close]).map(|t| (t, close)));
        match parsed {
            Some((token, close)) => {
                if !current.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut current), style));
                }
                style = apply(style, &token, base);
                rest = &after[close + 1..];
            },
            None => {
                current.push('[');
                rest = after;
            },
        }
    }
    current.push_str(rest);
    if !current.is_empty() {
        spans.push(Span::styled(current, style));
    }
    (spans, style)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn plain_text() {
        let lines = to_lines("hello\nworld", Style::default());
        assert_eq!(text(&lines), vec!["hello", "world"]);
    }

    #[test]
    fn bold_toggle() {
        let lines = to_lines("a [::b]b[::B] c", Style::default());
        let spans = &lines[0].spans;
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "b");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(!spans[2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn color_and_reset() {
        let lines = to_lines("[green]:wave:[-:-:-] hi", Style::default());
        let spans = &lines[0].spans;
        assert_eq!(spans[0].content, ":wave:");
        assert_eq!(spans[0].style.fg, Some(Color::Green));
        assert_eq!(spans[1].style, Style::default());
    }

    #[test]
    fn doubled_bracket_is_literal() {
        let lines = to_lines("[[red] not a color", Style::default());
        assert_eq!(text(&lines), vec!["[red] not a color"]);
        assert_eq!(lines[0].spans.len(), 1);
    }

    #[test]
    fn unknown_tokens_are_literal() {
        let lines = to_lines("[link text] [::x] [", Style::default());
        assert_eq!(text(&lines), vec!["[link text] [::x] ["]);
    }

    #[test]
    fn style_spans_lines() {
        let lines = to_lines("[::d]quoted\nstill[::D] done", Style::default());
        assert!(lines[1].spans[0].style.add_modifier.contains(Modifier::DIM));
        assert!(!lines[1].spans[1].style.add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn reset_returns_to_base() {
        let base = Style::default().fg(Color::White);
        let lines = to_lines("[::b][red]x[-:-:-]y", base);
        assert_eq!(lines[0].spans[1].style, base);
    }
}
