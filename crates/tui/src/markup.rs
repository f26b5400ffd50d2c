//! Inline chat formatting → terminal display tokens.
//!
//! The output uses bracketed style tokens (`[::b]`, `[::B]`, `[green]`,
//! `[-:-:-]`, ...) that `ui::styled` turns into ratatui spans.
//!
//! Rules run one after another, each over the whole output of the previous
//! one. A later rule therefore sees the tokens an earlier rule inserted, and
//! delimiters an earlier rule left unmatched. Nested or overlapping markers
//! can come out mis-nested (see the `*` tests below); that ordering is the
//! contract.

use {regex::Regex, std::sync::LazyLock};

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Option<Rule> {
    Regex::new(pattern).ok().map(|pattern| Rule {
        pattern,
        replacement,
    })
}

/// Style rules in application order.
static STYLE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    [
        rule(r"(?ms)\*\*(.*?)\*\*", "[::b]${1}[::B]"),
        rule(r"(?ms)\*(.*?)\*", "[::i]${1}[::I]"),
        rule(r"(?ms)__(.*?)__", "[::u]${1}[::U]"),
        rule(r"(?ms)~~(.*?)~~", "[::s]${1}[::S]"),
        rule(r"(?ms)`([^`\n]+)`", "[::r]${1}[::R]"),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Custom emote reference: `<:name:123456>`.
static EMOTE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<(:[a-zA-Z0-9]+:)[0-9]+>").ok());

/// Rewrite inline formatting in `input` into display tokens. Emote
/// references render as `:name:` in `emote_color`.
pub fn translate(input: &str, emote_color: &str) -> String {
    let mut output = input.to_owned();

    for rule in STYLE_RULES.iter() {
        output = rule
            .pattern
            .replace_all(&output, rule.replacement)
            .into_owned();
    }

    if let Some(emote) = EMOTE.as_ref() {
        output = emote
            .replace_all(&output, |caps: &regex::Captures<'_>| {
                format!("[{emote_color}]{}[-:-:-]", &caps[1])
            })
            .into_owned();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rules_compile() {
        assert_eq!(STYLE_RULES.len(), 5);
        assert!(EMOTE.is_some());
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(translate("hello there", "green"), "hello there");
    }

    #[test]
    fn bold_and_italic_on_disjoint_spans() {
        assert_eq!(
            translate("**bold** and *italic*", "green"),
            "[::b]bold[::B] and [::i]italic[::I]"
        );
    }

    #[test]
    fn underline_strike_and_code() {
        assert_eq!(translate("__u__", "green"), "[::u]u[::U]");
        assert_eq!(translate("~~gone~~", "green"), "[::s]gone[::S]");
        assert_eq!(translate("run `cargo test`", "green"), "run [::r]cargo test[::R]");
    }

    #[test]
    fn code_span_does_not_cross_newlines() {
        assert_eq!(translate("`a\nb`", "green"), "`a\nb`");
    }

    #[test]
    fn bold_spans_lines() {
        assert_eq!(translate("**a\nb**", "green"), "[::b]a\nb[::B]");
    }

    #[test]
    fn emote_drops_id_and_uses_color() {
        assert_eq!(
            translate("hi <:wave:123456789>", "#ff00ff"),
            "hi [#ff00ff]:wave:[-:-:-]"
        );
    }

    #[test]
    fn emote_color_is_not_a_replacement_pattern() {
        assert_eq!(translate("<:x:1>", "$1"), "[$1]:x:[-:-:-]");
    }

    #[test]
    fn nested_italic_inside_bold() {
        // Bold consumes the whole span first; italic then matches the inner
        // pair of single stars.
        assert_eq!(
            translate("**a*b*c**", "green"),
            "[::b]a[::i]b[::I]c[::B]"
        );
    }

    #[test]
    fn triple_star_comes_out_mis_nested() {
        // Bold takes `**` + `*x` + `**`, leaving one trailing star that the
        // italic rule pairs with the star bold left inside its span.
        assert_eq!(translate("***x***", "green"), "[::b][::i]x[::B][::I]");
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        assert_eq!(translate("2 * 3 = 6", "green"), "2 * 3 = 6");
        assert_eq!(translate("snake__case", "green"), "snake__case");
    }

    #[test]
    fn underscores_inside_code_are_styled_first() {
        // Underline runs before inline code, so markers inside backticks are
        // still rewritten.
        assert_eq!(
            translate("`__init__`", "green"),
            "[::r][::u]init[::U][::R]"
        );
    }
}
