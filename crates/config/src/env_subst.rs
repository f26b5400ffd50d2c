//! `${VAR}` and `${VAR:-fallback}` expansion over raw config text.
//!
//! Runs before parsing, so placeholders work in any format and in any string
//! value, e.g. `token = "Bot ${MURMUR_BOT_TOKEN}"`.

/// Expand placeholders using `lookup` to resolve variable names.
///
/// An unset variable with no fallback stays in the text verbatim. An
/// unterminated `${` is copied through unchanged.
pub(crate) fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let placeholder = &after[..end];
        let (name, fallback) = match placeholder.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (placeholder, None),
        };

        match lookup(name).filter(|_| !name.is_empty()) {
            Some(value) => out.push_str(&value),
            None => match fallback {
                Some(fallback) if !name.is_empty() => out.push_str(fallback),
                _ => out.push_str(&rest[start..start + 2 + end + 1]),
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
