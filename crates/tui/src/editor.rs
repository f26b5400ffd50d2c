//! Composing a message in `$EDITOR`.

use {
    crate::Error,
    std::{io::Write, path::Path},
    tracing::{debug, warn},
};

/// Split an `$EDITOR` value such as `code --wait` into program and args.
fn parse_command(editor: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = editor.split_whitespace();
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Run `editor` on a temp file seeded with `initial`. Returns the edited
/// text, or `None` when the editor exits unsuccessfully.
///
/// The caller must hand the terminal over first and take it back after.
pub async fn edit(editor: &str, initial: &str) -> Result<Option<String>, Error> {
    let Some((program, args)) = parse_command(editor) else {
        return Ok(None);
    };

    let mut file = tempfile::Builder::new()
        .prefix("murmur-")
        .suffix(".md")
        .tempfile()?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    let status = run(program, &args, file.path()).await?;
    if !status.success() {
        warn!(%status, editor = program, "editor exited unsuccessfully");
        return Ok(None);
    }

    let text = tokio::fs::read_to_string(file.path()).await?;
    debug!(bytes = text.len(), "read message from editor");
    Ok(Some(text.trim_end().to_owned()))
}

async fn run(program: &str, args: &[&str], path: &Path) -> Result<std::process::ExitStatus, Error> {
    Ok(tokio::process::Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .await?)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_with_arguments() {
        assert_eq!(parse_command("code --wait"), Some(("code", vec!["--wait"])));
        assert_eq!(parse_command("vim"), Some(("vim", vec![])));
        assert_eq!(parse_command("   "), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn true_keeps_initial_text() {
        let text = edit("true", "draft\n").await.unwrap();
        assert_eq!(text.as_deref(), Some("draft"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_editor_discards() {
        assert_eq!(edit("false", "draft").await.unwrap(), None);
    }
}
