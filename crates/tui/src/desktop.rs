//! Clipboard and "open with the default application" access.

use {crate::Error, std::sync::Mutex};

pub trait Desktop: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), Error>;

    fn paste(&self) -> Result<String, Error>;

    /// Open a URL or file path with the platform's default handler.
    fn open(&self, target: &str) -> Result<(), Error>;
}

/// The real desktop: `arboard` for the clipboard, `open` for launching.
#[derive(Default)]
pub struct SystemDesktop {
    // Kept alive for the whole run; on X11 the copied text vanishes with
    // the clipboard handle that owns it.
    clipboard: Mutex<Option<arboard::Clipboard>>,
}

impl SystemDesktop {
    fn with_clipboard<T>(
        &self,
        f: impl FnOnce(&mut arboard::Clipboard) -> Result<T, arboard::Error>,
    ) -> Result<T, Error> {
        let mut guard = self
            .clipboard
            .lock()
            .map_err(|_| Error::Clipboard("clipboard lock poisoned".into()))?;
        if guard.is_none() {
            *guard = Some(arboard::Clipboard::new().map_err(clipboard_error)?);
        }
        match guard.as_mut() {
            Some(clipboard) => f(clipboard).map_err(clipboard_error),
            None => Err(Error::Clipboard("clipboard unavailable".into())),
        }
    }
}

fn clipboard_error(e: arboard::Error) -> Error {
    Error::Clipboard(e.to_string())
}

impl Desktop for SystemDesktop {
    fn copy(&self, text: &str) -> Result<(), Error> {
        self.with_clipboard(|c| c.set_text(text.to_owned()))
    }

    fn paste(&self) -> Result<String, Error> {
        self.with_clipboard(|c| c.get_text())
    }

    fn open(&self, target: &str) -> Result<(), Error> {
        open::that_detached(target)?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records what would have reached the desktop.
    #[derive(Default)]
    pub struct FakeDesktop {
        pub copied: Mutex<Vec<String>>,
        pub opened: Mutex<Vec<String>>,
        pub clipboard: String,
    }

    impl Desktop for FakeDesktop {
        fn copy(&self, text: &str) -> Result<(), Error> {
            self.copied.lock().unwrap().push(text.to_owned());
            Ok(())
        }

        fn paste(&self) -> Result<String, Error> {
            Ok(self.clipboard.clone())
        }

        fn open(&self, target: &str) -> Result<(), Error> {
            self.opened.lock().unwrap().push(target.to_owned());
            Ok(())
        }
    }
}
