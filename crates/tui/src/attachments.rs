use {
    crate::{Error, desktop::Desktop, remote::RemoteClient},
    murmur_protocol::Attachment,
    std::path::{Path, PathBuf},
    tracing::debug,
};

/// File name to store an attachment under. Path components the service may
/// have put in the name are dropped.
pub fn local_file_name(attachment: &Attachment) -> String {
    Path::new(&attachment.filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "attachment".into())
}

/// Fetch every attachment into `dir`, overwriting files of the same name.
/// Stops at the first failure; files already written stay.
pub async fn save_all(
    remote: &dyn RemoteClient,
    attachments: &[Attachment],
    dir: &Path,
) -> Result<Vec<PathBuf>, Error> {
    tokio::fs::create_dir_all(dir).await?;

    let mut saved = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let bytes = remote.fetch_bytes(&attachment.url).await?;
        let path = dir.join(local_file_name(attachment));
        tokio::fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "saved attachment");
        saved.push(path);
    }
    Ok(saved)
}

/// Save into `dir` and hand each file to the default application.
pub async fn open_all(
    remote: &dyn RemoteClient,
    desktop: &dyn Desktop,
    attachments: &[Attachment],
    dir: &Path,
) -> Result<Vec<PathBuf>, Error> {
    let saved = save_all(remote, attachments, dir).await?;
    for path in &saved {
        desktop.open(&path.to_string_lossy())?;
    }
    Ok(saved)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            desktop::tests::FakeDesktop,
            remote::tests::{Call, FakeRemote},
        },
    };

    fn attachment(filename: &str) -> Attachment {
        Attachment {
            filename: filename.into(),
            url: format!("https://cdn.example.com/{filename}"),
            size: 3,
        }
    }

    #[test]
    fn file_name_drops_directories() {
        assert_eq!(local_file_name(&attachment("../../etc/passwd")), "passwd");
        assert_eq!(local_file_name(&attachment("cat.png")), "cat.png");
        assert_eq!(local_file_name(&attachment("..")), "attachment");
    }

    #[tokio::test]
    async fn saves_bytes_under_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let remote = FakeRemote {
            bytes: b"png".to_vec(),
            ..FakeRemote::default()
        };

        let dir = tmp.path().join("downloads");
        let saved =
            tokio_test::assert_ok!(save_all(&remote, &[attachment("cat.png")], &dir).await);

        assert_eq!(saved, vec![dir.join("cat.png")]);
        assert_eq!(std::fs::read(&saved[0]).unwrap(), b"png");
        assert_eq!(remote.calls(), vec![Call::FetchBytes(
            "https://cdn.example.com/cat.png".into()
        )]);
    }

    #[tokio::test]
    async fn open_launches_each_saved_file() {
        let tmp = tempfile::tempdir().unwrap();
        let remote = FakeRemote::default();
        let desktop = FakeDesktop::default();

        open_all(&remote, &desktop, &[attachment("a.txt"), attachment("b.txt")], tmp.path())
            .await
            .unwrap();

        let opened = desktop.opened.lock().unwrap().clone();
        assert_eq!(opened.len(), 2);
        assert!(opened[0].ends_with("a.txt"));
        assert!(opened[1].ends_with("b.txt"));
    }
}
