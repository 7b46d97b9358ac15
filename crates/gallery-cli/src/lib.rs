use anyhow::Context;
use futures::StreamExt;
use gallery_core::{AssetPatch, UploadedFile};
use gallery_services::ByteStream;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Read a file into an upload payload.
///
/// Explicit `name`/`content_type` win; otherwise the file name is used and the content type is
/// guessed from its extension. An unrecognised extension leaves the type undeclared.
pub async fn read_upload(
    path: &Path,
    name: Option<String>,
    content_type: Option<String>,
) -> anyhow::Result<UploadedFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let name = name.or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
    });
    let content_type = content_type.or_else(|| {
        mime_guess::from_path(path)
            .first()
            .map(|m| m.to_string())
    });

    let mut upload = UploadedFile::new(data);
    upload.original_name = name;
    upload.content_type = content_type;
    Ok(upload)
}

/// Write a content stream to `output` and return the number of bytes written.
///
/// On any failure the partially written file is removed.
pub async fn write_stream(stream: ByteStream, output: &Path) -> anyhow::Result<u64> {
    let result = copy_stream(stream, output).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(output).await {
            tracing::warn!(error = %e, path = %output.display(), "Failed to remove partial download");
        }
    }
    result
}

async fn copy_stream(mut stream: ByteStream, output: &Path) -> anyhow::Result<u64> {
    let mut file = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Content stream failed")?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Turn `--title/--clear-title` style flags into a patch.
pub fn build_patch(
    title: Option<String>,
    clear_title: bool,
    description: Option<String>,
    clear_description: bool,
) -> AssetPatch {
    AssetPatch {
        title: if clear_title { Some(None) } else { title.map(Some) },
        description: if clear_description {
            Some(None)
        } else {
            description.map(Some)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_from_flags() {
        let patch = build_patch(Some("Sunset".into()), false, None, true);
        assert_eq!(patch.title, Some(Some("Sunset".to_string())));
        assert_eq!(patch.description, Some(None));

        assert!(build_patch(None, false, None, false).is_empty());
    }

    #[tokio::test]
    async fn upload_guesses_type_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beach.png");
        tokio::fs::write(&path, b"pixels").await.unwrap();

        let upload = read_upload(&path, None, None).await.unwrap();
        assert_eq!(upload.original_name.as_deref(), Some("beach.png"));
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.size(), 6);

        let upload = read_upload(&path, Some("renamed".into()), Some("image/webp".into()))
            .await
            .unwrap();
        assert_eq!(upload.original_name.as_deref(), Some("renamed"));
        assert_eq!(upload.content_type.as_deref(), Some("image/webp"));
    }

    #[tokio::test]
    async fn unknown_extension_stays_undeclared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.zzqq");
        tokio::fs::write(&path, b"?").await.unwrap();

        let upload = read_upload(&path, None, None).await.unwrap();
        assert_eq!(upload.content_type, None);
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_partial_file() {
        use bytes::Bytes;
        use gallery_services::StorageError;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let chunks: Vec<Result<Bytes, StorageError>> = vec![
            Ok(Bytes::from_static(b"half")),
            Err(StorageError::DownloadFailed("connection reset".into())),
        ];

        let err = write_stream(Box::pin(futures::stream::iter(chunks)), &output)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Content stream failed"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn complete_stream_is_written() {
        use bytes::Bytes;
        use gallery_services::StorageError;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.png");
        let chunks: Vec<Result<Bytes, StorageError>> = vec![
            Ok(Bytes::from_static(b"pix")),
            Ok(Bytes::from_static(b"els")),
        ];

        let written = write_stream(Box::pin(futures::stream::iter(chunks)), &output)
            .await
            .unwrap();
        assert_eq!(written, 6);
        assert_eq!(tokio::fs::read(&output).await.unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_upload(&dir.path().join("nope.png"), None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope.png"));
    }
}
