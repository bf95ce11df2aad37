//! Single flat-file output for finished summaries.

use std::path::Path;

/// Write `text` to `path`, replacing any previous contents.
///
/// The text is written verbatim; one writer per path is assumed.
pub async fn write_artifact(path: &Path, text: &str) -> std::io::Result<()> {
    tokio::fs::write(path, text).await?;
    tracing::info!(path = %path.display(), bytes = text.len(), "Summary written");
    Ok(())
}
