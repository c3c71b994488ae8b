use anyhow::Result;

use crate::utils::{ensure_domain_gitignore, get_mirror_path};

use super::compression::save_compressed_file;

/// Save markdown content to disk.
///
/// # Arguments
///
/// * `markdown_content` - The markdown text to save
/// * `url` - Source URL (used for path generation)
/// * `output_dir` - Base directory for mirrored content
///
/// # Returns
///
/// * `Result<()>` - Result of the save operation
pub async fn save_markdown_content(
    markdown_content: String,
    url: String,
    output_dir: std::path::PathBuf,
    compress: bool,
) -> Result<()> {
    let path = get_mirror_path(&url, &output_dir, "index.md").await?;

    // Ensure .gitignore exists in domain directory
    ensure_domain_gitignore(&path, &output_dir).await?;

    // Ensure parent directory exists
    tokio::fs::create_dir_all(
        path.parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?,
    )
    .await?;

    // save_compressed_file returns the actual saved path (.gz if compressed, plain otherwise)
    let (saved_path, metadata) = save_compressed_file(
        markdown_content.into_bytes(),
        &path,
        "text/markdown",
        compress,
    )
    .await?;

    log::debug!(
        "Saved markdown for {} to {} (etag: {})",
        url,
        saved_path.display(),
        metadata.etag
    );

    Ok(())
}
