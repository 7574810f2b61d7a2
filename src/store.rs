use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::catalog::BookId;
use crate::fetch::SiteClient;
use crate::pages;
use crate::titles;

/// Write a downloaded document, creating parent directories as needed.
pub fn save_pdf(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write pdf: {}", path.display()))
}

/// Directory for one archive sub-theme. Entries without a sub-theme land
/// directly under the theme.
pub fn archive_dir(out_dir: &Path, theme: &str, subtheme: &str) -> PathBuf {
    let theme_dir = out_dir.join(titles::capitalize_word(theme));
    if subtheme.is_empty() {
        theme_dir
    } else {
        theme_dir.join(titles::capitalize_word(subtheme))
    }
}

/// Filename-safe form of a rendered creation date:
/// `12/05/2024 09:30:45` becomes `12.05.2024 09-30-45`.
pub fn timestamp_suffix(rendered: &str) -> String {
    rendered.replace('/', ".").replace(':', "-")
}

/// Resolve a book's display title and start its output directory from
/// scratch. A stale mirror of the same book is removed first.
pub async fn reset_book_dir(
    client: &SiteClient,
    out_dir: &Path,
    book: BookId,
) -> anyhow::Result<PathBuf> {
    let title = pages::find_title(client, book, None).await?;
    let dir = out_dir.join(titles::sanitize_display(&title));
    if dir.exists() {
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("clear book dir: {}", dir.display()))?;
    }
    std::fs::create_dir_all(&dir).with_context(|| format!("create book dir: {}", dir.display()))?;
    Ok(dir)
}
