use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::catalog::BookId;
use crate::cli::LessonsArgs;
use crate::fetch::{self, SiteClient};
use crate::pages;
use crate::store;
use crate::titles;

pub async fn run(args: LessonsArgs) -> anyhow::Result<()> {
    let client = fetch::client_from(&args.base_url, args.timeout_secs, args.delay_ms)?;
    let selection = crate::cli::selection_from(&args.only)?;
    let out_dir = PathBuf::from(&args.out);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;

    let mut downloaded = 0usize;
    let mut skipped = 0usize;
    for (&book, chapters) in &selection {
        tracing::info!(book = %book, chapters = chapters.len(), "mirror book");
        let book_dir = match store::reset_book_dir(&client, &out_dir, book).await {
            Ok(dir) => dir,
            Err(err) => {
                skipped += chapters.len();
                tracing::warn!(book = %book, error = %err, "skip book: title lookup failed");
                continue;
            }
        };
        for &chapter in chapters {
            client.pause().await;
            match mirror_chapter(&client, &book_dir, book, chapter).await {
                Ok(path) => {
                    downloaded += 1;
                    tracing::debug!(path = %path.display(), "saved chapter");
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(book = %book, chapter, error = %err, "skip chapter");
                }
            }
        }
    }

    tracing::info!(downloaded, skipped, "lessons complete");
    Ok(())
}

/// Download the advertised document of one chapter under its normalized
/// title.
async fn mirror_chapter(
    client: &SiteClient,
    book_dir: &Path,
    book: BookId,
    chapter: u32,
) -> anyhow::Result<PathBuf> {
    let url = pages::find_latest_version_url(client, book, chapter).await?;
    let raw_title = pages::find_title(client, book, Some(chapter)).await?;
    let title = titles::normalize_chapter_title(&raw_title)?;
    let bytes = client.get_bytes(url).await.context("download chapter document")?;
    let path = book_dir.join(format!("{title}.pdf"));
    store::save_pdf(&path, &bytes)?;
    Ok(path)
}
