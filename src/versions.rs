//! Older-version discovery and mirroring.
//!
//! Superseded revisions stay hosted under version-coded URLs
//! (`…{major}{minor}.pdf`, minor in `a..=z`). Nothing links to them, so the
//! space below the advertised code is probed. Some stale codes redirect to
//! the current document; probing therefore disables redirects and only a
//! direct 200 counts as a hit.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use futures::StreamExt as _;
use url::Url;

use crate::catalog::BookId;
use crate::cli::VersionsArgs;
use crate::fetch::{self, SiteClient};
use crate::pages::{self, PageError};
use crate::pdf_meta;
use crate::store;
use crate::titles;

/// A `{major}{minor}` revision code. The derived order (major first, then
/// minor) is exactly the site's publication order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionCode {
    pub major: u32,
    pub minor: char,
}

impl fmt::Display for VersionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.major, self.minor)
    }
}

/// A document URL with the version token cut out, ready for substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionUrlTemplate {
    prefix: String,
    suffix: String,
}

impl VersionUrlTemplate {
    pub fn url_for(&self, code: VersionCode) -> String {
        format!("{}{}{}", self.prefix, code, self.suffix)
    }
}

/// Split a latest-document URL into its version code and a substitution
/// template.
///
/// `None` when the name does not end in `{digits}{lowercase}.{ext}`; a few
/// chapters are published that way and simply have no history to probe.
pub fn parse_latest(url: &str) -> Option<(VersionCode, VersionUrlTemplate)> {
    let (stem, extension) = url.rsplit_once('.')?;
    let minor = stem.chars().last()?;
    if !minor.is_ascii_lowercase() {
        return None;
    }
    let head = &stem[..stem.len() - minor.len_utf8()];
    let digit_count = head.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digit_count == 0 {
        return None;
    }
    let split = head.len() - digit_count;
    let major: u32 = head[split..].parse().ok()?;
    Some((
        VersionCode { major, minor },
        VersionUrlTemplate { prefix: head[..split].to_owned(), suffix: format!(".{extension}") },
    ))
}

/// Codes strictly below `latest`, ascending: `1a…1z, 2a…`. Enumeration stops
/// entirely at `latest`, majors and minors alike.
pub fn candidate_codes(latest: VersionCode) -> Vec<VersionCode> {
    let mut codes = Vec::new();
    'majors: for major in 1..=latest.major {
        for minor in 'a'..='z' {
            let code = VersionCode { major, minor };
            if code >= latest {
                break 'majors;
            }
            codes.push(code);
        }
    }
    codes
}

/// Probe candidate URLs and keep the ones that exist, oldest first.
///
/// Up to `concurrency` probes run at a time; results keep enumeration
/// order. A transport error classifies that candidate as absent rather than
/// failing the chapter.
pub async fn probe_existing(
    client: &SiteClient,
    template: &VersionUrlTemplate,
    codes: Vec<VersionCode>,
    concurrency: usize,
) -> Vec<(VersionCode, Url)> {
    futures::stream::iter(codes.into_iter().map(|code| {
        let raw = template.url_for(code);
        async move {
            client.pause().await;
            let url = match Url::parse(&raw) {
                Ok(url) => url,
                Err(err) => {
                    tracing::debug!(url = %raw, error = %err, "skip unparseable version url");
                    return None;
                }
            };
            match client.probe(url.clone()).await {
                Ok(true) => Some((code, url)),
                Ok(false) => None,
                Err(err) => {
                    tracing::debug!(url = %raw, error = %err, "probe failed; version counted absent");
                    None
                }
            }
        }
    }))
    .buffered(concurrency.max(1))
    .filter_map(|hit| async move { hit })
    .collect()
    .await
}

/// Discover every still-hosted older version of a chapter's document.
pub async fn older_versions(
    client: &SiteClient,
    book: BookId,
    chapter: u32,
    concurrency: usize,
) -> Result<Vec<(VersionCode, Url)>, PageError> {
    let latest_url = pages::find_latest_version_url(client, book, chapter).await?;
    let Some((latest, template)) = parse_latest(latest_url.as_str()) else {
        tracing::debug!(book = %book, chapter, url = %latest_url, "unversioned document, no history");
        return Ok(Vec::new());
    };
    tracing::debug!(book = %book, chapter, latest = %latest, "probing below latest version");
    Ok(probe_existing(client, &template, candidate_codes(latest), concurrency).await)
}

pub async fn run(args: VersionsArgs) -> anyhow::Result<()> {
    let client = fetch::client_from(&args.base_url, args.timeout_secs, args.delay_ms)?;
    let selection = crate::cli::selection_from(&args.only)?;
    let out_dir = PathBuf::from(&args.out);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;

    let mut downloaded = 0usize;
    let mut skipped = 0usize;
    for (&book, chapters) in &selection {
        tracing::info!(book = %book, chapters = chapters.len(), "mirror version history");
        let book_dir = match store::reset_book_dir(&client, &out_dir, book).await {
            Ok(dir) => dir,
            Err(err) => {
                skipped += chapters.len();
                tracing::warn!(book = %book, error = %err, "skip book: title lookup failed");
                continue;
            }
        };
        for &chapter in chapters {
            match mirror_chapter_history(&client, &book_dir, book, chapter, args.concurrency)
                .await
            {
                Ok(saved) => downloaded += saved,
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(book = %book, chapter, error = %err, "skip chapter");
                }
            }
        }
    }

    tracing::info!(downloaded, skipped, "versions complete");
    Ok(())
}

async fn mirror_chapter_history(
    client: &SiteClient,
    book_dir: &Path,
    book: BookId,
    chapter: u32,
    concurrency: usize,
) -> anyhow::Result<usize> {
    let raw_title = pages::find_title(client, book, Some(chapter)).await?;
    let title = titles::normalize_chapter_title(&raw_title)?;
    let versions = older_versions(client, book, chapter, concurrency).await?;

    let mut saved = 0usize;
    for (code, url) in versions {
        client.pause().await;
        match download_version(client, book_dir, &title, code, url).await {
            Ok(path) => {
                saved += 1;
                tracing::debug!(path = %path.display(), "saved version");
            }
            Err(err) => {
                tracing::warn!(book = %book, chapter, code = %code, error = %err, "skip version");
            }
        }
    }
    Ok(saved)
}

/// Download one version and stamp its file name with the PDF's creation
/// date. A document without a usable date keeps the bare code name.
async fn download_version(
    client: &SiteClient,
    book_dir: &Path,
    title: &str,
    code: VersionCode,
    url: Url,
) -> anyhow::Result<PathBuf> {
    let bytes = client.get_bytes(url).await?;
    let bare = book_dir.join(format!("{title} ; {code}.pdf"));
    store::save_pdf(&bare, &bytes)?;
    match pdf_meta::creation_date(&bytes) {
        Ok(rendered) => {
            let stamped =
                book_dir.join(format!("{title} ; {code} - {}.pdf", store::timestamp_suffix(&rendered)));
            std::fs::rename(&bare, &stamped)
                .with_context(|| format!("rename version file: {}", stamped.display()))?;
            Ok(stamped)
        }
        Err(err) => {
            tracing::debug!(file = %bare.display(), error = %err, "no usable creation date");
            Ok(bare)
        }
    }
}
