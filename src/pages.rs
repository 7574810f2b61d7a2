use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use crate::catalog::{self, BookId};
use crate::fetch::{FetchError, SiteClient};

/// Prefix of every advertised chapter document link.
const DOWNLOAD_PREFIX: &str = "ressources/textes/";

#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The page has no `<h1>` to take a title from.
    #[error("no heading on {page}")]
    NoHeading { page: String },
    /// The page advertises no document under `ressources/textes/`.
    #[error("no download link on {page}")]
    NoDownloadLink { page: String },
}

/// Text of the first `<h1>`, trimmed; empty headings count as missing.
pub fn extract_heading(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let headings = Selector::parse("h1").ok()?;
    let element = document.select(&headings).next()?;
    let text = element.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// First link pointing under `ressources/textes/`, the currently advertised
/// document for the page.
pub fn extract_download_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").ok()?;
    document
        .select(&anchors)
        .filter_map(|anchor| anchor.value().attr("href"))
        .find(|href| href.starts_with(DOWNLOAD_PREFIX))
        .map(str::to_owned)
}

/// Title of a book (`chapter` absent) or chapter page. Decoded by sniffing;
/// the declared charset on these pages is wrong.
pub async fn find_title(
    client: &SiteClient,
    book: BookId,
    chapter: Option<u32>,
) -> Result<String, PageError> {
    let path = catalog::page_path(book, chapter);
    let page = client.get_page(client.site_url(&path)?).await?;
    extract_heading(&page.text_sniffed()).ok_or_else(|| PageError::NoHeading { page: path })
}

/// Absolute URL of the latest advertised document for a chapter.
pub async fn find_latest_version_url(
    client: &SiteClient,
    book: BookId,
    chapter: u32,
) -> Result<Url, PageError> {
    let path = catalog::page_path(book, Some(chapter));
    let page = client.get_page(client.site_url(&path)?).await?;
    let href = extract_download_href(&page.text_sniffed())
        .ok_or_else(|| PageError::NoDownloadLink { page: path })?;
    Ok(client.site_url(&href)?)
}
