//! Themed archive indexes.
//!
//! The archive pages group documents as theme, then sub-theme, then entries,
//! but their `<li>` elements are never closed and the parsed nesting cannot
//! be trusted. Instead of walking containment, this module scans the
//! document in source order for structural anchors (bold theme spans, plain
//! sub-theme spans, list openings, links) and folds that event stream into
//! the tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use scraper::{ElementRef, Html};
use serde::Serialize;
use url::Url;

use crate::cli::{ArchiveDownloadArgs, ArchiveKind, ArchiveListArgs};
use crate::encoding::fix_encoding;
use crate::fetch::{self, FetchError, SiteClient};
use crate::store;
use crate::titles;

/// One archived document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub url: String,
}

/// Theme to sub-theme to entries; the empty key collects entries filed
/// directly under a theme.
pub type ArchiveTree = BTreeMap<String, BTreeMap<String, Vec<ArchiveEntry>>>;

/// Structural anchor met while scanning an index page, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// `<span>` whose direct child is `<b>`: a theme header.
    Theme(String),
    /// Any other `<span>`: a sub-theme label.
    SubTheme(String),
    /// `<ul>` opening; entries may follow.
    ListStart,
    /// `<a href>` candidate entry.
    Entry { name: String, href: String },
}

fn index_path(kind: ArchiveKind) -> &'static str {
    match kind {
        ArchiveKind::Exercises => "Archives/ExercicesCorriges.html",
        ArchiveKind::Lessons => "Archives/Cours.html",
    }
}

/// Element text, concatenated and trimmed.
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// Scan an index page into its structural events. Only document order
/// matters; the (broken) element containment is ignored.
pub fn scan_index(html: &str) -> Vec<ScanEvent> {
    let document = Html::parse_document(html);
    let mut events = Vec::new();
    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        match element.value().name() {
            "span" => {
                let bold = element
                    .children()
                    .filter_map(ElementRef::wrap)
                    .find(|child| child.value().name() == "b");
                match bold {
                    Some(bold) => events.push(ScanEvent::Theme(stripped_text(bold))),
                    None => events.push(ScanEvent::SubTheme(stripped_text(element))),
                }
            }
            "ul" => events.push(ScanEvent::ListStart),
            "a" => {
                if let Some(href) = element.value().attr("href") {
                    events.push(ScanEvent::Entry {
                        name: stripped_text(element),
                        href: href.to_owned(),
                    });
                }
            }
            _ => {}
        }
    }
    events
}

/// Fold scan events into the archive tree.
///
/// Everything before the first theme is navigation chrome and dropped.
/// Entries only count once a list has opened under the current theme or
/// sub-theme. A re-appearing theme name merges into the existing theme.
pub fn fold_events(events: Vec<ScanEvent>, archives_base: &str) -> ArchiveTree {
    let mut tree = ArchiveTree::new();
    let mut theme: Option<String> = None;
    let mut subtheme = String::new();
    let mut in_list = false;

    for event in events {
        match event {
            ScanEvent::Theme(name) => {
                let name = fix_encoding(&name);
                tree.entry(name.clone()).or_default();
                theme = Some(name);
                subtheme = String::new();
                in_list = false;
            }
            ScanEvent::SubTheme(name) => {
                let Some(theme) = &theme else {
                    continue;
                };
                subtheme = fix_encoding(&name);
                tree.entry(theme.clone()).or_default().entry(subtheme.clone()).or_default();
                in_list = false;
            }
            ScanEvent::ListStart => {
                if theme.is_some() {
                    in_list = true;
                }
            }
            ScanEvent::Entry { name, href } => {
                let Some(theme) = &theme else {
                    continue;
                };
                if !in_list {
                    continue;
                }
                let name = titles::capitalize_first(&fix_encoding(&name));
                tree.entry(theme.clone())
                    .or_default()
                    .entry(subtheme.clone())
                    .or_default()
                    .push(ArchiveEntry { name, url: format!("{archives_base}{href}") });
            }
        }
    }

    // A theme that never grouped anything still reports its ungrouped slot.
    for subthemes in tree.values_mut() {
        if subthemes.is_empty() {
            subthemes.insert(String::new(), Vec::new());
        }
    }

    tree
}

/// Fetch one archive index and build its tree. An index without theme
/// headers yields an empty tree; only transport failures are errors.
pub async fn find_archives(
    client: &SiteClient,
    kind: ArchiveKind,
) -> Result<ArchiveTree, FetchError> {
    let page = client.get_page(client.site_url(index_path(kind))?).await?;
    let archives_base = client.site_url("Archives/")?;
    let events = scan_index(&page.text_declared());
    Ok(fold_events(events, archives_base.as_str()))
}

pub async fn list(args: ArchiveListArgs) -> anyhow::Result<()> {
    let client = fetch::client_from(&args.base_url, args.timeout_secs, 0)?;
    let tree = find_archives(&client, args.kind).await.context("fetch archive index")?;
    let json = serde_json::to_string_pretty(&tree).context("serialize archive tree")?;
    println!("{json}");
    Ok(())
}

pub async fn download(args: ArchiveDownloadArgs) -> anyhow::Result<()> {
    let client = fetch::client_from(&args.base_url, args.timeout_secs, args.delay_ms)?;
    let out_dir = PathBuf::from(&args.out);
    let tree = find_archives(&client, args.kind).await.context("fetch archive index")?;
    tracing::info!(themes = tree.len(), "archive index read");

    let mut downloaded = 0usize;
    let mut failed = 0usize;
    for (theme, subthemes) in &tree {
        for (subtheme, entries) in subthemes {
            let dir = store::archive_dir(&out_dir, theme, subtheme);
            for entry in entries {
                client.pause().await;
                match download_entry(&client, &dir, entry).await {
                    Ok(path) => {
                        downloaded += 1;
                        tracing::debug!(path = %path.display(), "saved archive entry");
                    }
                    Err(err) => {
                        failed += 1;
                        tracing::warn!(entry = %entry.name, error = %err, "skip archive entry");
                    }
                }
            }
        }
    }

    tracing::info!(downloaded, failed, "archive download complete");
    Ok(())
}

async fn download_entry(
    client: &SiteClient,
    dir: &Path,
    entry: &ArchiveEntry,
) -> anyhow::Result<PathBuf> {
    let url = Url::parse(&entry.url).with_context(|| format!("parse entry url: {}", entry.url))?;
    let bytes = client.get_bytes(url).await?;
    let path = dir.join(titles::archive_filename(&entry.name));
    store::save_pdf(&path, &bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://site.test/Archives/";

    fn entry(name: &str, href: &str) -> ArchiveEntry {
        ArchiveEntry { name: name.to_owned(), url: format!("{BASE}{href}") }
    }

    // Shaped like the real pages: <li> never closes, sub-theme lists visually
    // nest inside the theme list.
    const INDEX: &str = r#"<html><body>
        <p>Archives des exercices</p>
        <a href="../index.html">Accueil</a>
        <ul>
          <li><span><b><i>Mécanique</i></b></span>
            <ul>
              <li><span>Cinématique</span>
                <ul>
                  <li><a href="exo1.pdf">exercice sur la vitesse</a>
                  <li><a href="exo2.pdf">chute libre</a>
                </ul>
              <li><span>Dynamique</span>
                <ul>
                  <li><a href="exo3.pdf">énergie et travail</a>
                </ul>
            </ul>
          <li><span><b>Thermodynamique</b></span>
            <ul>
              <li><a href="exo4.pdf">gaz parfait</a>
            </ul>
        </ul>
      </body></html>"#;

    #[test]
    fn scan_reports_anchors_in_source_order() {
        let events = scan_index(INDEX);
        assert_eq!(
            events,
            vec![
                ScanEvent::Entry { name: "Accueil".into(), href: "../index.html".into() },
                ScanEvent::ListStart,
                ScanEvent::Theme("Mécanique".into()),
                ScanEvent::ListStart,
                ScanEvent::SubTheme("Cinématique".into()),
                ScanEvent::ListStart,
                ScanEvent::Entry { name: "exercice sur la vitesse".into(), href: "exo1.pdf".into() },
                ScanEvent::Entry { name: "chute libre".into(), href: "exo2.pdf".into() },
                ScanEvent::SubTheme("Dynamique".into()),
                ScanEvent::ListStart,
                ScanEvent::Entry { name: "énergie et travail".into(), href: "exo3.pdf".into() },
                ScanEvent::Theme("Thermodynamique".into()),
                ScanEvent::ListStart,
                ScanEvent::Entry { name: "gaz parfait".into(), href: "exo4.pdf".into() },
            ]
        );
    }

    #[test]
    fn fold_groups_by_theme_and_subtheme() {
        let tree = fold_events(scan_index(INDEX), BASE);

        let mecanique = &tree["Mécanique"];
        assert_eq!(
            mecanique["Cinématique"],
            vec![
                entry("Exercice sur la vitesse", "exo1.pdf"),
                entry("Chute libre", "exo2.pdf"),
            ]
        );
        assert_eq!(mecanique["Dynamique"], vec![entry("Énergie et travail", "exo3.pdf")]);

        // Thermodynamique has no sub-theme: entries land under the empty key.
        assert_eq!(tree["Thermodynamique"][""], vec![entry("Gaz parfait", "exo4.pdf")]);
    }

    #[test]
    fn navigation_before_the_first_theme_is_dropped() {
        let tree = fold_events(scan_index(INDEX), BASE);
        let all: Vec<&ArchiveEntry> =
            tree.values().flat_map(|s| s.values()).flatten().collect();
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|e| !e.url.contains("index.html")));
    }

    #[test]
    fn repeated_theme_headers_merge() {
        let events = vec![
            ScanEvent::Theme("Ondes".into()),
            ScanEvent::SubTheme("Son".into()),
            ScanEvent::ListStart,
            ScanEvent::Entry { name: "tuyaux".into(), href: "a.pdf".into() },
            ScanEvent::Theme("Ondes".into()),
            ScanEvent::ListStart,
            ScanEvent::Entry { name: "lumière".into(), href: "b.pdf".into() },
        ];
        let tree = fold_events(events, BASE);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree["Ondes"]["Son"], vec![entry("Tuyaux", "a.pdf")]);
        assert_eq!(tree["Ondes"][""], vec![entry("Lumière", "b.pdf")]);
    }

    #[test]
    fn entries_outside_any_list_are_ignored() {
        let events = vec![
            ScanEvent::Theme("Ondes".into()),
            ScanEvent::Entry { name: "hors liste".into(), href: "x.pdf".into() },
        ];
        let tree = fold_events(events, BASE);
        assert_eq!(tree["Ondes"][""], Vec::<ArchiveEntry>::new());
    }

    #[test]
    fn theme_without_content_still_gets_its_ungrouped_slot() {
        let tree = fold_events(vec![ScanEvent::Theme("Vide".into())], BASE);
        assert_eq!(tree["Vide"].len(), 1);
        assert!(tree["Vide"].contains_key(""));
    }

    #[test]
    fn mojibake_in_labels_is_repaired() {
        let events = vec![
            ScanEvent::Theme("MÃ©canique".into()),
            ScanEvent::SubTheme("CinÃ©matique".into()),
            ScanEvent::ListStart,
            ScanEvent::Entry { name: "Ã©nergie".into(), href: "e.pdf".into() },
        ];
        let tree = fold_events(events, BASE);
        assert_eq!(tree["Mécanique"]["Cinématique"], vec![entry("Énergie", "e.pdf")]);
    }

    #[test]
    fn empty_page_yields_empty_tree() {
        assert!(fold_events(scan_index("<html><body></body></html>"), BASE).is_empty());
    }
}
