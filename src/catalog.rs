use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

/// One of the five course volumes, identified on the site by letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BookId {
    A,
    B,
    C,
    D,
    E,
}

impl BookId {
    pub const ALL: [BookId; 5] = [BookId::A, BookId::B, BookId::C, BookId::D, BookId::E];

    /// Ordinal used in page URLs (A is 1, E is 5).
    pub fn index(self) -> u32 {
        self as u32 + 1
    }

    pub fn letter(self) -> char {
        match self {
            BookId::A => 'A',
            BookId::B => 'B',
            BookId::C => 'C',
            BookId::D => 'D',
            BookId::E => 'E',
        }
    }

    pub fn from_letter(letter: char) -> Option<BookId> {
        match letter.to_ascii_uppercase() {
            'A' => Some(BookId::A),
            'B' => Some(BookId::B),
            'C' => Some(BookId::C),
            'D' => Some(BookId::D),
            'E' => Some(BookId::E),
            _ => None,
        }
    }

    /// Number of chapters the site publishes for this book.
    pub fn max_chapter(self) -> u32 {
        match self {
            BookId::A => 10,
            BookId::B => 22,
            BookId::C => 13,
            BookId::D => 12,
            BookId::E => 11,
        }
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Books mapped to the chapters to process, ordered and deduplicated.
pub type Selection = BTreeMap<BookId, BTreeSet<u32>>;

/// Every chapter of every book.
pub fn full_catalog() -> Selection {
    BookId::ALL
        .iter()
        .map(|&book| (book, (1..=book.max_chapter()).collect()))
        .collect()
}

/// Chapter number as it appears in page URLs: single digits are zero-padded.
pub fn chapter_url_token(chapter: u32) -> String {
    format!("{chapter:02}")
}

/// Site-relative path of a book page (`chapter` absent) or a chapter page.
pub fn page_path(book: BookId, chapter: Option<u32>) -> String {
    match chapter {
        Some(chapter) => format!("page{}{}.html", book.index(), chapter_url_token(chapter)),
        None => format!("page{}.html", book.index()),
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown book {letter:?} in selection {spec:?} (expected A-E)")]
    UnknownBook { letter: String, spec: String },
    #[error("empty chapter list in selection {spec:?}")]
    EmptyChapters { spec: String },
    #[error("invalid chapter {value:?} in selection {spec:?}")]
    BadChapter { value: String, spec: String },
    #[error("chapter {chapter} out of range for book {book} (1-{max})")]
    ChapterOutOfRange { chapter: u32, book: BookId, max: u32 },
    #[error("invalid chapter range {range:?} in selection {spec:?}")]
    BadRange { range: String, spec: String },
}

/// Parse `BOOK[:CHAPTERS]` specs such as `A`, `B:3` or `C:1,4-6`.
///
/// Specs naming the same book merge into one chapter set.
pub fn parse_selection(specs: &[String]) -> Result<Selection, SelectionError> {
    let mut selection = Selection::new();
    for spec in specs {
        let (book_part, chapter_part) = match spec.split_once(':') {
            Some((book, chapters)) => (book.trim(), Some(chapters.trim())),
            None => (spec.trim(), None),
        };
        let book = parse_book(book_part, spec)?;
        let chapters = selection.entry(book).or_default();
        match chapter_part {
            None => {
                chapters.extend(1..=book.max_chapter());
            }
            Some("") => {
                return Err(SelectionError::EmptyChapters { spec: spec.clone() });
            }
            Some(list) => {
                for part in list.split(',') {
                    parse_chapter_part(part.trim(), book, spec, chapters)?;
                }
            }
        }
    }
    Ok(selection)
}

fn parse_book(text: &str, spec: &str) -> Result<BookId, SelectionError> {
    let mut chars = text.chars();
    if let (Some(letter), None) = (chars.next(), chars.next())
        && let Some(book) = BookId::from_letter(letter)
    {
        return Ok(book);
    }
    Err(SelectionError::UnknownBook { letter: text.to_owned(), spec: spec.to_owned() })
}

fn parse_chapter_part(
    part: &str,
    book: BookId,
    spec: &str,
    chapters: &mut BTreeSet<u32>,
) -> Result<(), SelectionError> {
    if let Some((low, high)) = part.split_once('-') {
        let low = parse_chapter(low.trim(), book, spec)?;
        let high = parse_chapter(high.trim(), book, spec)?;
        if low > high {
            return Err(SelectionError::BadRange { range: part.to_owned(), spec: spec.to_owned() });
        }
        chapters.extend(low..=high);
    } else {
        chapters.insert(parse_chapter(part, book, spec)?);
    }
    Ok(())
}

fn parse_chapter(text: &str, book: BookId, spec: &str) -> Result<u32, SelectionError> {
    let chapter: u32 = text
        .parse()
        .map_err(|_| SelectionError::BadChapter { value: text.to_owned(), spec: spec.to_owned() })?;
    if chapter < 1 || chapter > book.max_chapter() {
        return Err(SelectionError::ChapterOutOfRange {
            chapter,
            book,
            max: book.max_chapter(),
        });
    }
    Ok(chapter)
}
