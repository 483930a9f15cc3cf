//! Book validation
//!
//! ISBN: 10 or 13 characters after removing hyphens and spaces, digits only
//! except an ISBN-10 may end in `X`.

use cloudlib_core::Book;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Maximum length for free-text fields
const MAX_TEXT_LEN: usize = 512;

static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{9}[\dX]|\d{13})$").expect("invalid isbn regex"));

/// Validated ISBN, normalised without separators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Isbn(String);

impl Isbn {
    /// Parse an ISBN-10 or ISBN-13.
    ///
    /// # Example
    /// ```
    /// use cloudlib_server::models::Isbn;
    ///
    /// assert_eq!(Isbn::new("978-91-0-018793-4").unwrap().as_str(), "9789100187934");
    /// assert!(Isbn::new("0-306-40615-X").is_ok());
    /// assert!(Isbn::new("12345").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.trim().is_empty() {
            return Err(ValidationError::Empty { field: "isbn" });
        }

        let normalised: String = s
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if !ISBN_RE.is_match(&normalised) {
            return Err(ValidationError::InvalidFormat {
                field: "isbn",
                reason: "must be 10 or 13 digits (ISBN-10 may end in X)",
            });
        }

        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

fn required_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

/// Check one book and rewrite its ISBN to the normalised form, so that
/// `0-306-40615-2` and `0306406152` are the same book to every store.
pub fn validate_book(book: &mut Book) -> Result<(), ValidationError> {
    if book.id < 0 {
        return Err(ValidationError::OutOfRange {
            field: "id",
            reason: "must be 0 for a new book or a positive id",
        });
    }

    let isbn = Isbn::new(&book.isbn)?;
    required_text("title", &book.title)?;
    required_text("lang", &book.lang)?;
    required_text("publisher", &book.publisher)?;

    if book.pages <= 0 {
        return Err(ValidationError::OutOfRange {
            field: "pages",
            reason: "must be greater than 0",
        });
    }

    if book.authors.iter().any(|a| a.trim().is_empty()) {
        return Err(ValidationError::Empty { field: "author" });
    }

    book.isbn = isbn.into_string();
    Ok(())
}

/// Check every book, reporting the first invalid one by index
pub fn validate_batch(books: &mut [Book]) -> Result<(), ValidationError> {
    books
        .iter_mut()
        .enumerate()
        .try_for_each(|(index, book)| validate_book(book).map_err(|e| e.at(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Book {
        Book {
            id: 0,
            isbn: "978-91-0-018793-4".into(),
            title: "Pesten".into(),
            lang: "swedish".into(),
            translator: "Jan Stolpe".into(),
            authors: vec!["Albert Camus".into()],
            pages: 254,
            publisher: "Albert Bonniers".into(),
            published_date: None,
            added_date: None,
        }
    }

    #[test]
    fn isbn_formats() {
        assert!(Isbn::new("9789100187934").is_ok());
        assert!(Isbn::new("978 91 0 018793 4").is_ok());
        assert_eq!(Isbn::new("0-306-40615-x").unwrap().as_str(), "030640615X");

        assert!(matches!(Isbn::new(""), Err(ValidationError::Empty { .. })));
        assert!(matches!(
            Isbn::new("97891001879"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(Isbn::new("X306406152").is_err());
        assert!(Isbn::new("978910018793X").is_err());
    }

    #[test]
    fn accepts_valid_book() {
        let mut book = valid();
        assert_eq!(validate_book(&mut book), Ok(()));
        assert_eq!(book.isbn, "9789100187934");
    }

    #[test]
    fn rejects_missing_required_text() {
        let mut book = valid();
        book.title = "  ".into();
        assert_eq!(
            validate_book(&mut book),
            Err(ValidationError::Empty { field: "title" })
        );

        let mut book = valid();
        book.publisher = String::new();
        assert_eq!(
            validate_book(&mut book),
            Err(ValidationError::Empty { field: "publisher" })
        );
    }

    #[test]
    fn rejects_non_positive_pages() {
        let mut book = valid();
        book.pages = 0;
        assert!(matches!(
            validate_book(&mut book),
            Err(ValidationError::OutOfRange { field: "pages", .. })
        ));
    }

    #[test]
    fn rejects_overlong_title() {
        let mut book = valid();
        book.title = "a".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            validate_book(&mut book),
            Err(ValidationError::TooLong { field: "title", .. })
        ));
    }

    #[test]
    fn batch_normalises_every_isbn() {
        let mut spaced = valid();
        spaced.isbn = "0 306 40615 2".into();
        let mut books = [valid(), spaced];

        validate_batch(&mut books).unwrap();
        assert_eq!(books[0].isbn, "9789100187934");
        assert_eq!(books[1].isbn, "0306406152");
    }

    #[test]
    fn invalid_book_keeps_its_isbn() {
        let mut book = valid();
        book.pages = 0;
        assert!(validate_book(&mut book).is_err());
        assert_eq!(book.isbn, "978-91-0-018793-4");
    }

    #[test]
    fn batch_reports_first_bad_index() {
        let mut bad = valid();
        bad.isbn = "nope".into();
        let err = validate_batch(&mut [valid(), valid(), bad]).unwrap_err();

        match err {
            ValidationError::InBatch { index, .. } => assert_eq!(index, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
