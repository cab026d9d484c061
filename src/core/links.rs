//! Page modes carried in query strings (`?id=…&edit=true`, `?fromQuote=…`, `?share=…`).

use std::fmt;

use percent_encoding::percent_decode_str;

use crate::domain::EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    NewProject,
    ViewProject(EntityId),
    EditProject(EntityId),
    InvoiceFromQuote(EntityId),
    SharedWishlist(String),
}

impl PageRequest {
    /// Parses a query string, with or without its leading `?`.
    ///
    /// `share` and `fromQuote` take precedence over project parameters. A
    /// project id opens the editor when `edit=true`, the read-only view
    /// otherwise; no id means a new project.
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        let query = query
            .split_once('?')
            .map(|(_, rest)| rest)
            .unwrap_or(query);
        let query = query.split('#').next().unwrap_or_default();

        let mut id = None;
        let mut edit = false;
        let mut from_quote = None;
        let mut share = None;
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode(value);
            match percent_decode(key).as_str() {
                "id" if !value.trim().is_empty() => id = Some(value),
                "edit" => edit = is_true(&value),
                "fromQuote" if !value.trim().is_empty() => from_quote = Some(value),
                "share" if !value.trim().is_empty() => share = Some(value),
                _ => {}
            }
        }

        if let Some(token) = share {
            return PageRequest::SharedWishlist(token.trim().to_string());
        }
        if let Some(quote) = from_quote {
            return PageRequest::InvoiceFromQuote(EntityId::from(quote));
        }
        match id {
            Some(id) if edit => PageRequest::EditProject(EntityId::from(id)),
            Some(id) => PageRequest::ViewProject(EntityId::from(id)),
            None => PageRequest::NewProject,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            PageRequest::ViewProject(_) | PageRequest::SharedWishlist(_)
        )
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRequest::NewProject => f.write_str("new project"),
            PageRequest::ViewProject(id) => write!(f, "view project {}", id),
            PageRequest::EditProject(id) => write!(f, "edit project {}", id),
            PageRequest::InvoiceFromQuote(id) => write!(f, "invoice from quote {}", id),
            PageRequest::SharedWishlist(token) => write!(f, "shared wishlist {}", token),
        }
    }
}

fn is_true(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Decodes `%XX` escapes and `+` as space. Malformed escapes are kept as-is.
fn percent_decode(input: &str) -> String {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_modes() {
        assert_eq!(PageRequest::parse(""), PageRequest::NewProject);
        assert_eq!(PageRequest::parse("?id="), PageRequest::NewProject);
        assert_eq!(
            PageRequest::parse("?id=1699999999999"),
            PageRequest::ViewProject("1699999999999".into())
        );
        assert_eq!(
            PageRequest::parse("?id=42&view=true"),
            PageRequest::ViewProject("42".into())
        );
        assert_eq!(
            PageRequest::parse("?view=true&id=42&edit=true"),
            PageRequest::EditProject("42".into())
        );
        assert_eq!(
            PageRequest::parse("https://example.test/projet.html?edit=1&id=7#top"),
            PageRequest::EditProject("7".into())
        );
    }

    #[test]
    fn quotes_and_shares() {
        assert_eq!(
            PageRequest::parse("fromQuote=abc&id=9"),
            PageRequest::InvoiceFromQuote("abc".into())
        );
        assert_eq!(
            PageRequest::parse("?share=tok%20en+x&utm=mail"),
            PageRequest::SharedWishlist("tok en x".into())
        );
        assert!(PageRequest::parse("?share=t").is_read_only());
    }

    #[test]
    fn decoding_keeps_malformed_escapes() {
        assert_eq!(percent_decode("a%2Fb"), "a/b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
        assert_eq!(percent_decode("a%2F"), "a/");
        assert_eq!(percent_decode("%2B+1"), "+ 1");
    }
}
