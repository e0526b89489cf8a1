//! Delimiter-bounded extraction from the semi-structured text routers serve.
//!
//! Admin firmware rarely offers an API: the values the UI displays sit inside
//! inline `<script>` assignments, attribute strings, and hand-delimited blobs.
//! Drivers cut them out with marker pairs and get a typed failure back when a
//! firmware update moved the furniture.

use crate::error::{Error, Result};

/// Returns the text between `start` and the next `end` after it.
///
/// The first occurrence of `start` wins. A missing marker is reported as
/// [`Error::MarkerNotFound`] naming the marker that was absent.
pub fn between<'t>(text: &'t str, start: &'static str, end: &'static str) -> Result<&'t str> {
    let from = text.find(start).ok_or(Error::MarkerNotFound(start))? + start.len();
    let len = text[from..].find(end).ok_or(Error::MarkerNotFound(end))?;
    Ok(&text[from..from + len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_between_markers() {
        let page = "<script>var soft_ver='CAC003-31.30L.86';</script>";
        assert_eq!(between(page, "var soft_ver='", "'").unwrap(), "CAC003-31.30L.86");
    }

    #[test]
    fn first_start_marker_wins() {
        let text = "a='one' a='two'";
        assert_eq!(between(text, "a='", "'").unwrap(), "one");
    }

    #[test]
    fn empty_value_is_fine() {
        assert_eq!(between("key=''", "key='", "'").unwrap(), "");
    }

    #[test]
    fn missing_start_marker() {
        match between("nothing here", "var soft_ver='", "'") {
            Err(Error::MarkerNotFound(marker)) => assert_eq!(marker, "var soft_ver='"),
            other => panic!("expected MarkerNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_end_marker() {
        match between("var soft_ver='oops", "var soft_ver='", "'") {
            Err(Error::MarkerNotFound(marker)) => assert_eq!(marker, "'"),
            other => panic!("expected MarkerNotFound, got {other:?}"),
        }
    }

    #[test]
    fn end_marker_before_start_does_not_count() {
        // The end delimiter must follow the start marker, not precede it.
        assert!(between("' var x='abc", "var x='", "'").is_err());
    }
}
