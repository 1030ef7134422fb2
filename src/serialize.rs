//! Document serialization

use kuchiki::NodeRef;

use crate::error::InlineResult;

/// Serialize a document tree to its final self-contained markup
pub fn serialize_document(document: &NodeRef) -> InlineResult<String> {
    let mut output = Vec::new();
    document.serialize(&mut output)?;
    Ok(String::from_utf8(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchiki::traits::TendrilSink;

    #[test]
    fn test_serialize_round_trips_markup() {
        let document =
            kuchiki::parse_html().one("<html><body><p>hello</p></body></html>".to_string());
        let html = serialize_document(&document).unwrap();
        assert!(html.contains("<p>hello</p>"));
    }
}
