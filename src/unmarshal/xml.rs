use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::UnmarshalError;

/// SEC-003: Maximum element nesting depth. Real feeds stay under ten levels.
pub const MAX_DEPTH: usize = 64;

/// A namespace-agnostic XML element: names are local names (`sparkle:version`
/// is stored as `version`), text is the concatenated, trimmed character data.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// First non-empty value of the attribute with this local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Trimmed text of the first child with this name that has any.
    /// The result borrows from `self` only, not from `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .filter(|child| child.name == name)
            .map(|child| child.text.trim())
            .find(|text| !text.is_empty())
    }
}

/// Reads a whole document into an [`Element`] tree under a synthetic root.
///
/// Any syntax error, including elements still open at end of input, is
/// returned as [`UnmarshalError::Syntax`].
pub(crate) fn parse_document(content: &[u8]) -> Result<Element, UnmarshalError> {
    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations; custom
    // entity references fail in `unescape()` instead of resolving.
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                // SEC-003: the synthetic root occupies one slot
                if stack.len() > MAX_DEPTH {
                    return Err(UnmarshalError::TooDeep(MAX_DEPTH));
                }
                stack.push(element_from(&e, &reader));
            }
            Ok(Event::Empty(e)) => {
                let element = element_from(&e, &reader);
                current(&mut stack).children.push(element);
            }
            Ok(Event::End(e)) => {
                if stack.len() < 2 {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(quick_xml::Error::IllFormed(IllFormedError::UnmatchedEndTag(name)).into());
                }
                if let Some(element) = stack.pop() {
                    current(&mut stack).children.push(element);
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape()?;
                push_text(current(&mut stack), &text);
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                push_text(current(&mut stack), &String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(UnmarshalError::Syntax(e)),
            _ => {}
        }
        buf.clear();
    }

    if stack.len() > 1 {
        let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(open)).into());
    }

    Ok(stack.pop().unwrap_or_default())
}

fn current(stack: &mut [Element]) -> &mut Element {
    stack
        .last_mut()
        .expect("element stack always holds the synthetic root")
}

fn push_text(element: &mut Element, text: &str) {
    if !element.text.is_empty() {
        element.text.push(' ');
    }
    element.text.push_str(text);
}

fn element_from(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Element {
    let mut attributes = Vec::new();

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed feed attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => attributes.push((key, value.into_owned())),
            Err(e) => {
                tracing::warn!(attribute = %key, error = %e, "Skipping undecodable feed attribute");
            }
        }
    }

    Element {
        name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
        attributes,
        text: String::new(),
        children: Vec::new(),
    }
}
