//! Builders that read and shape the registry document.
//!
//! ```text
//! <slideshowfx>
//!   <recentPresentations>
//!     <recentPresentation>
//!       <id>…</id>
//!       <file>…</file>
//!       <openedDateTime>…</openedDateTime>
//!     </recentPresentation>
//!   </recentPresentations>
//! </slideshowfx>
//! ```

use crate::presentation::{RecentPresentation, format_opened_date_time, parse_opened_date_time};
use crate::tree::{Element, XmlDocument};

pub const ROOT_TAG: &str = "slideshowfx";
pub const RECENT_PRESENTATIONS_TAG: &str = "recentPresentations";
pub const RECENT_PRESENTATION_TAG: &str = "recentPresentation";
pub const ID_TAG: &str = "id";
pub const FILE_TAG: &str = "file";
pub const OPENED_DATE_TIME_TAG: &str = "openedDateTime";

/// A document holding only the root and an empty container.
#[must_use]
pub fn empty_registry() -> XmlDocument {
    let mut document = XmlDocument::new();
    populate_document_if_necessary(&mut document);
    document
}

/// Add the root and container elements when they are missing.
///
/// Calling it on a populated document changes nothing.
pub fn populate_document_if_necessary(document: &mut XmlDocument) {
    recent_presentations_node(document);
}

/// The container of all recent presentations, created on demand.
pub fn recent_presentations_node(document: &mut XmlDocument) -> &mut Element {
    document.get_or_create(ROOT_TAG, &[RECENT_PRESENTATIONS_TAG])
}

/// The container, without creating anything.
pub fn find_recent_presentations_node(document: &XmlDocument) -> Option<&Element> {
    document.root()?.child(RECENT_PRESENTATIONS_TAG)
}

/// Entry elements directly below `container`.
pub fn recent_presentation_nodes(container: &Element) -> Vec<&Element> {
    container.children_named(RECENT_PRESENTATION_TAG).collect()
}

/// Build a detached entry element for `presentation`.
///
/// Returns `None` when the presentation has no opened date, since such an
/// entry could never be read back.
pub fn create_node_from_recent_presentation(presentation: &RecentPresentation) -> Option<Element> {
    let opened = presentation.opened_date_time()?;

    Some(
        Element::new(RECENT_PRESENTATION_TAG).with_children(vec![
            Element::new(ID_TAG).with_text(presentation.id()),
            Element::new(FILE_TAG).with_text(presentation.normalized_path()),
            Element::new(OPENED_DATE_TIME_TAG).with_text(&format_opened_date_time(opened)),
        ]),
    )
}

/// First entry whose `id` matches the id of `presentation`.
pub fn find_recent_presentation_node_from_id<'a>(
    document: &'a XmlDocument,
    presentation: &RecentPresentation,
) -> Option<&'a Element> {
    find_recent_presentations_node(document)?
        .children_named(RECENT_PRESENTATION_TAG)
        .find(|node| has_id(node, presentation.id()))
}

/// Mutable variant of [`find_recent_presentation_node_from_id`].
pub fn find_recent_presentation_node_from_id_mut<'a>(
    document: &'a mut XmlDocument,
    presentation: &RecentPresentation,
) -> Option<&'a mut Element> {
    document
        .root_mut()?
        .child_mut(RECENT_PRESENTATIONS_TAG)?
        .children
        .iter_mut()
        .filter(|node| node.tag == RECENT_PRESENTATION_TAG)
        .find(|node| has_id(node, presentation.id()))
}

fn has_id(node: &Element, id: &str) -> bool {
    node.child(ID_TAG).is_some_and(|child| child.text().trim() == id)
}

/// Rebuild a presentation from an entry element.
///
/// Entries without children, without a `file`, or without a readable
/// `openedDateTime` yield `None`.
pub fn build_recent_presentation_from_node(node: &Element) -> Option<RecentPresentation> {
    if !node.has_children() {
        tracing::debug!("recent presentation entry has no children, skipping");
        return None;
    }

    let mut path = None;
    let mut opened = None;

    for child in node.children() {
        match child.tag.as_str() {
            FILE_TAG if path.is_none() => path = Some(child.text().trim()),
            OPENED_DATE_TIME_TAG if opened.is_none() => opened = Some(child.text()),
            FILE_TAG | OPENED_DATE_TIME_TAG | ID_TAG => {}
            other => tracing::debug!(tag = other, "unsupported recent presentation element"),
        }
    }

    let Some(path) = path else {
        tracing::debug!("recent presentation entry has no file, skipping");
        return None;
    };
    let Some(opened) = opened else {
        tracing::debug!(path, "recent presentation entry has no opened date, skipping");
        return None;
    };
    let Some(opened) = parse_opened_date_time(opened) else {
        tracing::debug!(path, opened, "unreadable opened date, skipping");
        return None;
    };

    RecentPresentation::new(path, Some(opened))
        .inspect_err(|e| tracing::debug!(path, error = %e, "invalid recent presentation path"))
        .ok()
}
