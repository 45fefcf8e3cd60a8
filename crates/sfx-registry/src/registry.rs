//! Stream-level registry operations.
//!
//! Each operation reads the complete current registry from `input`, works on
//! the in-memory document and, when it mutates, writes the complete new
//! registry to `output`. Streams stay owned by the caller.
//!
//! Empty input is a registry without entries. Any other input that is not a
//! well-formed document fails with [`RegistryError::MalformedDocument`].

use std::collections::{BTreeSet, HashSet};
use std::io::{Read, Write};

use crate::document::{
    OPENED_DATE_TIME_TAG, RECENT_PRESENTATION_TAG, build_recent_presentation_from_node,
    create_node_from_recent_presentation, find_recent_presentation_node_from_id,
    find_recent_presentation_node_from_id_mut, find_recent_presentations_node,
    populate_document_if_necessary, recent_presentation_nodes, recent_presentations_node,
};
use crate::error::RegistryError;
use crate::ordering::RecencyRank;
use crate::presentation::{RecentPresentation, format_opened_date_time};
use crate::tree::XmlDocument;

/// Read every valid presentation, in path order.
///
/// Entries missing a file or a readable opened date are skipped. When a path
/// is listed more than once, the first entry wins.
pub fn read_all(input: impl Read) -> Result<BTreeSet<RecentPresentation>, RegistryError> {
    let document = XmlDocument::read_from(input)?;

    let mut presentations = BTreeSet::new();
    if let Some(container) = find_recent_presentations_node(&document) {
        for node in recent_presentation_nodes(container) {
            if let Some(presentation) = build_recent_presentation_from_node(node) {
                presentations.insert(presentation);
            }
        }
    }

    tracing::debug!(count = presentations.len(), "read recent presentations");
    Ok(presentations)
}

/// Append `presentation` to the registry.
///
/// A presentation without opened date is not persisted: nothing is written
/// to `output`, whatever `input` holds. No duplicate check is made; use
/// [`exists`] and [`update`] for presentations already registered.
pub fn save(
    input: impl Read,
    mut output: impl Write,
    presentation: &RecentPresentation,
) -> Result<(), RegistryError> {
    let Some(node) = create_node_from_recent_presentation(presentation) else {
        tracing::debug!(
            path = presentation.normalized_path(),
            "presentation has no opened date, not saving"
        );
        return Ok(());
    };

    let mut document = XmlDocument::read_from(input)?;
    populate_document_if_necessary(&mut document);
    recent_presentations_node(&mut document).children.push(node);

    document.write_to(&mut output)?;
    tracing::debug!(path = presentation.normalized_path(), "saved recent presentation");
    Ok(())
}

/// Refresh the opened date of a registered presentation.
///
/// Only the `openedDateTime` of the first entry with the same id changes.
/// A presentation that is not registered yet is appended as [`save`] would.
/// A presentation without opened date writes nothing.
pub fn update(
    input: impl Read,
    mut output: impl Write,
    presentation: &RecentPresentation,
) -> Result<(), RegistryError> {
    let Some(opened) = presentation.opened_date_time() else {
        tracing::debug!(
            path = presentation.normalized_path(),
            "presentation has no opened date, not updating"
        );
        return Ok(());
    };

    let mut document = XmlDocument::read_from(input)?;
    populate_document_if_necessary(&mut document);

    let updated = match find_recent_presentation_node_from_id_mut(&mut document, presentation) {
        Some(node) => {
            node.get_or_create_child(OPENED_DATE_TIME_TAG)
                .set_text(format_opened_date_time(opened));
            true
        }
        None => false,
    };

    if !updated {
        tracing::debug!(
            path = presentation.normalized_path(),
            "presentation not registered yet, appending it"
        );
        if let Some(node) = create_node_from_recent_presentation(presentation) {
            recent_presentations_node(&mut document).children.push(node);
        }
    }

    document.write_to(&mut output)?;
    Ok(())
}

/// Whether an entry with the id of `presentation` is registered.
pub fn exists(input: impl Read, presentation: &RecentPresentation) -> Result<bool, RegistryError> {
    let document = XmlDocument::read_from(input)?;
    Ok(find_recent_presentation_node_from_id(&document, presentation).is_some())
}

/// Keep only the `keep_count` most recently opened presentations.
///
/// Invalid entries are always removed. Surviving entries keep their
/// position and content; other elements inside the container are left
/// alone. The document is rewritten even when nothing is removed.
///
/// The returned set is in path order, which says nothing about recency.
pub fn purge(
    input: impl Read,
    mut output: impl Write,
    keep_count: usize,
) -> Result<BTreeSet<RecentPresentation>, RegistryError> {
    let mut document = XmlDocument::read_from(input)?;
    let container = recent_presentations_node(&mut document);

    let mut ranked: Vec<(usize, RecentPresentation)> = container
        .children
        .iter()
        .enumerate()
        .filter(|(_, node)| node.tag == RECENT_PRESENTATION_TAG)
        .filter_map(|(index, node)| build_recent_presentation_from_node(node).map(|p| (index, p)))
        .collect();
    ranked.sort_by(|(_, a), (_, b)| RecencyRank::compare(a, b));

    let mut retained = BTreeSet::new();
    let mut retained_nodes = HashSet::new();
    for (index, presentation) in ranked {
        if retained.len() >= keep_count {
            break;
        }
        if retained.insert(presentation) {
            retained_nodes.insert(index);
        }
    }

    let before = container.children.len();
    let mut index = 0;
    container.children.retain(|node| {
        let keep = node.tag != RECENT_PRESENTATION_TAG || retained_nodes.contains(&index);
        index += 1;
        keep
    });

    tracing::info!(
        kept = retained.len(),
        removed = before - container.children.len(),
        keep_count,
        "purged recent presentations"
    );

    document.write_to(&mut output)?;
    Ok(retained)
}
