//! Event catalog: ordered event names from the iteration descriptor.
//!
//! Order is document order. The first event seeds the master mesh directory, so
//! the order returned here is load-bearing.

use crate::error::{OrchestratorError, Result};
use crate::system::MESH_DIR_NAME;
use std::fs;
use std::path::Path;

/// Reads `event/event_name` text nodes under the descriptor root, in order.
///
/// Duplicate names are kept as-is.
pub fn events_for_iteration(descriptor: &Path) -> Result<Vec<String>> {
    if !descriptor.exists() {
        return Err(OrchestratorError::MissingDescriptor {
            path: descriptor.to_path_buf(),
        });
    }

    let content = fs::read_to_string(descriptor).map_err(|e| {
        OrchestratorError::MalformedDescriptor {
            path: descriptor.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    parse_event_names(&content).map_err(|reason| OrchestratorError::MalformedDescriptor {
        path: descriptor.to_path_buf(),
        reason,
    })
}

/// Parse descriptor text. Errors are the parser's message.
pub fn parse_event_names(content: &str) -> std::result::Result<Vec<String>, String> {
    let doc = roxmltree::Document::parse(content).map_err(|e| e.to_string())?;

    let mut events = Vec::new();
    for event in doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("event"))
    {
        for name in event.children().filter(|n| n.has_tag_name("event_name")) {
            let text = name.text().map(str::trim).unwrap_or_default();
            if !is_valid_event_name(text) {
                return Err(format!("unusable event_name '{}'", text));
            }
            events.push(text.to_string());
        }
    }

    log::debug!("[Catalog] Found {} events", events.len());
    Ok(events)
}

/// Event names become directory names; reject anything that is not a single path
/// component, and the name reserved for the master mesh directory.
fn is_valid_event_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name != MESH_DIR_NAME
        && !name.contains('/')
        && !name.contains(std::path::MAIN_SEPARATOR)
}
