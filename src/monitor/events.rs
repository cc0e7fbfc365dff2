//! Mapping raw notify events onto pipeline work.

use std::path::PathBuf;

use notify::event::{MetadataKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};

use super::path::is_pdf;

/// What the dispatcher should do with one notify event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRoute {
    /// Run these PDFs through the pipeline.
    Process(Vec<PathBuf>),
    /// The OS dropped events; some changes may have been missed.
    Overflow,
    Ignore,
}

/// Route a create, content change or rename to the PDFs it concerns.
///
/// A rename counts as a create of the new name; the old name is ignored.
/// Removals, access and attribute-only changes are ignored.
pub fn route_event(event: &Event) -> EventRoute {
    if event.need_rescan() {
        return EventRoute::Overflow;
    }

    let candidates: Vec<&PathBuf> = match &event.kind {
        EventKind::Create(_) => event.paths.iter().collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::To => event.paths.iter().collect(),
            // [from, to]
            RenameMode::Both => event.paths.last().into_iter().collect(),
            RenameMode::From => Vec::new(),
            // Backends that cannot tell the two halves apart; keep whatever exists now
            RenameMode::Any | RenameMode::Other => {
                event.paths.iter().filter(|p| p.exists()).collect()
            }
        },
        EventKind::Modify(
            ModifyKind::Any
            | ModifyKind::Data(_)
            | ModifyKind::Metadata(MetadataKind::WriteTime),
        ) => event.paths.iter().collect(),
        _ => Vec::new(),
    };

    let pdfs: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|p| is_pdf(p))
        .cloned()
        .collect();

    if pdfs.is_empty() {
        EventRoute::Ignore
    } else {
        EventRoute::Process(pdfs)
    }
}
