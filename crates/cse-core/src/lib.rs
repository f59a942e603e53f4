//! cse-core: document model, parser and surgical editing for Clausewitz saves
//!
//! This crate focuses on a small, well-factored surface:
//! - Cursor + tree parser recording exact byte spans for every node
//! - Path resolver (`planets.0.planet_size`), first match wins on duplicates
//! - Patch engine that splices one value and leaves every other byte alone
//! - Zip codec that swaps the `gamestate` entry and raw-copies the rest
//! - A locked holder for the save being edited, plus JSON dumps and save discovery
//!
pub mod archive;
pub mod cursor;
pub mod edit;
pub mod error;
pub mod json;
pub mod model;
pub mod path;
pub mod saves;
pub mod script;
pub mod state;

pub use archive::{EntryInfo, GAMESTATE_ENTRY, SaveArchive, backup_file, edited_file_name};
pub use cursor::Span;
pub use edit::{
    FieldPatch, ValueKind, apply_field_patch, apply_field_patches, apply_typed_patch,
    apply_typed_patches, coerce_literal, get_field,
};
pub use error::{EditError, Result};
pub use model::{PlanetSummary, SaveSummary, summary_to_json_value};
pub use path::{FieldPath, find_first, resolve, resolve_all};
pub use script::{NodeId, NodeRef, ParsedDocument};
pub use state::{LoadedSave, SaveStore};
