//! Maintenance-bot core for a Blaseball fan wiki: classifies pages that are
//! missing a references list, computes where the list belongs, and carries a
//! small classifier for game-event outcome text. All logic here is pure text
//! transformation; reading pages and persisting edits belongs to the caller.

pub mod config;
pub mod disabled;
pub mod events;
pub mod placer;
pub mod scan;

pub use config::{SiteConfig, SiteRegistry, load_registry};
pub use disabled::{DisabledRegions, remove_disabled_parts};
pub use events::{OutcomeKind, OutcomeMatch, classify_outcome, render_game_event};
pub use placer::{Classification, Placement, ReasonCode, ReferenceSectionPlacer};
pub use scan::{ProposedEdit, ReviewDecision, ScanReport, collect_edits, review_edits, scan_pages};
