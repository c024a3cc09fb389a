//! Listing-to-model matching: text extraction, fuzzy scoring, and
//! colorway grouping.
//!
//! Everything in this crate is pure — no I/O, no clock, no store access.
//! The pipeline feeds it [`batdb_core::RawListing`]s and a target
//! [`batdb_core::ModelIdentity`] and gets back scored, grouped candidates.

pub mod colorway;
pub mod extract;
pub mod group;
pub mod score;
pub mod sizes;

pub use colorway::{colorways_match, extract_colorway};
pub use extract::Extractor;
pub use group::select_group;
pub use score::{rank_candidates, score_match, MatchCandidate, MatchOutcome, MATCH_THRESHOLD};
pub use sizes::{parse_size_text, sizes_from_listing};
