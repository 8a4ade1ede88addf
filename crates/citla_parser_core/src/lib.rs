//! Normalization engine for the exo Laurentides (CITLA) bus feed.
//!
//! Turns the raw GTFS records into the canonical display model: stable
//! numeric route/stop ids, cleaned labels, split directions for ambiguous
//! routes, and merged headsign variants.

pub mod direction;
pub mod engine;
pub mod error;
pub mod feed;
pub mod headsign;
pub mod ids;
pub mod service;
pub mod text;

pub use direction::{DirectionLeg, DirectionSpec, DirectionSplitter, SplitAssignment};
pub use engine::{
    AgencyProfile, Network, Normalizer, ResolvedRoute, ResolvedStop, ResolvedTrip,
};
pub use error::NormalizeError;
pub use feed::{Feed, FeedError};
pub use headsign::{HeadsignMerger, MergePair};
pub use ids::{display_stop_code, resolve_route_id, resolve_stop_id};
pub use service::{useful_service_ids, ServiceWindow};
pub use text::{Rule, RuleSet, TextNormalizer};
