/// Fatal normalization failures.
///
/// The engine's correctness rests on closed, exhaustively enumerated sets
/// (id prefixes and suffixes, merge pairs, direction specs). An input outside
/// those sets means the enumeration is stale relative to the source feed, so
/// every variant aborts the run; the message names the offending record so a
/// maintainer can extend the right table.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("unexpected route id {route_id:?} (short name {short_name:?}): no digits or unrecognized prefix")]
    UnresolvedRouteId {
        route_id: String,
        short_name: String,
    },

    #[error("unexpected stop id {stop_id:?} (code {stop_code:?}): unrecognized prefix, suffix, or no digits")]
    UnresolvedStopId { stop_id: String, stop_code: String },

    #[error("no merge rule for headsigns {left:?} / {right:?} on route {route_id} direction {direction}")]
    UnmergeableHeadsigns {
        route_id: i64,
        direction: u8,
        left: String,
        right: String,
    },

    #[error("stale direction spec for route {route_id}: trip {trip_id:?} visits none of the listed stops")]
    StaleDirectionSpec { route_id: i64, trip_id: String },
}
