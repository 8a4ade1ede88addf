//! Direction splitting for routes with ambiguous headsigns.
//!
//! A few routes report the identical headsign text for both physical
//! directions, so the direction can never be inferred from the label. For
//! those routes a registered spec fixes the two logical directions: each has
//! a canonical headsign and a canonical stop-visit sequence used both to
//! assign trips and to order their stops.

use rustc_hash::FxHashMap;

use crate::error::NormalizeError;
use crate::text::TextNormalizer;

/// One logical direction of a split route.
#[derive(Debug, Clone)]
pub struct DirectionLeg {
    pub headsign: String,
    pub stops: Vec<i64>,
}

/// The two directions of one registered route.
#[derive(Debug, Clone)]
pub struct DirectionSpec {
    pub legs: [DirectionLeg; 2],
}

/// The splitter's verdict for one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub direction: u8,
    pub headsign: String,
    pub stop_order: Vec<i64>,
}

#[derive(Debug, Default)]
pub struct DirectionSplitter {
    specs: FxHashMap<i64, DirectionSpec>,
}

impl DirectionSplitter {
    pub fn new(specs: impl IntoIterator<Item = (i64, DirectionSpec)>) -> Self {
        Self {
            specs: specs.into_iter().collect(),
        }
    }

    /// The CITLA table. Canonical headsigns go through the headsign pipeline
    /// here so the splitter always emits display-form text.
    pub fn citla(normalizer: &TextNormalizer) -> Self {
        let spec = |legs: [(&str, &[i64]); 2]| DirectionSpec {
            legs: legs.map(|(headsign, stops)| DirectionLeg {
                headsign: normalizer.clean_trip_headsign(headsign),
                stops: stops.to_vec(),
            }),
        };
        Self::new([
            (
                9,
                spec([
                    ("Terminus / St-Eustache", &[74_001, 74_003, 74_005, 203_123]),
                    ("Boisbriand Nord", &[203_123, 74_006, 74_004, 74_002]),
                ]),
            ),
            (
                59,
                spec([
                    ("Gare Rosemère", &[75_010, 75_012, 401_001]),
                    ("Gare St-Jérôme", &[401_001, 75_013, 75_011]),
                ]),
            ),
        ])
    }

    pub fn is_registered(&self, route_id: i64) -> bool {
        self.specs.contains_key(&route_id)
    }

    /// Assigns a trip to a direction and orders its stops.
    ///
    /// The direction whose canonical sequence shares more stops with the
    /// visited set wins (ties go to direction 0). Visited stops keep their
    /// canonical position; stops absent from the canonical list follow in
    /// source visit order. Zero overlap with both legs means the registered
    /// spec is stale relative to the feed.
    pub fn assign(
        &self,
        route_id: i64,
        trip_id: &str,
        visited: &[i64],
    ) -> Result<SplitAssignment, NormalizeError> {
        let spec = self
            .specs
            .get(&route_id)
            .ok_or_else(|| NormalizeError::StaleDirectionSpec {
                route_id,
                trip_id: trip_id.to_string(),
            })?;

        let overlap = |leg: &DirectionLeg| {
            visited
                .iter()
                .filter(|stop| leg.stops.contains(stop))
                .count()
        };
        let overlaps = [overlap(&spec.legs[0]), overlap(&spec.legs[1])];
        if overlaps == [0, 0] {
            return Err(NormalizeError::StaleDirectionSpec {
                route_id,
                trip_id: trip_id.to_string(),
            });
        }
        let direction = if overlaps[1] > overlaps[0] { 1u8 } else { 0u8 };
        let leg = &spec.legs[direction as usize];

        let canonical_position: FxHashMap<i64, usize> = leg
            .stops
            .iter()
            .enumerate()
            .map(|(position, stop)| (*stop, position))
            .collect();
        let mut stop_order: Vec<(usize, usize, i64)> = visited
            .iter()
            .enumerate()
            .map(|(source_order, stop)| {
                let position = canonical_position.get(stop).copied().unwrap_or(usize::MAX);
                (position, source_order, *stop)
            })
            .collect();
        stop_order.sort();

        Ok(SplitAssignment {
            direction,
            headsign: leg.headsign.clone(),
            stop_order: stop_order.into_iter().map(|(_, _, stop)| stop).collect(),
        })
    }
}
