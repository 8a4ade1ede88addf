//! The driver: feed records in, resolved network out.
//!
//! Composes the id resolver, the label pipelines, the direction splitter and
//! the headsign merger over one loaded feed. Any resolution failure aborts
//! the whole run; downstream identity joins depend on every id resolving, so
//! no partial output is ever produced.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::info;

use citla_model::{DirectionId, GtfsColor, RouteType, Stop, Trip};

use crate::direction::DirectionSplitter;
use crate::error::NormalizeError;
use crate::feed::Feed;
use crate::headsign::HeadsignMerger;
use crate::ids;
use crate::text::TextNormalizer;

/// Fixed agency metadata.
#[derive(Debug, Clone)]
pub struct AgencyProfile {
    pub name: String,
    pub color: GtfsColor,
    pub route_type: RouteType,
}

impl AgencyProfile {
    pub fn citla() -> Self {
        Self {
            name: "exo Laurentides".to_string(),
            // Dark gray, from the GTFS.
            color: GtfsColor::new(0x1F, 0x1F, 0x1F),
            route_type: RouteType::Bus,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRoute {
    pub id: i64,
    pub display_name: String,
    pub color: GtfsColor,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedStop {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTrip {
    pub route_id: i64,
    pub direction: u8,
    pub headsign: String,
    pub stop_order: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Network {
    pub agency_name: String,
    pub agency_color: GtfsColor,
    pub routes: Vec<ResolvedRoute>,
    pub stops: Vec<ResolvedStop>,
    pub trips: Vec<ResolvedTrip>,
}

pub struct Normalizer {
    agency: AgencyProfile,
    text: TextNormalizer,
    splitter: DirectionSplitter,
    merger: HeadsignMerger,
}

impl Normalizer {
    pub fn citla() -> Self {
        let text = TextNormalizer::citla();
        let splitter = DirectionSplitter::citla(&text);
        Self {
            agency: AgencyProfile::citla(),
            splitter,
            merger: HeadsignMerger::citla(),
            text,
        }
    }

    pub fn new(
        agency: AgencyProfile,
        text: TextNormalizer,
        splitter: DirectionSplitter,
        merger: HeadsignMerger,
    ) -> Self {
        Self {
            agency,
            text,
            splitter,
            merger,
        }
    }

    /// Normalizes one feed. `useful_services`, when given, restricts the trip
    /// set to those service ids (see [`crate::service::useful_service_ids`]).
    pub fn process(
        &self,
        feed: &Feed,
        useful_services: Option<&FxHashSet<String>>,
    ) -> Result<Network, NormalizeError> {
        let stops_by_source: FxHashMap<&str, &Stop> = feed
            .stops
            .iter()
            .map(|stop| (stop.stop_id.as_str(), stop))
            .collect();

        let mut visits: FxHashMap<&str, Vec<(u32, &str)>> = FxHashMap::default();
        for stop_time in &feed.stop_times {
            visits
                .entry(stop_time.trip_id.as_str())
                .or_default()
                .push((stop_time.stop_sequence, stop_time.stop_id.as_str()));
        }
        for sequence in visits.values_mut() {
            sequence.sort();
        }

        let mut trips_by_route: FxHashMap<&str, Vec<&Trip>> = FxHashMap::default();
        for trip in &feed.trips {
            if let Some(useful) = useful_services {
                if !useful.contains(&trip.service_id) {
                    continue;
                }
            }
            trips_by_route
                .entry(trip.route_id.as_str())
                .or_default()
                .push(trip);
        }

        let mut routes_out = Vec::new();
        let mut stops_seen: FxHashMap<i64, ResolvedStop> = FxHashMap::default();
        let mut trips_out: Vec<ResolvedTrip> = Vec::new();

        for route in &feed.routes {
            if route.route_type != self.agency.route_type {
                continue;
            }
            let short_name = route.route_short_name.as_deref().unwrap_or("");
            let route_id = ids::resolve_route_id(&route.route_id, short_name)?;
            let raw_name = route
                .route_long_name
                .as_deref()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(short_name);
            let display_name = self.text.clean_route_long_name(raw_name);
            routes_out.push(ResolvedRoute {
                id: route_id,
                display_name: display_name.clone(),
                color: route.route_color.unwrap_or(self.agency.color),
            });

            let route_trips = trips_by_route
                .get(route.route_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let mut by_direction: FxHashMap<u8, Vec<usize>> = FxHashMap::default();

            if self.splitter.is_registered(route_id) {
                // Registered routes never fall back to headsign-derived
                // directions; the registered table is the only authority.
                for &trip in route_trips {
                    let visited =
                        self.resolve_visits(trip, &visits, &stops_by_source, &mut stops_seen)?;
                    let assignment = self.splitter.assign(route_id, &trip.trip_id, &visited)?;
                    by_direction
                        .entry(assignment.direction)
                        .or_default()
                        .push(trips_out.len());
                    trips_out.push(ResolvedTrip {
                        route_id,
                        direction: assignment.direction,
                        headsign: assignment.headsign,
                        stop_order: assignment.stop_order,
                    });
                }
            } else {
                // The direction follows the cleaned headsign: every trip with
                // the same label lands in the same direction. The per-trip
                // direction flag is unreliable, so it only votes per label.
                let mut pending: Vec<(String, u8, Vec<i64>)> = Vec::new();
                for &trip in route_trips {
                    let visited =
                        self.resolve_visits(trip, &visits, &stops_by_source, &mut stops_seen)?;
                    let flag = match trip.direction_id {
                        Some(DirectionId::Direction1) => 1,
                        _ => 0,
                    };
                    let label = match trip
                        .trip_headsign
                        .as_deref()
                        .filter(|headsign| !headsign.trim().is_empty())
                    {
                        Some(raw) => self.text.clean_trip_headsign(raw),
                        None => display_name.clone(),
                    };
                    pending.push((label, flag, visited));
                }

                let mut clusters: Vec<(String, Vec<usize>)> = Vec::new();
                for (index, (label, _, _)) in pending.iter().enumerate() {
                    match clusters.iter_mut().find(|cluster| cluster.0 == *label) {
                        Some(cluster) => cluster.1.push(index),
                        None => clusters.push((label.clone(), vec![index])),
                    }
                }
                for (label, members) in clusters {
                    let ones = members
                        .iter()
                        .filter(|&&member| pending[member].1 == 1)
                        .count();
                    let zeros = members.len() - ones;
                    let direction = match ones.cmp(&zeros) {
                        std::cmp::Ordering::Greater => 1,
                        std::cmp::Ordering::Less => 0,
                        std::cmp::Ordering::Equal => pending[members[0]].1,
                    };
                    for &member in &members {
                        by_direction
                            .entry(direction)
                            .or_default()
                            .push(trips_out.len());
                        trips_out.push(ResolvedTrip {
                            route_id,
                            direction,
                            headsign: label.clone(),
                            stop_order: std::mem::take(&mut pending[member].2),
                        });
                    }
                }
            }

            for (direction, indexes) in by_direction {
                let mut labels: Vec<String> = Vec::new();
                for &index in &indexes {
                    let label = &trips_out[index].headsign;
                    if !labels.contains(label) {
                        labels.push(label.clone());
                    }
                }
                if labels.len() < 2 {
                    continue;
                }
                let mut canonical = labels[0].clone();
                for label in &labels[1..] {
                    canonical = self.merger.merge(route_id, direction, &canonical, label)?;
                }
                for &index in &indexes {
                    trips_out[index].headsign = canonical.clone();
                }
            }
        }

        let mut stops_out: Vec<ResolvedStop> = stops_seen.into_values().collect();
        stops_out.sort_by_key(|stop| stop.id);
        routes_out.sort_by_key(|route| route.id);
        trips_out.sort_by(|a, b| (a.route_id, a.direction).cmp(&(b.route_id, b.direction)));

        info!(
            routes = routes_out.len(),
            stops = stops_out.len(),
            trips = trips_out.len(),
            "normalized network"
        );
        Ok(Network {
            agency_name: self.agency.name.clone(),
            agency_color: self.agency.color,
            routes: routes_out,
            stops: stops_out,
            trips: trips_out,
        })
    }

    fn resolve_visits(
        &self,
        trip: &Trip,
        visits: &FxHashMap<&str, Vec<(u32, &str)>>,
        stops_by_source: &FxHashMap<&str, &Stop>,
        stops_seen: &mut FxHashMap<i64, ResolvedStop>,
    ) -> Result<Vec<i64>, NormalizeError> {
        let mut resolved = Vec::new();
        let Some(sequence) = visits.get(trip.trip_id.as_str()) else {
            return Ok(resolved);
        };
        for (_, source_id) in sequence {
            // The loader guarantees this join; a hand-built feed that breaks
            // it fails the same way an unknown stop token would.
            let stop = stops_by_source
                .get(source_id)
                .ok_or_else(|| NormalizeError::UnresolvedStopId {
                    stop_id: source_id.to_string(),
                    stop_code: String::new(),
                })?;
            let stop_code = stop.stop_code.as_deref().unwrap_or("");
            let stop_id = ids::resolve_stop_id(stop_code, &stop.stop_id)?;
            stops_seen.entry(stop_id).or_insert_with(|| ResolvedStop {
                id: stop_id,
                code: ids::display_stop_code(stop_code).map(str::to_string),
                display_name: self
                    .text
                    .clean_stop_name(stop.stop_name.as_deref().unwrap_or("")),
            });
            resolved.push(stop_id);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citla_model::{Route, StopTime};

    fn route(route_id: &str, short_name: &str, long_name: &str) -> Route {
        Route {
            route_id: route_id.to_string(),
            route_short_name: Some(short_name.to_string()),
            route_long_name: Some(long_name.to_string()),
            ..Default::default()
        }
    }

    fn stop(stop_id: &str, stop_code: &str, name: &str) -> Stop {
        Stop {
            stop_id: stop_id.to_string(),
            stop_code: Some(stop_code.to_string()),
            stop_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn trip(route_id: &str, trip_id: &str, headsign: &str, direction: i32) -> Trip {
        Trip {
            route_id: route_id.to_string(),
            service_id: "SEM".to_string(),
            trip_id: trip_id.to_string(),
            trip_headsign: Some(headsign.to_string()),
            direction_id: Some(DirectionId::from_i32(direction)),
            ..Default::default()
        }
    }

    fn stop_time(trip_id: &str, stop_id: &str, sequence: u32) -> StopTime {
        StopTime {
            trip_id: trip_id.to_string(),
            stop_id: stop_id.to_string(),
            stop_sequence: sequence,
            ..Default::default()
        }
    }

    fn boisbriand_feed() -> Feed {
        Feed {
            routes: vec![
                route("9", "9", "Secteur Boisbriand Sud Vers Boisbriand Nord"),
                route("8", "8", "Saint-Eustache et Rosemère"),
                Route {
                    route_type: RouteType::Rail,
                    ..route("100", "100", "Train de banlieue")
                },
            ],
            stops: vec![
                stop("A1", "74001", "face à 123 boulevard des Ormes"),
                stop("A2", "74002", "Grande Allée / des Cygnes"),
                stop("A3", "74003", "Curé-Labelle - montée Sanche"),
                stop("A4", "74004", "chemin de la Grande-Côte"),
                stop("A5", "74005", "Grande-Côte devant le parc"),
                stop("A6", "74006", "place de la Chapelle"),
                stop("SEU123C", "0", "Terminus St-Eustache"),
            ],
            trips: vec![
                trip("9", "t-out", "Boisbriand", 0),
                trip("9", "t-in", "Boisbriand", 1),
                trip("8", "t-plain", "Gare Ste-Thérèse", 0),
                trip("8", "t-via", "Gare Ste-Thérèse Via Cégep", 0),
            ],
            stop_times: vec![
                stop_time("t-out", "A1", 1),
                stop_time("t-out", "A3", 2),
                stop_time("t-out", "A5", 3),
                stop_time("t-out", "SEU123C", 4),
                stop_time("t-in", "SEU123C", 1),
                stop_time("t-in", "A6", 2),
                stop_time("t-in", "A4", 3),
                stop_time("t-in", "A2", 4),
                stop_time("t-plain", "A1", 1),
                stop_time("t-plain", "A3", 2),
                stop_time("t-via", "A1", 1),
                stop_time("t-via", "A3", 2),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn filters_non_bus_routes() {
        let network = Normalizer::citla().process(&boisbriand_feed(), None).unwrap();
        let ids: Vec<i64> = network.routes.iter().map(|route| route.id).collect();
        assert_eq!(ids, vec![8, 9]);
    }

    #[test]
    fn cleans_route_display_names() {
        let network = Normalizer::citla().process(&boisbriand_feed(), None).unwrap();
        let names: Vec<&str> = network
            .routes
            .iter()
            .map(|route| route.display_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["St-Eustache & Rosemère", "Boisbriand Sud => Nord"]
        );
    }

    #[test]
    fn routes_without_own_color_inherit_agency_color() {
        let network = Normalizer::citla().process(&boisbriand_feed(), None).unwrap();
        assert_eq!(network.routes[0].color.to_string(), "1F1F1F");
    }

    #[test]
    fn split_route_gets_canonical_directions() {
        let network = Normalizer::citla().process(&boisbriand_feed(), None).unwrap();
        let out: Vec<&ResolvedTrip> = network
            .trips
            .iter()
            .filter(|trip| trip.route_id == 9)
            .collect();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].direction, 0);
        assert_eq!(out[0].headsign, "Terminus / St-Eustache");
        assert_eq!(out[0].stop_order, vec![74_001, 74_003, 74_005, 203_123]);
        assert_eq!(out[1].direction, 1);
        assert_eq!(out[1].headsign, "Boisbriand Nord");
    }

    #[test]
    fn same_direction_variants_merge_to_canonical_label() {
        let network = Normalizer::citla().process(&boisbriand_feed(), None).unwrap();
        let labels: Vec<&str> = network
            .trips
            .iter()
            .filter(|trip| trip.route_id == 8)
            .map(|trip| trip.headsign.as_str())
            .collect();
        assert_eq!(labels, vec!["Gare Ste-Thérèse", "Gare Ste-Thérèse"]);
    }

    #[test]
    fn direction_follows_the_headsign_label() {
        let mut feed = boisbriand_feed();
        feed.routes.push(route("12", "12", "Deux-Montagnes"));
        feed.trips.push(trip("12", "u1", "Gare Deux-Montagnes", 0));
        // One bad source flag; the label's majority wins.
        feed.trips.push(trip("12", "u2", "Gare Deux-Montagnes", 1));
        feed.trips.push(trip("12", "u3", "Gare Deux-Montagnes", 0));
        feed.trips.push(trip("12", "u4", "Terminus Henri-Bourassa", 1));
        for trip_id in ["u1", "u2", "u3", "u4"] {
            feed.stop_times.push(stop_time(trip_id, "A1", 1));
        }

        let network = Normalizer::citla().process(&feed, None).unwrap();
        let twelve: Vec<&ResolvedTrip> = network
            .trips
            .iter()
            .filter(|trip| trip.route_id == 12)
            .collect();
        assert_eq!(twelve.len(), 4);
        assert!(twelve
            .iter()
            .filter(|trip| trip.headsign == "Gare Deux-Montagnes")
            .all(|trip| trip.direction == 0));
        assert!(twelve
            .iter()
            .filter(|trip| trip.headsign == "Terminus Henri-Bourassa")
            .all(|trip| trip.direction == 1));
    }

    #[test]
    fn unknown_headsign_pair_aborts() {
        let mut feed = boisbriand_feed();
        feed.trips.push(trip("8", "t-odd", "Terminus Inconnu", 0));
        feed.stop_times.push(stop_time("t-odd", "A1", 1));
        let err = Normalizer::citla().process(&feed, None).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnmergeableHeadsigns { route_id: 8, .. }
        ));
    }

    #[test]
    fn stop_codes_and_names_are_resolved() {
        let network = Normalizer::citla().process(&boisbriand_feed(), None).unwrap();
        let first = &network.stops[0];
        assert_eq!(first.id, 74_001);
        assert_eq!(first.code.as_deref(), Some("74001"));
        assert_eq!(first.display_name, "#123 boul. des Ormes");

        let terminus = network.stops.iter().find(|stop| stop.id == 203_123).unwrap();
        // The "0" sentinel means the stop has no display code.
        assert_eq!(terminus.code, None);
        assert_eq!(terminus.display_name, "Terminus St-Eustache");
    }

    #[test]
    fn service_filter_drops_trips() {
        let mut useful = FxHashSet::default();
        useful.insert("AUTRE".to_string());
        let network = Normalizer::citla()
            .process(&boisbriand_feed(), Some(&useful))
            .unwrap();
        assert!(network.trips.is_empty());
        assert!(network.stops.is_empty());
        assert_eq!(network.routes.len(), 2);
    }

    #[test]
    fn unresolved_route_id_aborts() {
        let mut feed = boisbriand_feed();
        feed.routes.push(route("EXPRESS", "E1", "Express"));
        assert!(matches!(
            Normalizer::citla().process(&feed, None),
            Err(NormalizeError::UnresolvedRouteId { .. })
        ));
    }
}
