use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use citla_parser_core::{useful_service_ids, Feed, FeedError, Network, Normalizer, ServiceWindow};

fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent() // crates/
        .unwrap()
        .parent() // root
        .unwrap()
        .to_path_buf()
}

fn fixture_root() -> PathBuf {
    project_root().join("test-feeds")
}

fn normalize(feed: &Feed) -> Network {
    let window = ServiceWindow::new(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(), 62);
    let useful = useful_service_ids(&feed.calendars, &feed.calendar_dates, &window);
    assert!(useful.contains("SEM"));
    assert!(!useful.contains("WKD-OLD"));
    Normalizer::citla().process(feed, Some(&useful)).unwrap()
}

#[test]
fn normalizes_directory_feed() {
    let feed = Feed::from_path(fixture_root().join("citla-mini")).unwrap();
    let network = normalize(&feed);

    assert_eq!(network.agency_name, "exo Laurentides");
    assert_eq!(network.agency_color.to_string(), "1F1F1F");

    let route_ids: Vec<i64> = network.routes.iter().map(|route| route.id).collect();
    // Route 15 is rail and is excluded; T12 lands in the 20 000 block.
    assert_eq!(route_ids, vec![8, 9, 20_012]);

    let names: Vec<&str> = network
        .routes
        .iter()
        .map(|route| route.display_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Ste-Thérèse & Rosemère",
            "Boisbriand Sud => Nord",
            "Express St-Jérôme (Montmorency)",
        ]
    );

    // 8-old rides an expired service; 15-am belongs to the excluded route.
    assert_eq!(network.trips.len(), 5);

    let route_9: Vec<_> = network
        .trips
        .iter()
        .filter(|trip| trip.route_id == 9)
        .collect();
    assert_eq!(route_9.len(), 2);
    assert_eq!(route_9[0].direction, 0);
    assert_eq!(route_9[0].headsign, "Terminus / St-Eustache");
    assert_eq!(route_9[0].stop_order, vec![74_001, 74_003, 74_005, 203_123]);
    assert_eq!(route_9[1].direction, 1);
    assert_eq!(route_9[1].headsign, "Boisbriand Nord");
    assert_eq!(route_9[1].stop_order, vec![203_123, 74_006, 74_004, 74_002]);

    for trip in network.trips.iter().filter(|trip| trip.route_id == 8) {
        assert_eq!(trip.headsign, "Gare Ste-Thérèse");
    }

    let t12 = network
        .trips
        .iter()
        .find(|trip| trip.route_id == 20_012)
        .unwrap();
    assert_eq!(t12.headsign, "St-Jérôme<>Gare");
    assert_eq!(t12.stop_order, vec![74_001, 401_001]);
}

#[test]
fn resolves_stop_codes_and_names() {
    let feed = Feed::from_path(fixture_root().join("citla-mini")).unwrap();
    let network = normalize(&feed);

    let stop_ids: Vec<i64> = network.stops.iter().map(|stop| stop.id).collect();
    assert_eq!(
        stop_ids,
        vec![74_001, 74_002, 74_003, 74_004, 74_005, 74_006, 203_123, 401_001]
    );

    let first = &network.stops[0];
    assert_eq!(first.code.as_deref(), Some("74001"));
    assert_eq!(first.display_name, "#123 boul. des Ormes");

    // "0" stop code means no display code; the id comes from the token.
    let terminus = network.stops.iter().find(|stop| stop.id == 203_123).unwrap();
    assert_eq!(terminus.code, None);
    assert_eq!(terminus.display_name, "Terminus St-Eustache");

    let rosemere = network.stops.iter().find(|stop| stop.id == 401_001).unwrap();
    assert_eq!(rosemere.code, None);
    assert_eq!(rosemere.display_name, "Gare Rosemère");
}

#[test]
fn zip_and_directory_feeds_are_equivalent() {
    let from_dir = Feed::from_path(fixture_root().join("citla-mini")).unwrap();
    let from_zip = Feed::from_path(fixture_root().join("citla-mini.zip")).unwrap();
    assert_eq!(from_dir.routes.len(), from_zip.routes.len());
    assert_eq!(from_dir.stop_times.len(), from_zip.stop_times.len());

    let dir_network = normalize(&from_dir);
    let zip_network = normalize(&from_zip);
    assert_eq!(
        serde_json::to_string(&dir_network).unwrap(),
        serde_json::to_string(&zip_network).unwrap()
    );
}

#[test]
fn missing_feed_path_is_reported() {
    let err = Feed::from_path(fixture_root().join("does-not-exist")).unwrap_err();
    assert!(matches!(err, FeedError::MissingPath(_)));
}

#[test]
fn output_is_deterministic_across_runs() {
    let feed = Feed::from_path(fixture_root().join("citla-mini")).unwrap();
    let first = serde_json::to_string(&normalize(&feed)).unwrap();
    let second = serde_json::to_string(&normalize(&feed)).unwrap();
    assert_eq!(first, second);
}
