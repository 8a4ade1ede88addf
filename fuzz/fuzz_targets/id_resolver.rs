#![no_main]
use arbitrary::Arbitrary;
use citla_parser_core::{resolve_route_id, resolve_stop_id};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzData {
    route_id: String,
    short_name: String,
    stop_code: String,
    stop_id: String,
}

fuzz_target!(|data: FuzzData| {
    if let Ok(id) = resolve_route_id(&data.route_id, &data.short_name) {
        // A digit-only route id must resolve to itself.
        if let Ok(numeric) = data.route_id.parse::<i64>() {
            if data.route_id.chars().all(|ch| ch.is_ascii_digit()) {
                assert_eq!(id, numeric);
            }
        }
    }

    if let Ok(id) = resolve_stop_id(&data.stop_code, &data.stop_id) {
        // Resolution is a pure function of its inputs.
        assert_eq!(id, resolve_stop_id(&data.stop_code, &data.stop_id).unwrap());
    }
});
