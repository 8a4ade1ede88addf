#![no_main]
use std::sync::LazyLock;

use citla_parser_core::TextNormalizer;
use libfuzzer_sys::fuzz_target;

static NORMALIZER: LazyLock<TextNormalizer> = LazyLock::new(TextNormalizer::citla);

fuzz_target!(|data: &str| {
    let _ = NORMALIZER.clean_route_long_name(data);
    let _ = NORMALIZER.clean_trip_headsign(data);
    let _ = NORMALIZER.clean_stop_name(data);
});
