//! Feed loading.
//!
//! Decodes the agency's GTFS tables from an extracted directory or the
//! distributed zip archive into the typed records of `citla-model`. Columns
//! are looked up by header name, values are trimmed, and empty cells are
//! absent. Referential integrity is checked here so the engine can assume
//! every join resolves.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use citla_model::{
    Agency, Calendar, CalendarDate, DirectionId, ExceptionType, GtfsColor, GtfsDate,
    GtfsParseError, GtfsTime, LocationType, Route, RouteType, ServiceAvailability, Stop, StopTime,
    Trip,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

pub const AGENCY_FILE: &str = "agency.txt";
pub const ROUTES_FILE: &str = "routes.txt";
pub const STOPS_FILE: &str = "stops.txt";
pub const TRIPS_FILE: &str = "trips.txt";
pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const CALENDAR_FILE: &str = "calendar.txt";
pub const CALENDAR_DATES_FILE: &str = "calendar_dates.txt";

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed path {0:?} does not exist")]
    MissingPath(PathBuf),
    #[error("missing required feed file {0}")]
    MissingFile(&'static str),
    #[error("{file} row {row}: missing required value for {column}")]
    MissingValue {
        file: &'static str,
        row: u64,
        column: &'static str,
    },
    #[error("{file} row {row}: invalid number {value:?} for {column}")]
    InvalidNumber {
        file: &'static str,
        row: u64,
        column: &'static str,
        value: String,
    },
    #[error("{file} row {row}: {source}")]
    Value {
        file: &'static str,
        row: u64,
        #[source]
        source: GtfsParseError,
    },
    #[error("{file}: unknown {field} {value:?}")]
    DanglingReference {
        file: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("feed has neither calendar.txt nor calendar_dates.txt")]
    MissingCalendars,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Clone, Default)]
pub struct Feed {
    pub agencies: Vec<Agency>,
    pub routes: Vec<Route>,
    pub stops: Vec<Stop>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: Vec<Calendar>,
    pub calendar_dates: Vec<CalendarDate>,
}

impl Feed {
    /// Loads a feed from an extracted directory or a `.zip` archive.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FeedError::MissingPath(path.to_path_buf()));
        }
        let mut source = if path.is_file() {
            FeedSource::Zip(zip::ZipArchive::new(File::open(path)?)?)
        } else {
            FeedSource::Directory(path.to_path_buf())
        };

        let agencies = parse_table(AGENCY_FILE, &source.read_required(AGENCY_FILE)?, parse_agency)?;
        let routes = parse_table(ROUTES_FILE, &source.read_required(ROUTES_FILE)?, parse_route)?;
        let stops = parse_table(STOPS_FILE, &source.read_required(STOPS_FILE)?, parse_stop)?;
        let trips = parse_table(TRIPS_FILE, &source.read_required(TRIPS_FILE)?, parse_trip)?;
        let stop_times = parse_table(
            STOP_TIMES_FILE,
            &source.read_required(STOP_TIMES_FILE)?,
            parse_stop_time,
        )?;

        let calendar_contents = source.read(CALENDAR_FILE)?;
        let calendar_date_contents = source.read(CALENDAR_DATES_FILE)?;
        if calendar_contents.is_none() && calendar_date_contents.is_none() {
            return Err(FeedError::MissingCalendars);
        }
        let calendars = match calendar_contents {
            Some(contents) => parse_table(CALENDAR_FILE, &contents, parse_calendar)?,
            None => Vec::new(),
        };
        let calendar_dates = match calendar_date_contents {
            Some(contents) => parse_table(CALENDAR_DATES_FILE, &contents, parse_calendar_date)?,
            None => Vec::new(),
        };

        let feed = Self {
            agencies,
            routes,
            stops,
            trips,
            stop_times,
            calendars,
            calendar_dates,
        };
        feed.check_references()?;
        debug!(
            routes = feed.routes.len(),
            stops = feed.stops.len(),
            trips = feed.trips.len(),
            stop_times = feed.stop_times.len(),
            "loaded feed"
        );
        Ok(feed)
    }

    fn check_references(&self) -> Result<(), FeedError> {
        let route_ids: FxHashSet<&str> = self.routes.iter().map(|r| r.route_id.as_str()).collect();
        let stop_ids: FxHashSet<&str> = self.stops.iter().map(|s| s.stop_id.as_str()).collect();
        let trip_ids: FxHashSet<&str> = self.trips.iter().map(|t| t.trip_id.as_str()).collect();

        for trip in &self.trips {
            if !route_ids.contains(trip.route_id.as_str()) {
                return Err(FeedError::DanglingReference {
                    file: TRIPS_FILE,
                    field: "route_id",
                    value: trip.route_id.clone(),
                });
            }
        }
        for stop_time in &self.stop_times {
            if !trip_ids.contains(stop_time.trip_id.as_str()) {
                return Err(FeedError::DanglingReference {
                    file: STOP_TIMES_FILE,
                    field: "trip_id",
                    value: stop_time.trip_id.clone(),
                });
            }
            if !stop_ids.contains(stop_time.stop_id.as_str()) {
                return Err(FeedError::DanglingReference {
                    file: STOP_TIMES_FILE,
                    field: "stop_id",
                    value: stop_time.stop_id.clone(),
                });
            }
        }
        Ok(())
    }
}

enum FeedSource {
    Directory(PathBuf),
    Zip(zip::ZipArchive<File>),
}

impl FeedSource {
    fn read(&mut self, name: &'static str) -> Result<Option<String>, FeedError> {
        match self {
            FeedSource::Directory(dir) => {
                let path = dir.join(name);
                if !path.exists() {
                    return Ok(None);
                }
                Ok(Some(strip_bom(std::fs::read_to_string(path)?)))
            }
            FeedSource::Zip(archive) => match archive.by_name(name) {
                Ok(mut file) => {
                    let mut contents = String::new();
                    file.read_to_string(&mut contents)?;
                    Ok(Some(strip_bom(contents)))
                }
                Err(zip::result::ZipError::FileNotFound) => Ok(None),
                Err(err) => Err(err.into()),
            },
        }
    }

    fn read_required(&mut self, name: &'static str) -> Result<String, FeedError> {
        self.read(name)?.ok_or(FeedError::MissingFile(name))
    }
}

fn strip_bom(contents: String) -> String {
    match contents.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => contents,
    }
}

/// One CSV record with header-driven field access.
struct Row<'a> {
    file: &'static str,
    number: u64,
    columns: &'a FxHashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn get(&self, column: &'static str) -> Option<&str> {
        let index = *self.columns.get(column)?;
        self.record
            .get(index)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn owned(&self, column: &'static str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    fn require(&self, column: &'static str) -> Result<&str, FeedError> {
        self.get(column).ok_or(FeedError::MissingValue {
            file: self.file,
            row: self.number,
            column,
        })
    }

    fn require_i32(&self, column: &'static str) -> Result<i32, FeedError> {
        let value = self.require(column)?;
        value.parse().map_err(|_| FeedError::InvalidNumber {
            file: self.file,
            row: self.number,
            column,
            value: value.to_string(),
        })
    }

    fn require_u32(&self, column: &'static str) -> Result<u32, FeedError> {
        let value = self.require(column)?;
        value.parse().map_err(|_| FeedError::InvalidNumber {
            file: self.file,
            row: self.number,
            column,
            value: value.to_string(),
        })
    }

    fn opt_i32(&self, column: &'static str) -> Result<Option<i32>, FeedError> {
        match self.get(column) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| FeedError::InvalidNumber {
                    file: self.file,
                    row: self.number,
                    column,
                    value: value.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn opt_f64(&self, column: &'static str) -> Result<Option<f64>, FeedError> {
        match self.get(column) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| FeedError::InvalidNumber {
                    file: self.file,
                    row: self.number,
                    column,
                    value: value.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn opt_parsed<T>(
        &self,
        column: &'static str,
        parse: fn(&str) -> Result<T, GtfsParseError>,
    ) -> Result<Option<T>, FeedError> {
        match self.get(column) {
            Some(value) => parse(value).map(Some).map_err(|source| FeedError::Value {
                file: self.file,
                row: self.number,
                source,
            }),
            None => Ok(None),
        }
    }

    fn require_parsed<T>(
        &self,
        column: &'static str,
        parse: fn(&str) -> Result<T, GtfsParseError>,
    ) -> Result<T, FeedError> {
        let value = self.require(column)?;
        parse(value).map_err(|source| FeedError::Value {
            file: self.file,
            row: self.number,
            source,
        })
    }
}

fn parse_table<T>(
    file: &'static str,
    contents: &str,
    parse: impl Fn(&Row<'_>) -> Result<T, FeedError>,
) -> Result<Vec<T>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());
    let columns: FxHashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, name)| (name.trim().to_string(), index))
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = Row {
            file,
            // Header is line 1.
            number: index as u64 + 2,
            columns: &columns,
            record: &record,
        };
        rows.push(parse(&row)?);
    }
    Ok(rows)
}

fn parse_agency(row: &Row<'_>) -> Result<Agency, FeedError> {
    Ok(Agency {
        agency_id: row.owned("agency_id"),
        agency_name: row.require("agency_name")?.to_string(),
        agency_url: row.get("agency_url").unwrap_or_default().to_string(),
        agency_timezone: row.get("agency_timezone").unwrap_or_default().to_string(),
        agency_lang: row.owned("agency_lang"),
        agency_phone: row.owned("agency_phone"),
    })
}

fn parse_route(row: &Row<'_>) -> Result<Route, FeedError> {
    Ok(Route {
        route_id: row.require("route_id")?.to_string(),
        agency_id: row.owned("agency_id"),
        route_short_name: row.owned("route_short_name"),
        route_long_name: row.owned("route_long_name"),
        route_desc: row.owned("route_desc"),
        route_type: RouteType::from_i32(row.require_i32("route_type")?),
        route_url: row.owned("route_url"),
        route_color: row.opt_parsed("route_color", GtfsColor::parse)?,
        route_text_color: row.opt_parsed("route_text_color", GtfsColor::parse)?,
    })
}

fn parse_stop(row: &Row<'_>) -> Result<Stop, FeedError> {
    Ok(Stop {
        stop_id: row.require("stop_id")?.to_string(),
        stop_code: row.owned("stop_code"),
        stop_name: row.owned("stop_name"),
        stop_desc: row.owned("stop_desc"),
        stop_lat: row.opt_f64("stop_lat")?,
        stop_lon: row.opt_f64("stop_lon")?,
        zone_id: row.owned("zone_id"),
        stop_url: row.owned("stop_url"),
        location_type: row.opt_i32("location_type")?.map(LocationType::from_i32),
        parent_station: row.owned("parent_station"),
    })
}

fn parse_trip(row: &Row<'_>) -> Result<Trip, FeedError> {
    Ok(Trip {
        route_id: row.require("route_id")?.to_string(),
        service_id: row.require("service_id")?.to_string(),
        trip_id: row.require("trip_id")?.to_string(),
        trip_headsign: row.owned("trip_headsign"),
        trip_short_name: row.owned("trip_short_name"),
        direction_id: row.opt_i32("direction_id")?.map(DirectionId::from_i32),
        block_id: row.owned("block_id"),
        shape_id: row.owned("shape_id"),
    })
}

fn parse_stop_time(row: &Row<'_>) -> Result<StopTime, FeedError> {
    Ok(StopTime {
        trip_id: row.require("trip_id")?.to_string(),
        arrival_time: row.opt_parsed("arrival_time", GtfsTime::parse)?,
        departure_time: row.opt_parsed("departure_time", GtfsTime::parse)?,
        stop_id: row.require("stop_id")?.to_string(),
        stop_sequence: row.require_u32("stop_sequence")?,
        stop_headsign: row.owned("stop_headsign"),
    })
}

fn parse_calendar(row: &Row<'_>) -> Result<Calendar, FeedError> {
    Ok(Calendar {
        service_id: row.require("service_id")?.to_string(),
        monday: ServiceAvailability::from_i32(row.require_i32("monday")?),
        tuesday: ServiceAvailability::from_i32(row.require_i32("tuesday")?),
        wednesday: ServiceAvailability::from_i32(row.require_i32("wednesday")?),
        thursday: ServiceAvailability::from_i32(row.require_i32("thursday")?),
        friday: ServiceAvailability::from_i32(row.require_i32("friday")?),
        saturday: ServiceAvailability::from_i32(row.require_i32("saturday")?),
        sunday: ServiceAvailability::from_i32(row.require_i32("sunday")?),
        start_date: row.require_parsed("start_date", GtfsDate::parse)?,
        end_date: row.require_parsed("end_date", GtfsDate::parse)?,
    })
}

fn parse_calendar_date(row: &Row<'_>) -> Result<CalendarDate, FeedError> {
    Ok(CalendarDate {
        service_id: row.require("service_id")?.to_string(),
        date: row.require_parsed("date", GtfsDate::parse)?,
        exception_type: ExceptionType::from_i32(row.require_i32("exception_type")?),
    })
}
