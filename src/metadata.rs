//! Sensor metadata enrichment
//!
//! An optional CSV lists static details per sensor (name, position, geometry).
//! Header names vary between exports, so each column is matched against a set
//! of known synonyms, case-insensitively.

use crate::error::AirglowError;
use crate::types::{EnrichedSensor, SensorMetadata, SensorReading};
use log::warn;
use std::collections::HashMap;

const ID_COLUMNS: &[&str] = &["sensor_index", "sensor_id", "id", "index", "sensor"];
const NAME_COLUMNS: &[&str] = &["name", "sensor_name", "label", "display_name"];
const LATITUDE_COLUMNS: &[&str] = &["latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["longitude", "lon", "lng", "long"];
const GEOMETRY_COLUMNS: &[&str] = &["geometry", "geom", "wkt", "the_geom"];

/// Column positions resolved from the header row
struct ColumnMap {
    id: usize,
    name: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    geometry: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Result<Self, AirglowError> {
        let normalized: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |synonyms: &[&str]| {
            synonyms
                .iter()
                .find_map(|syn| normalized.iter().position(|h| h == syn))
        };

        let id = find(ID_COLUMNS).ok_or_else(|| {
            AirglowError::Metadata(format!("no sensor id column in header {header:?}"))
        })?;

        Ok(Self {
            id,
            name: find(NAME_COLUMNS),
            latitude: find(LATITUDE_COLUMNS),
            longitude: find(LONGITUDE_COLUMNS),
            geometry: find(GEOMETRY_COLUMNS),
        })
    }
}

/// Parse the metadata CSV into a map keyed by sensor index.
///
/// Rows whose id does not parse are skipped; a header without an id column is an error.
pub fn parse_metadata_csv(text: &str) -> Result<HashMap<i64, SensorMetadata>, AirglowError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = split_csv_records(text).into_iter();

    let header = records
        .next()
        .ok_or_else(|| AirglowError::Metadata("metadata CSV is empty".to_string()))?;
    let columns = ColumnMap::from_header(&header)?;

    let mut metadata = HashMap::new();
    for (record_num, cells) in records.enumerate() {
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i))
                .map(String::as_str)
                .filter(|s| !s.is_empty())
        };

        let Some(id) = cell(Some(columns.id)).and_then(parse_sensor_id) else {
            warn!("Skipping metadata record {}: unparsable sensor id", record_num + 2);
            continue;
        };

        metadata.insert(
            id,
            SensorMetadata {
                name: cell(columns.name).map(str::to_string),
                latitude: cell(columns.latitude).and_then(parse_coordinate),
                longitude: cell(columns.longitude).and_then(parse_coordinate),
                geometry: cell(columns.geometry).map(str::to_string),
            },
        );
    }

    Ok(metadata)
}

/// Attach metadata to each reading; sensors missing from the CSV get empty metadata
pub fn enrich(
    readings: Vec<SensorReading>,
    metadata: &HashMap<i64, SensorMetadata>,
) -> Vec<EnrichedSensor> {
    readings
        .into_iter()
        .map(|reading| {
            let metadata = metadata
                .get(&reading.sensor_index)
                .cloned()
                .unwrap_or_default();
            EnrichedSensor { reading, metadata }
        })
        .collect()
}

/// Split CSV text into records of trimmed cells, honouring double quotes and
/// `""` escapes. Quoted cells may span lines; blank records are dropped.
fn split_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    let mut finish_record = |record: &mut Vec<String>, current: &mut String| {
        record.push(current.trim().to_string());
        current.clear();
        let cells = std::mem::take(record);
        if cells.iter().any(|c| !c.is_empty()) {
            records.push(cells);
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                record.push(current.trim().to_string());
                current.clear();
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => finish_record(&mut record, &mut current),
            _ => current.push(c),
        }
    }
    finish_record(&mut record, &mut current);
    records
}

fn parse_sensor_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SelectionPath;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_with_synonym_headers() {
        let csv = "\u{feff}ID,Label,Lat,LNG,WKT\n\
                   123421,Spruce Grove,53.54,-113.91,\"POINT (-113.91 53.54)\"\n\
                   555.0,\"Backyard, east\",,,\n";
        let metadata = parse_metadata_csv(csv).unwrap();

        assert_eq!(metadata.len(), 2);
        assert_eq!(
            metadata[&123421],
            SensorMetadata {
                name: Some("Spruce Grove".to_string()),
                latitude: Some(53.54),
                longitude: Some(-113.91),
                geometry: Some("POINT (-113.91 53.54)".to_string()),
            }
        );
        assert_eq!(metadata[&555].name.as_deref(), Some("Backyard, east"));
        assert_eq!(metadata[&555].latitude, None);
        assert_eq!(metadata[&555].geometry, None);
    }

    #[test]
    fn test_missing_id_column_is_error() {
        let err = parse_metadata_csv("name,lat,lon\nfoo,1,2\n").unwrap_err();
        assert!(matches!(err, AirglowError::Metadata(_)));
        assert!(parse_metadata_csv("").is_err());
    }

    #[test]
    fn test_bad_rows_skipped() {
        let metadata = parse_metadata_csv("sensor_index,name\nabc,Nope\n12,Yes\n").unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[&12].name.as_deref(), Some("Yes"));
    }

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(
            split_csv_records("1,\"say \"\"hi\"\"\",x\r\na,,\r\n\r\n"),
            vec![
                vec!["1".to_string(), "say \"hi\"".to_string(), "x".to_string()],
                vec!["a".to_string(), String::new(), String::new()],
            ]
        );
    }

    #[test]
    fn test_quoted_geometry_spanning_lines() {
        let csv = "sensor_index,name,geometry\r\n\
                   7,North,\"POLYGON ((0 0,\r\n1 0,\n1 1))\"\r\n\
                   8,South,\r\n";
        let metadata = parse_metadata_csv(csv).unwrap();

        assert_eq!(metadata.len(), 2);
        assert_eq!(
            metadata[&7].geometry.as_deref(),
            Some("POLYGON ((0 0,\r\n1 0,\n1 1))")
        );
        assert_eq!(metadata[&8].name.as_deref(), Some("South"));
        assert_eq!(metadata[&8].geometry, None);
    }

    #[test]
    fn test_enrich_keeps_order_and_defaults() {
        let reading = |id| SensorReading {
            sensor_index: id,
            last_seen: None,
            last_seen_iso: None,
            humidity: None,
            pm25_atm: None,
            pm25_atm_a: None,
            pm25_atm_b: None,
            pm25_best_raw: None,
            pm25_selection: SelectionPath::Fallback,
            pm25_corr: None,
            is_fresh: false,
        };
        let metadata = parse_metadata_csv("sensor_index,name\n2,Two\n").unwrap();
        let enriched = enrich(vec![reading(1), reading(2)], &metadata);

        assert_eq!(enriched[0].reading.sensor_index, 1);
        assert_eq!(enriched[0].metadata, SensorMetadata::default());
        assert_eq!(enriched[1].metadata.name.as_deref(), Some("Two"));
    }
}
