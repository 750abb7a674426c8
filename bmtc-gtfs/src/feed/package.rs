//! serializes a frozen registry snapshot into the GTFS zip archive. one
//! CSV table per non-empty collection; an empty collection is omitted
//! entirely rather than written as an empty file. rows are emitted
//! exactly in snapshot order.
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::feed::config::FeedConfig;
use crate::feed::feed_error::FeedError;
use crate::feed::registry::FeedSnapshot;

fn table_bytes<T: Serialize>(table: &str, rows: &[T]) -> Result<Vec<u8>, FeedError> {
    let to_table_error = |e| FeedError::TableWriteError {
        table: table.to_string(),
        source: e,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(to_table_error)?;
    }
    writer
        .into_inner()
        .map_err(|e| FeedError::OtherError(format!("failed flushing table '{table}': {e}")))
}

fn write_table<W: Write + Seek, T: Serialize>(
    zip: &mut ZipWriter<W>,
    archive_path: &str,
    table: &str,
    rows: &[T],
) -> Result<(), FeedError> {
    if rows.is_empty() {
        log::debug!("table '{table}' is empty and omitted from the archive");
        return Ok(());
    }
    let bytes = table_bytes(table, rows)?;
    zip.start_file(table, SimpleFileOptions::default())
        .map_err(|e| FeedError::ArchiveError {
            path: archive_path.to_string(),
            source: e,
        })?;
    zip.write_all(&bytes).map_err(|e| FeedError::OutputIoError {
        path: archive_path.to_string(),
        source: e,
    })?;
    Ok(())
}

/// writes the dataset archive. the static agency and calendar tables come
/// from configuration and are always present; every other table appears
/// only when its snapshot collection has rows.
pub fn write_feed(
    snapshot: &FeedSnapshot,
    config: &FeedConfig,
    output: &Path,
) -> Result<(), FeedError> {
    let archive_path = output.display().to_string();
    let file = File::create(output).map_err(|e| FeedError::OutputIoError {
        path: archive_path.clone(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);

    write_table(&mut zip, &archive_path, "agency.txt", &[config.agency_row()])?;
    write_table(
        &mut zip,
        &archive_path,
        "calendar.txt",
        &[config.calendar_row()],
    )?;
    write_table(&mut zip, &archive_path, "stops.txt", &snapshot.stops)?;
    write_table(&mut zip, &archive_path, "routes.txt", &snapshot.routes)?;
    write_table(&mut zip, &archive_path, "shapes.txt", &snapshot.shape_points)?;
    write_table(&mut zip, &archive_path, "trips.txt", &snapshot.trips)?;
    write_table(
        &mut zip,
        &archive_path,
        "stop_times.txt",
        &snapshot.stop_times,
    )?;
    write_table(
        &mut zip,
        &archive_path,
        "fare_attributes.txt",
        &snapshot.fare_attributes,
    )?;
    write_table(
        &mut zip,
        &archive_path,
        "fare_rules.txt",
        &snapshot.fare_rules,
    )?;
    write_table(
        &mut zip,
        &archive_path,
        "translations.txt",
        &snapshot.translations,
    )?;

    zip.finish().map_err(|e| FeedError::ArchiveError {
        path: archive_path,
        source: e,
    })?;
    log::info!("wrote feed archive to '{}'", output.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::feed::entity::Stop;
    use crate::feed::registry::FeedRegistry;
    use std::io::Read;

    fn snapshot_with_one_stop() -> FeedSnapshot {
        let mut registry = FeedRegistry::new();
        registry.add_stop(Stop {
            stop_id: "20558".to_string(),
            stop_name: "Kempegowda Bus Station".to_string(),
            stop_lat: Some(12.9779),
            stop_lon: Some(77.5713),
            zone_id: "20558".to_string(),
        });
        registry.snapshot()
    }

    #[test]
    fn test_empty_tables_are_omitted() {
        let output = std::env::temp_dir().join("bmtc-gtfs-package-test.zip");
        write_feed(&snapshot_with_one_stop(), &FeedConfig::default(), &output)
            .expect("packaging should succeed");

        let archive_file = File::open(&output).expect("archive should exist");
        let mut archive = zip::ZipArchive::new(archive_file).expect("archive should open");
        let names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
        assert!(names.contains(&"agency.txt".to_string()));
        assert!(names.contains(&"calendar.txt".to_string()));
        assert!(names.contains(&"stops.txt".to_string()));
        // nothing was synthesized, so the trip-side tables must be absent
        assert!(!names.contains(&"trips.txt".to_string()));
        assert!(!names.contains(&"stop_times.txt".to_string()));
        assert!(!names.contains(&"fare_rules.txt".to_string()));

        let mut stops_csv = String::new();
        archive
            .by_name("stops.txt")
            .expect("stops table should be present")
            .read_to_string(&mut stops_csv)
            .expect("stops table should be utf8");
        assert!(stops_csv.starts_with("stop_id,stop_name,stop_lat,stop_lon,zone_id"));
        assert!(stops_csv.contains("20558,Kempegowda Bus Station,12.9779,77.5713,20558"));

        std::fs::remove_file(&output).ok();
    }

    #[test]
    fn test_calendar_dates_are_compact() {
        let rows = [FeedConfig::default().calendar_row()];
        let bytes = table_bytes("calendar.txt", &rows).expect("calendar should serialize");
        let csv = String::from_utf8(bytes).expect("utf8 csv");
        assert!(csv.contains("1,1,1,1,1,1,1,1,20250216,20260216"));
    }
}
