//! Persistence sinks for the recorder.
//!
//! Values are stored at full precision; rounding is a display concern.

use std::fs::OpenOptions;
use std::path::Path;

use airsense_traits::{ReadingSink, StorageRecord};
use eyre::WrapErr;

pub type BoxedSink = Box<dyn ReadingSink + Send>;

/// Timestamp layout of the `sensor_data` table (SQLite `CURRENT_TIMESTAMP`, UTC).
pub const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS sensor_data(
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
    temperature REAL,
    humidity REAL
)";

/// Open the sink named by `storage.format`.
pub fn open_sink(cfg: &airsense_config::StorageCfg) -> eyre::Result<BoxedSink> {
    let path = Path::new(&cfg.path);
    match cfg.format.as_str() {
        "csv" => Ok(Box::new(CsvSink::open(path)?)),
        "sqlite" => Ok(Box::new(SqliteSink::open(path)?)),
        other => eyre::bail!("invalid configuration: unknown storage.format {other:?}"),
    }
}

/// Inserts rows into the `sensor_data` table, creating it on first use.
pub struct SqliteSink {
    conn: rusqlite::Connection,
}

impl SqliteSink {
    pub fn open(path: &Path) -> eyre::Result<Self> {
        let conn = rusqlite::Connection::open(path)
            .wrap_err_with(|| format!("open storage database {path:?}"))?;
        conn.execute(CREATE_TABLE, [])
            .wrap_err("create sensor_data table")?;
        Ok(Self { conn })
    }
}

impl ReadingSink for SqliteSink {
    fn store(
        &mut self,
        record: &StorageRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.conn.execute(
            "INSERT INTO sensor_data (timestamp, temperature, humidity) VALUES (?1, ?2, ?3)",
            rusqlite::params![
                record.timestamp.format(SQLITE_TIMESTAMP).to_string(),
                record.temperature,
                record.humidity
            ],
        )?;
        Ok(())
    }
}

/// Appends `timestamp,temperature,humidity` rows; writes the header only when
/// the file is new or empty.
pub struct CsvSink {
    writer: csv::Writer<std::fs::File>,
}

impl CsvSink {
    pub fn open(path: &Path) -> eyre::Result<Self> {
        let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eyre::eyre!("open storage file {:?}: {}", path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(["timestamp", "temperature", "humidity"])?;
            writer.flush()?;
        }
        Ok(Self { writer })
    }
}

impl ReadingSink for CsvSink {
    fn store(
        &mut self,
        record: &StorageRecord,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.writer.write_record([
            record.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            record.temperature.to_string(),
            record.humidity.to_string(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}
