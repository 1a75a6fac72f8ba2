use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sampler::Sample;

pub const HEADER: [&str; 7] = ["Time", "CPU", "RAM", "Disk", "Down", "Up", "Ping"];

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("cannot finish row: {0}")]
    Buffer(String),
}

/// One line of the sample log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub time: String,
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub down: f64,
    pub up: f64,
    /// Milliseconds; 0 when the probe target was unreachable.
    pub ping: f64,
}

impl LogRow {
    pub fn from_sample(sample: &Sample) -> Self {
        Self {
            time: sample.taken_at.format("%H:%M:%S").to_string(),
            cpu: sample.cpu_percent,
            ram: sample.memory.percent,
            disk: sample.root_volume().map_or(0.0, |v| v.percent),
            down: sample.throughput.down,
            up: sample.throughput.up,
            ping: sample
                .latency
                .map_or(0.0, |rtt| rtt.as_secs_f64() * 1000.0),
        }
    }

    fn fields(&self) -> [String; 7] {
        [
            self.time.clone(),
            format!("{:.1}", self.cpu),
            format!("{:.1}", self.ram),
            format!("{:.1}", self.disk),
            format!("{:.2}", self.down),
            format!("{:.2}", self.up),
            format!("{:.1}", self.ping),
        ]
    }
}

/// Comma-separated sample log. The file is opened for each append and a
/// header is written when it starts out empty.
#[derive(Debug, Clone)]
pub struct SampleLog {
    path: PathBuf,
}

impl SampleLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn append(&self, row: &LogRow) -> Result<(), RecordError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        if fresh {
            wtr.write_record(HEADER)?;
        }
        wtr.write_record(row.fields())?;
        let bytes = wtr
            .into_inner()
            .map_err(|e| RecordError::Buffer(e.error().to_string()))?;

        // a single write keeps rows whole
        file.write_all(&bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::fixture_sample;

    fn row(time: &str) -> LogRow {
        LogRow {
            time: time.into(),
            cpu: 12.34,
            ram: 56.0,
            disk: 78.9,
            down: 2048.0,
            up: 1024.5,
            ping: 0.0,
        }
    }

    #[test]
    fn test_three_appends_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let log = SampleLog::new(dir.path().join("metrics.csv"));
        for t in ["10:00:00", "10:00:01", "10:00:02"] {
            log.append(&row(t)).unwrap();
        }
        let text = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Time,CPU,RAM,Disk,Down,Up,Ping");
        assert_eq!(lines[1], "10:00:00,12.3,56.0,78.9,2048.00,1024.50,0.0");
        assert!(lines.iter().all(|l| l.split(',').count() == 7));
    }

    #[test]
    fn test_existing_log_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        SampleLog::new(&path).append(&row("09:00:00")).unwrap();
        // a later run appends without a second header
        SampleLog::new(&path).append(&row("09:30:00")).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Time,CPU").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = SampleLog::new(dir.path().join("missing").join("metrics.csv"));
        assert!(matches!(log.append(&row("00:00:00")), Err(RecordError::Io(_))));
    }

    #[test]
    fn test_row_from_sample() {
        let sample = fixture_sample();
        let row = LogRow::from_sample(&sample);
        assert_eq!(row.ping, 0.0);
        assert_eq!(row.up, 1024.0);
        assert_eq!(row.down, 2048.0);
        assert!((row.disk - 30.0).abs() < f64::EPSILON);
        assert_eq!(row.time.len(), 8);
        assert_eq!(row.time.matches(':').count(), 2);
    }
}
