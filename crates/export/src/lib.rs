//! Export helpers for CSV and JSON artifacts.

pub mod windows {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    const HEADER: &str = "location_id,location,kind,open_s,close_s,duration_s,open_utc,close_utc";

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// Write the opportunity window CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// One opportunity window row.
    #[derive(Debug, Clone)]
    pub struct Record<'a> {
        pub location_id: usize,
        pub location: &'a str,
        pub kind: &'a str,
        pub open_s: f64,
        pub close_s: f64,
        pub open_utc: &'a str,
        pub close_utc: &'a str,
    }

    impl Record<'_> {
        /// Serialize the record to CSV, matching the header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{},{},{},{:.3},{:.3},{:.3},{},{}",
                self.location_id,
                self.location,
                self.kind,
                self.open_s,
                self.close_s,
                self.close_s - self.open_s,
                self.open_utc,
                self.close_utc,
            )
        }
    }
}

pub mod trace {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::fs::{self, File};
    use std::io::{self, BufWriter};
    use std::path::Path;

    /// One executed action.
    #[derive(Debug, Clone, Serialize)]
    pub struct TraceStep {
        pub step: u64,
        pub action_id: usize,
        pub action: String,
        pub start_s: f64,
        pub duration_s: f64,
        pub reward: f64,
        pub stored_data_fraction: f64,
        pub stored_charge_fraction: f64,
        pub max_wheel_speed_rpm: f64,
        pub pointing_error_deg: f64,
        pub in_eclipse: bool,
        pub window_closed_early: bool,
        pub terminated: bool,
        pub truncated: bool,
        pub termination_reason: Option<String>,
    }

    /// Run-level metadata.
    #[derive(Debug)]
    pub struct Metadata<'a> {
        pub satellite: &'a str,
        pub seed: u64,
        pub epoch_utc: &'a str,
        pub time_limit_s: f64,
    }

    #[derive(Serialize)]
    struct TraceDocument<'a> {
        satellite: &'a str,
        seed: u64,
        epoch_utc: &'a str,
        time_limit_s: f64,
        total_reward: f64,
        total_time_s: f64,
        steps: &'a [TraceStep],
    }

    /// Write an episode trace as pretty JSON, creating parent directories as needed.
    pub fn write_trace(output: &Path, meta: &Metadata<'_>, steps: &[TraceStep]) -> io::Result<()> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let document = TraceDocument {
            satellite: meta.satellite,
            seed: meta.seed,
            epoch_utc: meta.epoch_utc,
            time_limit_s: meta.time_limit_s,
            total_reward: steps.iter().map(|s| s.reward).sum(),
            total_time_s: steps.iter().map(|s| s.duration_s).sum(),
            steps,
        };
        to_writer_pretty(BufWriter::new(File::create(output)?), &document)?;
        Ok(())
    }
}
