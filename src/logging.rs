// Run log module: every run writes its own log file under logs/. The
// handle is passed explicitly to the components that need it instead of
// going through a process-global logger, which keeps the pipeline
// testable. Each line is mirrored to `tracing` so the console tells the
// same story as the file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;

pub struct RunLog {
    sink: Box<dyn Write>,
}

impl RunLog {
    /// Open (and truncate) the per-run log file.
    pub fn create(path: &Path) -> io::Result<RunLog> {
        let file = File::create(path)?;
        Ok(RunLog {
            sink: Box::new(file),
        })
    }

    /// A log that goes nowhere; used by tests.
    #[cfg(test)]
    pub fn discard() -> RunLog {
        RunLog {
            sink: Box::new(io::sink()),
        }
    }

    /// Record one timestamped line in the per-run file and mirror it to
    /// the console logger. Sink write errors do not abort the run.
    pub fn info(&mut self, msg: &str) {
        tracing::info!("{msg}");
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(self.sink, "{stamp}: {msg}");
        let _ = self.sink.flush();
    }
}
