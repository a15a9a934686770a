use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{self, Clear, ClearType, SetTitle};
use crossterm::{cursor, execute};
use tracing::debug;

use crate::model::entry::ResourceEntry;
use crate::services::ai_types::TranslationFailure;
use crate::services::pipeline::{Progress, RunReport};

/// Operator console: window title, per-entry echo and a periodic clear.
pub struct ConsoleProgress<W: Write = io::Stdout> {
    language: String,
    clear_every: usize,
    started: Instant,
    out: W,
}

impl ConsoleProgress {
    pub fn new(language: &str, clear_every: usize) -> Self {
        Self::with_writer(language, clear_every, io::stdout())
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn with_writer(language: &str, clear_every: usize, out: W) -> Self {
        ConsoleProgress {
            language: language.trim().to_string(),
            clear_every,
            started: Instant::now(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_start(&mut self, total: usize, skipped: usize) -> io::Result<()> {
        let title = title(&self.language, 0, total - skipped, Duration::ZERO);
        execute!(self.out, SetTitle(title))?;
        writeln!(
            self.out,
            "{} entries, skipping {}, translating into {}",
            total, skipped, self.language
        )
    }

    fn write_entry(
        &mut self,
        done: usize,
        pending: usize,
        entry: &ResourceEntry,
        result: &str,
    ) -> io::Result<()> {
        if self.clear_every > 0 && done > 1 && (done - 1) % self.clear_every == 0 {
            execute!(self.out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        }

        writeln!(self.out, "[{}] {}", entry.key, entry.text())?;
        writeln!(self.out, "  => {}", result)?;

        let title = title(&self.language, done, pending, self.started.elapsed());
        execute!(self.out, SetTitle(title))?;
        self.out.flush()
    }

    fn write_finish(&mut self, report: &RunReport) -> io::Result<()> {
        if !report.empty_keys.is_empty() {
            writeln!(
                self.out,
                "{} entries recorded as [EMPTY]: {}",
                report.empty_keys.len(),
                report.empty_keys.join(", ")
            )?;
        }
        writeln!(self.out, "Done.")?;
        self.out.flush()
    }
}

/// Console output is best effort; a closed or redirected stdout must not stop the run.
fn log_failure(stage: &str, result: io::Result<()>) {
    if let Err(e) = result {
        debug!(stage, error = %e, "console write failed");
    }
}

impl<W: Write> Progress for ConsoleProgress<W> {
    fn start(&mut self, total: usize, skipped: usize) {
        self.started = Instant::now();
        let result = self.write_start(total, skipped);
        log_failure("start", result);
    }

    fn attempt_failed(
        &mut self,
        entry: &ResourceEntry,
        attempt: usize,
        failure: &TranslationFailure,
    ) {
        let result = writeln!(
            self.out,
            "  {} attempt {} empty: {}",
            entry.key, attempt, failure
        );
        log_failure("retry", result);
    }

    fn entry_done(&mut self, done: usize, pending: usize, entry: &ResourceEntry, result: &str) {
        let written = self.write_entry(done, pending, entry, result);
        log_failure("entry", written);
    }

    fn finish(&mut self, report: &RunReport) {
        let result = self.write_finish(report);
        log_failure("finish", result);
    }
}

pub fn title(language: &str, done: usize, pending: usize, elapsed: Duration) -> String {
    format!(
        "{} | {}/{} | {}",
        language,
        done,
        pending,
        format_elapsed(elapsed)
    )
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Blocks until any key is pressed.
pub fn wait_for_key() -> io::Result<()> {
    println!("Press any key to exit...");
    terminal::enable_raw_mode()?;
    let result = loop {
        match event::read() {
            Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => break Ok(()),
            Ok(_) => continue,
            Err(e) => break Err(e),
        }
    };
    terminal::disable_raw_mode()?;
    result
}
