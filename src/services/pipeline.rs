use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::entry::{ResourceEntry, ResourceFile, EMPTY_SENTINEL};
use crate::parsers::lng;
use crate::services::ai::Translate;
use crate::services::ai_types::TranslationFailure;

pub struct PipelineConfig<'a> {
    pub target_lang: &'a str,
    /// Number of entries to skip from the start of the file.
    pub start_from: usize,
    pub max_empty_attempts: usize,
    pub retry_delay: Duration,
    pub entry_delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub total: usize,
    pub skipped: usize,
    pub processed: usize,
    pub translated: usize,
    pub attempts: usize,
    /// Keys written with the `[EMPTY]` sentinel.
    pub empty_keys: Vec<String>,
    pub elapsed: Duration,
}

/// Observer for the batch run. All methods default to doing nothing.
pub trait Progress {
    fn start(&mut self, _total: usize, _skipped: usize) {}

    fn attempt_failed(
        &mut self,
        _entry: &ResourceEntry,
        _attempt: usize,
        _failure: &TranslationFailure,
    ) {
    }

    fn entry_done(&mut self, _done: usize, _pending: usize, _entry: &ResourceEntry, _result: &str) {}

    fn finish(&mut self, _report: &RunReport) {}
}

/// Progress sink for callers that only want the report.
pub struct Silent;

impl Progress for Silent {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    pub text: String,
    pub attempts: usize,
    pub translated: bool,
}

/// Translates every entry after `start_from`, appending one line per entry to `output`.
pub fn run<T, P>(
    file: &ResourceFile,
    client: &T,
    progress: &mut P,
    output: &Path,
    cfg: &PipelineConfig,
) -> Result<RunReport>
where
    T: Translate + ?Sized,
    P: Progress + ?Sized,
{
    let started = Instant::now();

    let total = file.len();
    let skipped = cfg.start_from.min(total);
    let pending = total - skipped;

    let mut report = RunReport {
        total,
        skipped,
        ..RunReport::default()
    };

    info!(
        total,
        skipped,
        pending,
        language = cfg.target_lang,
        output = %output.display(),
        "starting translation run"
    );
    progress.start(total, skipped);

    for (i, entry) in file.iter().skip(skipped).enumerate() {
        let outcome = translate_entry(client, entry, cfg, progress);

        lng::append(output, &lng::encode(&entry.key, &outcome.text))?;

        report.processed += 1;
        report.attempts += outcome.attempts;
        if outcome.translated {
            report.translated += 1;
        } else {
            warn!(
                key = %entry.key,
                attempts = outcome.attempts,
                sentinel = EMPTY_SENTINEL,
                "no translation, recorded sentinel"
            );
            report.empty_keys.push(entry.key.clone());
        }

        progress.entry_done(i + 1, pending, entry, &outcome.text);

        if i + 1 < pending && !cfg.entry_delay.is_zero() {
            thread::sleep(cfg.entry_delay);
        }
    }

    report.elapsed = started.elapsed();

    info!(
        processed = report.processed,
        translated = report.translated,
        empty = report.empty_keys.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "translation run finished"
    );
    progress.finish(&report);

    Ok(report)
}

/// Calls the client until it returns text or `max_empty_attempts` attempts came back empty.
pub fn translate_entry<T, P>(
    client: &T,
    entry: &ResourceEntry,
    cfg: &PipelineConfig,
    progress: &mut P,
) -> EntryOutcome
where
    T: Translate + ?Sized,
    P: Progress + ?Sized,
{
    let mut empty_count = 0usize;

    loop {
        let attempt = empty_count + 1;

        let failure = match client.translate(entry.text(), cfg.target_lang, entry.hint()) {
            Ok(text) if !text.trim().is_empty() => {
                return EntryOutcome {
                    text,
                    attempts: attempt,
                    translated: true,
                };
            }
            Ok(_) => TranslationFailure::EmptyContent,
            Err(f) => f,
        };

        empty_count += 1;
        debug!(key = %entry.key, attempt, error = %failure, "empty translation");
        progress.attempt_failed(entry, attempt, &failure);

        if empty_count >= cfg.max_empty_attempts {
            return EntryOutcome {
                text: EMPTY_SENTINEL.to_string(),
                attempts: attempt,
                translated: false,
            };
        }

        if !cfg.retry_delay.is_zero() {
            thread::sleep(cfg.retry_delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;

    type Reply = std::result::Result<String, TranslationFailure>;

    /// Replays scripted replies, then keeps answering with `fallback`.
    struct Scripted {
        replies: RefCell<VecDeque<Reply>>,
        fallback: Reply,
        calls: RefCell<Vec<(String, Option<String>)>>,
    }

    impl Scripted {
        fn new(replies: Vec<Reply>, fallback: Reply) -> Self {
            Scripted {
                replies: RefCell::new(replies.into()),
                fallback,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn always(reply: Reply) -> Self {
            Self::new(Vec::new(), reply)
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Translate for Scripted {
        fn translate(&self, text: &str, _target_lang: &str, hint: Option<&str>) -> Reply {
            self.calls
                .borrow_mut()
                .push((text.to_string(), hint.map(str::to_string)));
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        started: Option<(usize, usize)>,
        failures: Vec<(String, usize)>,
        done: Vec<(usize, usize, String)>,
        finished: bool,
    }

    impl Progress for Recorder {
        fn start(&mut self, total: usize, skipped: usize) {
            self.started = Some((total, skipped));
        }

        fn attempt_failed(&mut self, entry: &ResourceEntry, attempt: usize, _: &TranslationFailure) {
            self.failures.push((entry.key.clone(), attempt));
        }

        fn entry_done(&mut self, done: usize, pending: usize, entry: &ResourceEntry, _: &str) {
            self.done.push((done, pending, entry.key.clone()));
        }

        fn finish(&mut self, _: &RunReport) {
            self.finished = true;
        }
    }

    fn cfg(start_from: usize) -> PipelineConfig<'static> {
        PipelineConfig {
            target_lang: "French",
            start_from,
            max_empty_attempts: 3,
            retry_delay: Duration::ZERO,
            entry_delay: Duration::ZERO,
        }
    }

    fn entry(key: &str, text: &str) -> ResourceEntry {
        ResourceEntry::new(key, vec![text.to_string()])
    }

    #[test]
    fn first_success_needs_one_call() {
        let client = Scripted::always(Ok("Bonjour".into()));
        let out = translate_entry(&client, &entry("A", "Hello"), &cfg(0), &mut Silent);

        assert_eq!(
            out,
            EntryOutcome {
                text: "Bonjour".into(),
                attempts: 1,
                translated: true
            }
        );
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn gives_up_after_three_empty_results() {
        let client = Scripted::always(Err(TranslationFailure::EmptyContent));
        let mut rec = Recorder::default();
        let out = translate_entry(&client, &entry("B", "Bye"), &cfg(0), &mut rec);

        assert_eq!(out.text, EMPTY_SENTINEL);
        assert!(!out.translated);
        assert_eq!(client.call_count(), 3);
        assert_eq!(
            rec.failures,
            vec![("B".into(), 1), ("B".into(), 2), ("B".into(), 3)]
        );
    }

    #[test]
    fn recovers_when_a_retry_succeeds() {
        let client = Scripted::new(
            vec![
                Err(TranslationFailure::NoChoices),
                Ok("   ".into()),
                Ok("Au revoir".into()),
            ],
            Err(TranslationFailure::EmptyContent),
        );
        let out = translate_entry(&client, &entry("B", "Bye"), &cfg(0), &mut Silent);

        assert_eq!(out.text, "Au revoir");
        assert_eq!(out.attempts, 3);
        assert!(out.translated);
    }

    #[test]
    fn custom_attempt_cap_is_respected() {
        let client = Scripted::always(Err(TranslationFailure::Transport("refused".into())));
        let mut c = cfg(0);
        c.max_empty_attempts = 1;
        let out = translate_entry(&client, &entry("X", "x"), &c, &mut Silent);

        assert_eq!(out.attempts, 1);
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn hint_is_forwarded_to_the_client() {
        let client = Scripted::always(Ok("Bonjour".into()));
        let e = ResourceEntry::new("A", vec!["Hello".into(), "male_greeting".into()]);
        translate_entry(&client, &e, &cfg(0), &mut Silent);

        assert_eq!(
            client.calls.borrow()[0],
            ("Hello".to_string(), Some("male_greeting".to_string()))
        );
    }

    #[test]
    fn run_skips_offset_and_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("French.lng");
        let file = lng::decode(["a;one", "b;two", "c;three", "d;four"]);

        let client = Scripted::new(
            vec![Ok("trois".into())],
            Err(TranslationFailure::EmptyContent),
        );
        let mut rec = Recorder::default();
        let report = run(&file, &client, &mut rec, &out, &cfg(2)).unwrap();

        assert_eq!(fs::read_to_string(&out).unwrap(), "c;trois\nd;[EMPTY]\n");
        assert_eq!(report.total, 4);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.processed, 2);
        assert_eq!(report.translated, 1);
        assert_eq!(report.attempts, 4);
        assert_eq!(report.empty_keys, vec!["d".to_string()]);
        assert_eq!(rec.started, Some((4, 2)));
        assert_eq!(rec.done, vec![(1, 2, "c".into()), (2, 2, "d".into())]);
        assert!(rec.finished);
        assert_eq!(client.calls.borrow()[0].0, "three");
    }

    #[test]
    fn offset_past_the_end_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("French.lng");
        let file = lng::decode(["a;one", "b;two"]);
        let client = Scripted::always(Ok("x".into()));

        let report = run(&file, &client, &mut Silent, &out, &cfg(10)).unwrap();

        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(client.call_count(), 0);
        assert!(!out.exists());
    }

    #[test]
    fn append_failure_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing-dir").join("French.lng");
        let file = lng::decode(["a;one"]);
        let client = Scripted::always(Ok("un".into()));

        assert!(run(&file, &client, &mut Silent, &out, &cfg(0)).is_err());
    }
}
