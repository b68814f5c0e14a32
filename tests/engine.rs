//! Engine integration tests.
//!
//! Documents come from an in-memory [`FakeLoader`], so no pdfium library is
//! needed; page images are real JPEG files written into a `TempDir`.

use image::{DynamicImage, Rgba, RgbaImage};
use pdf2jpg::{
    CancelToken, ConversionConfig, ConversionEngine, ConversionEvent, DocumentLoader,
    DocumentStatus, EventSink, Job, JobProgress, OpenError, PageError, PageSource, Pdf2JpgError,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

// ── Fake document backend ────────────────────────────────────────────────────

type RenderHook = Arc<dyn Fn(&Path, usize) + Send + Sync>;

#[derive(Clone, Default)]
struct FakeDoc {
    pages: usize,
    encrypted: bool,
    /// 1-based page numbers whose render fails.
    failing: Vec<usize>,
    /// Every open after the first (the inspection) fails.
    unreadable_on_reopen: bool,
    /// Page count reported by opens after the first.
    reopen_pages: Option<usize>,
}

impl FakeDoc {
    fn pages(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn encrypted() -> Self {
        Self {
            encrypted: true,
            ..Self::default()
        }
    }

    fn failing(mut self, pages: &[usize]) -> Self {
        self.failing = pages.to_vec();
        self
    }
}

#[derive(Default)]
struct FakeLoader {
    docs: HashMap<PathBuf, FakeDoc>,
    opens: Mutex<HashMap<PathBuf, usize>>,
    on_render: Option<RenderHook>,
}

impl FakeLoader {
    fn with(mut self, path: &str, doc: FakeDoc) -> Self {
        self.docs.insert(PathBuf::from(path), doc);
        self
    }

    fn on_render(mut self, hook: RenderHook) -> Self {
        self.on_render = Some(hook);
        self
    }
}

impl DocumentLoader for FakeLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, OpenError> {
        let doc = self.docs.get(path).ok_or_else(|| OpenError::Unreadable {
            path: path.to_path_buf(),
            detail: "no such fake document".into(),
        })?;
        if doc.encrypted {
            return Err(OpenError::PasswordRequired {
                path: path.to_path_buf(),
            });
        }

        let opens = {
            let mut opens = self.opens.lock().unwrap();
            let n = opens.entry(path.to_path_buf()).or_insert(0);
            *n += 1;
            *n
        };
        if opens > 1 && doc.unreadable_on_reopen {
            return Err(OpenError::Unreadable {
                path: path.to_path_buf(),
                detail: "vanished".into(),
            });
        }
        let pages = match (opens, doc.reopen_pages) {
            (n, Some(p)) if n > 1 => p,
            _ => doc.pages,
        };

        Ok(Box::new(FakeSource {
            path: path.to_path_buf(),
            pages,
            failing: doc.failing.clone(),
            hook: self.on_render.clone(),
        }))
    }
}

struct FakeSource {
    path: PathBuf,
    pages: usize,
    failing: Vec<usize>,
    hook: Option<RenderHook>,
}

impl PageSource for FakeSource {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn render_page(&self, index: usize, _scale: f32) -> Result<DynamicImage, PageError> {
        if let Some(hook) = &self.hook {
            hook(&self.path, index);
        }
        if self.failing.contains(&(index + 1)) {
            return Err(PageError::RenderFailed {
                page: index + 1,
                detail: "synthetic failure".into(),
            });
        }
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            6,
            Rgba([30, 60, 90, 255]),
        )))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Engine logs show up with `RUST_LOG=pdf2jpg=debug cargo test -- --nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine(loader: FakeLoader) -> (ConversionEngine, Arc<FakeLoader>) {
    init_tracing();
    let loader = Arc::new(loader);
    let engine = ConversionEngine::new(
        Arc::clone(&loader) as Arc<dyn DocumentLoader>,
        ConversionConfig::default(),
    );
    (engine, loader)
}

fn queue(loader: &FakeLoader, dest: &Path, name: &str, paths: &[&str]) -> Job {
    let mut job = Job::new(Some(dest.to_path_buf()), name);
    job.add_paths(paths, loader);
    job
}

fn drain(rx: &mut UnboundedReceiver<ConversionEvent>) -> Vec<ConversionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn run(engine: &ConversionEngine, job: Job) -> (pdf2jpg::RunOutcome, Vec<ConversionEvent>) {
    run_with(engine, job, &CancelToken::new())
}

fn run_with(
    engine: &ConversionEngine,
    job: Job,
    cancel: &CancelToken,
) -> (pdf2jpg::RunOutcome, Vec<ConversionEvent>) {
    let (sink, mut rx) = EventSink::channel();
    let outcome = engine.run(job, cancel, &sink);
    (outcome, drain(&mut rx))
}

fn progress_for(events: &[ConversionEvent], index: usize) -> Vec<(usize, usize)> {
    events
        .iter()
        .filter_map(|e| match e {
            ConversionEvent::Progress {
                document_index,
                page_number,
                completed_pages,
            } if *document_index == index => Some((*page_number, *completed_pages)),
            _ => None,
        })
        .collect()
}

fn statuses_for(events: &[ConversionEvent], index: usize) -> Vec<DocumentStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            ConversionEvent::StatusChanged {
                document_index,
                status,
            } if *document_index == index => Some(*status),
            _ => None,
        })
        .collect()
}

fn sorted_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn assert_invariants(job: &Job) {
    for item in &job.items {
        assert!(
            item.completed_pages <= item.page_count,
            "{}: {} > {}",
            item.display_name,
            item.completed_pages,
            item.page_count
        );
        for &p in &item.failed_pages {
            assert!(
                (1..=item.page_count).contains(&p),
                "{}: failed page {p} out of range",
                item.display_name
            );
        }
        assert!(item.status.is_terminal(), "{} not terminal", item.display_name);
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn single_document_is_fully_converted() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default().with("/in/Report.pdf", FakeDoc::pages(3));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Report.pdf"]);

    let (outcome, events) = run(&engine, job);

    let folder = out.path().join("Batch").join("Report");
    assert_eq!(
        sorted_files(&folder),
        vec!["Report_page_1.jpg", "Report_page_2.jpg", "Report_page_3.jpg"]
    );
    assert!(image::open(folder.join("Report_page_2.jpg")).is_ok());

    let item = &outcome.job.items[0];
    assert_eq!(item.status, DocumentStatus::Completed);
    assert_eq!(item.completed_pages, 3);
    assert!(item.failed_pages.is_empty());
    assert!(outcome.fatal.is_none());
    assert!(!outcome.cancelled);
    assert!(!outcome.job.running);

    assert_eq!(progress_for(&events, 0), vec![(1, 1), (2, 2), (3, 3)]);
    assert_eq!(
        statuses_for(&events, 0),
        vec![DocumentStatus::InProgress, DocumentStatus::Completed]
    );
    assert_eq!(events.len(), 6);
    assert_eq!(events.last(), Some(&ConversionEvent::Finished));
}

#[test]
fn colliding_names_get_suffixes_in_queue_order() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default()
        .with("/in/a/Invoice.pdf", FakeDoc::pages(1))
        .with("/in/b/Invoice.pdf", FakeDoc::pages(2));
    let (engine, loader) = engine(loader);
    let job = queue(
        &loader,
        out.path(),
        "Batch",
        &["/in/a/Invoice.pdf", "/in/b/Invoice.pdf"],
    );

    let (outcome, _) = run(&engine, job);

    let batch = out.path().join("Batch");
    assert_eq!(sorted_files(&batch), vec!["Invoice", "Invoice_1"]);
    assert_eq!(sorted_files(&batch.join("Invoice")), vec!["Invoice_page_1.jpg"]);
    assert_eq!(
        sorted_files(&batch.join("Invoice_1")),
        vec!["Invoice_1_page_1.jpg", "Invoice_1_page_2.jpg"]
    );
    assert_invariants(&outcome.job);
}

#[test]
fn encrypted_document_is_skipped_without_progress() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default().with("/in/Secret.pdf", FakeDoc::encrypted());
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Secret.pdf"]);
    assert_eq!(job.items.len(), 1);
    assert!(job.items[0].encrypted);

    let (outcome, events) = run(&engine, job);

    assert_eq!(outcome.job.items[0].status, DocumentStatus::Skipped);
    assert!(progress_for(&events, 0).is_empty());
    assert_eq!(
        statuses_for(&events, 0),
        vec![DocumentStatus::InProgress, DocumentStatus::Skipped]
    );
    assert!(sorted_files(&out.path().join("Batch")).is_empty());
}

#[test]
fn cancellation_after_first_page_cancels_the_rest() {
    let out = TempDir::new().unwrap();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let loader = FakeLoader::default()
        .with("/in/Long.pdf", FakeDoc::pages(10))
        .with("/in/Next.pdf", FakeDoc::pages(2))
        .with("/in/Last.pdf", FakeDoc::pages(2))
        .on_render(Arc::new(move |path, index| {
            if path.ends_with("Long.pdf") && index == 0 {
                trigger.cancel();
            }
        }));
    let (engine, loader) = engine(loader);
    let job = queue(
        &loader,
        out.path(),
        "Batch",
        &["/in/Long.pdf", "/in/Next.pdf", "/in/Last.pdf"],
    );

    let (outcome, events) = run_with(&engine, job, &cancel);

    let items = &outcome.job.items;
    assert_eq!(items[0].status, DocumentStatus::Cancelled);
    assert_eq!(items[0].completed_pages, 1);
    assert_eq!(items[1].status, DocumentStatus::Cancelled);
    assert_eq!(items[2].status, DocumentStatus::Cancelled);
    assert!(outcome.cancelled);
    assert!(outcome.job.cancelled);

    assert_eq!(progress_for(&events, 0), vec![(1, 1)]);
    assert!(progress_for(&events, 1).is_empty());
    assert!(progress_for(&events, 2).is_empty());
    assert_eq!(
        statuses_for(&events, 0),
        vec![DocumentStatus::InProgress, DocumentStatus::Cancelled]
    );
    assert_eq!(statuses_for(&events, 1), vec![DocumentStatus::Cancelled]);
    assert_eq!(statuses_for(&events, 2), vec![DocumentStatus::Cancelled]);
    assert_eq!(events.last(), Some(&ConversionEvent::Finished));

    // Already-written pages stay on disk.
    assert_eq!(
        sorted_files(&out.path().join("Batch").join("Long")),
        vec!["Long_page_01.jpg"]
    );
}

#[test]
fn cancellation_before_start_cancels_everything() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default()
        .with("/in/A.pdf", FakeDoc::pages(2))
        .with("/in/B.pdf", FakeDoc::pages(2));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/A.pdf", "/in/B.pdf"]);

    let cancel = CancelToken::new();
    cancel.cancel();
    let (outcome, events) = run_with(&engine, job, &cancel);

    assert!(outcome
        .job
        .items
        .iter()
        .all(|i| i.status == DocumentStatus::Cancelled && i.completed_pages == 0));
    assert_eq!(events.len(), 3, "two Cancelled + Finished: {events:?}");
}

#[test]
fn single_page_failure_still_completes() {
    let out = TempDir::new().unwrap();
    let loader =
        FakeLoader::default().with("/in/Scan.pdf", FakeDoc::pages(3).failing(&[2]));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Scan.pdf"]);

    let (outcome, events) = run(&engine, job);

    let item = &outcome.job.items[0];
    assert_eq!(item.completed_pages, 2);
    assert_eq!(item.failed_pages, vec![2]);
    assert_eq!(item.status, DocumentStatus::Completed);

    // The failed page still produces a Progress event with an unchanged count.
    assert_eq!(progress_for(&events, 0), vec![(1, 1), (2, 1), (3, 2)]);
    assert_eq!(
        sorted_files(&out.path().join("Batch").join("Scan")),
        vec!["Scan_page_1.jpg", "Scan_page_3.jpg"]
    );
}

#[test]
fn all_pages_failing_marks_document_failed_and_run_continues() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default()
        .with("/in/Bad.pdf", FakeDoc::pages(2).failing(&[1, 2]))
        .with("/in/Good.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Bad.pdf", "/in/Good.pdf"]);

    let (outcome, _) = run(&engine, job);

    assert_eq!(outcome.job.items[0].status, DocumentStatus::Failed);
    assert_eq!(outcome.job.items[0].failed_pages, vec![1, 2]);
    assert_eq!(outcome.job.items[1].status, DocumentStatus::Completed);
    assert_invariants(&outcome.job);
}

#[test]
fn reopen_failure_marks_document_failed() {
    let out = TempDir::new().unwrap();
    let vanishing = FakeDoc {
        unreadable_on_reopen: true,
        ..FakeDoc::pages(4)
    };
    let loader = FakeLoader::default()
        .with("/in/Gone.pdf", vanishing)
        .with("/in/Here.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Gone.pdf", "/in/Here.pdf"]);

    let (outcome, events) = run(&engine, job);

    assert_eq!(outcome.job.items[0].status, DocumentStatus::Failed);
    assert!(progress_for(&events, 0).is_empty());
    assert_eq!(outcome.job.items[1].status, DocumentStatus::Completed);
}

#[test]
fn subfolder_creation_failure_marks_document_failed() {
    let out = TempDir::new().unwrap();
    let batch = out.path().join("Batch");
    std::fs::create_dir_all(&batch).unwrap();
    std::fs::write(batch.join("Blocked"), b"a file, not a folder").unwrap();

    let loader = FakeLoader::default()
        .with("/in/Blocked.pdf", FakeDoc::pages(1))
        .with("/in/Open.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Blocked.pdf", "/in/Open.pdf"]);

    let (outcome, _) = run(&engine, job);

    assert_eq!(outcome.job.items[0].status, DocumentStatus::Failed);
    assert_eq!(outcome.job.items[1].status, DocumentStatus::Completed);
}

#[test]
fn page_count_change_since_inspection_uses_fresh_count() {
    let out = TempDir::new().unwrap();
    let grown = FakeDoc {
        reopen_pages: Some(3),
        ..FakeDoc::pages(2)
    };
    let loader = FakeLoader::default().with("/in/Grown.pdf", grown);
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Grown.pdf"]);
    assert_eq!(job.items[0].page_count, 2);

    let (outcome, _) = run(&engine, job);

    assert_eq!(outcome.job.items[0].page_count, 3);
    assert_eq!(outcome.job.items[0].completed_pages, 3);
    assert_invariants(&outcome.job);
}

#[test]
fn projection_follows_a_document_that_grew_since_inspection() {
    let out = TempDir::new().unwrap();
    let grown = FakeDoc {
        reopen_pages: Some(3),
        ..FakeDoc::pages(2)
    };
    let loader = FakeLoader::default()
        .with("/in/Grown.pdf", grown)
        .with("/in/Other.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Grown.pdf", "/in/Other.pdf"]);

    let mut view = JobProgress::from_job(&job);
    assert_eq!(view.total_pages(), 3);
    let (outcome, events) = run(&engine, job);
    for event in &events {
        view.apply(event);
    }

    assert_eq!(view.completed_pages(), outcome.job.completed_pages());
    assert_eq!(view.total_pages(), outcome.job.total_pages());
    assert_eq!(view.documents[0].page_count, 3);
    assert_eq!(view.documents[0].completed_pages, 3);
    assert!((view.progress() - outcome.job.progress()).abs() < f64::EPSILON);
}

// ── Naming properties ────────────────────────────────────────────────────────

#[test]
fn page_numbers_are_padded_to_page_count_width() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default()
        .with("/in/Big.pdf", FakeDoc::pages(120))
        .with("/in/Small.pdf", FakeDoc::pages(5));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Big.pdf", "/in/Small.pdf"]);

    run(&engine, job);

    let big = sorted_files(&out.path().join("Batch").join("Big"));
    assert_eq!(big.len(), 120);
    assert_eq!(big.first().map(String::as_str), Some("Big_page_001.jpg"));
    assert_eq!(big.last().map(String::as_str), Some("Big_page_120.jpg"));

    let small = sorted_files(&out.path().join("Batch").join("Small"));
    assert_eq!(small.first().map(String::as_str), Some("Small_page_1.jpg"));
    assert_eq!(small.last().map(String::as_str), Some("Small_page_5.jpg"));
}

#[test]
fn fresh_run_starts_from_empty_used_names() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default()
        .with("/in/x/Invoice.pdf", FakeDoc::pages(1))
        .with("/in/y/Invoice.pdf", FakeDoc::pages(1))
        .with("/in/Solo.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);

    // First run creates Invoice and Invoice_1.
    let job = queue(
        &loader,
        out.path(),
        "Batch",
        &["/in/x/Invoice.pdf", "/in/y/Invoice.pdf"],
    );
    run(&engine, job.clone());
    // Second run into the same folder resolves names the same way.
    run(&engine, job);
    assert_eq!(
        sorted_files(&out.path().join("Batch")),
        vec!["Invoice", "Invoice_1"]
    );

    // A folder left on disk by an earlier run does not push a new run to `_1`.
    std::fs::create_dir_all(out.path().join("Batch").join("Solo_1")).unwrap();
    let job = queue(&loader, out.path(), "Batch", &["/in/Solo.pdf"]);
    run(&engine, job);
    assert_eq!(
        sorted_files(&out.path().join("Batch").join("Solo")),
        vec!["Solo_page_1.jpg"]
    );
    assert!(sorted_files(&out.path().join("Batch").join("Solo_1")).is_empty());
}

#[test]
fn job_folder_name_is_sanitised() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default().with("/in/Doc.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "  Q1: scans? ", &["/in/Doc.pdf"]);

    run(&engine, job);

    assert!(out.path().join("Q1- scans-").join("Doc").is_dir());
}

// ── Fatal errors ─────────────────────────────────────────────────────────────

#[test]
fn missing_destination_aborts_with_error_then_finished() {
    let loader = FakeLoader::default().with("/in/Doc.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);
    let mut job = Job::new(None, "Batch");
    job.add_paths(&["/in/Doc.pdf"], &*loader);

    let (outcome, events) = run(&engine, job);

    assert!(matches!(
        outcome.fatal,
        Some(Pdf2JpgError::InvalidDestination { .. })
    ));
    assert_eq!(events.len(), 2, "{events:?}");
    assert!(matches!(events[0], ConversionEvent::Error { .. }));
    assert_eq!(events[1], ConversionEvent::Finished);
    assert_eq!(outcome.job.items[0].status, DocumentStatus::Pending);
}

#[test]
fn unwritable_job_folder_aborts_before_any_document() {
    let out = TempDir::new().unwrap();
    // The job folder path is occupied by a regular file.
    std::fs::write(out.path().join("Batch"), b"x").unwrap();
    let loader = FakeLoader::default().with("/in/Doc.pdf", FakeDoc::pages(1));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Doc.pdf"]);

    let (outcome, events) = run(&engine, job);

    assert!(matches!(
        outcome.fatal,
        Some(Pdf2JpgError::FolderCreationFailed { .. })
    ));
    assert!(statuses_for(&events, 0).is_empty());
    assert_eq!(events.last(), Some(&ConversionEvent::Finished));
}

// ── Mixed batch + projection ─────────────────────────────────────────────────

#[test]
fn projection_rebuilt_from_events_matches_final_job() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default()
        .with("/in/One.pdf", FakeDoc::pages(3).failing(&[3]))
        .with("/in/Two.pdf", FakeDoc::encrypted())
        .with("/in/Three.pdf", FakeDoc::pages(4));
    let (engine, loader) = engine(loader);
    let job = queue(
        &loader,
        out.path(),
        "Batch",
        &["/in/One.pdf", "/in/Two.pdf", "/in/Three.pdf", "/in/Missing.pdf"],
    );
    assert_eq!(job.items.len(), 3, "unreadable input dropped on add");

    let mut view = JobProgress::from_job(&job);
    let (outcome, events) = run(&engine, job);
    for event in &events {
        view.apply(event);
    }

    assert!(view.finished);
    assert_eq!(view.completed_pages(), outcome.job.completed_pages());
    assert_eq!(view.total_pages(), outcome.job.total_pages());
    for (doc, item) in view.documents.iter().zip(&outcome.job.items) {
        assert_eq!(doc.status, item.status);
        assert_eq!(doc.completed_pages, item.completed_pages);
    }

    let summary = outcome.job.summary();
    assert_eq!((summary.completed, summary.skipped), (2, 1));
    assert_eq!(summary.completed_pages, 6);
    assert_eq!(summary.failed_pages, 1);
    assert_invariants(&outcome.job);
}

#[tokio::test]
async fn background_run_streams_events_and_returns_job() {
    let out = TempDir::new().unwrap();
    let loader = FakeLoader::default()
        .with("/in/A.pdf", FakeDoc::pages(2))
        .with("/in/B.pdf", FakeDoc::pages(3));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/A.pdf", "/in/B.pdf"]);
    let mut view = JobProgress::from_job(&job);

    let mut handle = engine.start(job);
    let mut finished = 0;
    while let Some(event) = handle.events.recv().await {
        view.apply(&event);
        if event == ConversionEvent::Finished {
            finished += 1;
        }
    }
    let outcome = handle.join().await.expect("worker should not panic");

    assert_eq!(finished, 1);
    assert!((view.progress() - 1.0).abs() < f64::EPSILON);
    assert_eq!(outcome.job.summary().completed, 2);
    assert!(!outcome.cancelled);
}

#[tokio::test]
async fn cancelling_through_the_handle_stops_a_background_run() {
    use std::sync::Barrier;

    let out = TempDir::new().unwrap();
    // The worker parks inside the first render until the test has cancelled.
    let gate = Arc::new(Barrier::new(2));
    let worker_gate = Arc::clone(&gate);
    let loader = FakeLoader::default()
        .with("/in/Long.pdf", FakeDoc::pages(10))
        .with("/in/Next.pdf", FakeDoc::pages(2))
        .on_render(Arc::new(move |path, index| {
            if path.ends_with("Long.pdf") && index == 0 {
                worker_gate.wait();
                worker_gate.wait();
            }
        }));
    let (engine, loader) = engine(loader);
    let job = queue(&loader, out.path(), "Batch", &["/in/Long.pdf", "/in/Next.pdf"]);

    let mut handle = engine.start(job);
    gate.wait();
    handle.cancel();
    gate.wait();

    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }
    let outcome = handle.join().await.expect("worker should not panic");

    assert!(outcome.cancelled);
    assert_eq!(outcome.job.items[0].status, DocumentStatus::Cancelled);
    assert_eq!(outcome.job.items[0].completed_pages, 1);
    assert_eq!(outcome.job.items[1].status, DocumentStatus::Cancelled);
    assert_eq!(progress_for(&events, 0), vec![(1, 1)]);
    assert!(progress_for(&events, 1).is_empty());
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == ConversionEvent::Finished)
            .count(),
        1
    );
    assert_eq!(events.last(), Some(&ConversionEvent::Finished));
}
