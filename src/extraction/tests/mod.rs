use crate::config::Config;
use crate::error::{Error, ExtractionError, FailureKind, FormatFailure};
use crate::extraction::zip::{decode_member_name, enclosed_path};
use crate::extraction::*;
use crate::sweep::{clear_failed_marks, process_existing_archives};
use crate::types::{
    ArchiveFormat, ArchiveOrigin, ArchiveTask, ExtractionOutcome, ExtractionReport, RetryDecision,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing the given files
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

/// Create a password-encrypted ZIP using the deprecated ZipCrypto method
/// (only encryption method supported for writing by zip 0.6)
fn create_encrypted_zip(archive_path: &Path, file_name: &str, content: &[u8], password: &[u8]) {
    use ::zip::unstable::write::FileOptionsExt;
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options = ::zip::write::FileOptions::default()
        .compression_method(::zip::CompressionMethod::Stored)
        .with_deprecated_encryption(password);
    writer.start_file(file_name, options).unwrap();
    std::io::Write::write_all(&mut writer, content).unwrap();
    writer.finish().unwrap();
}

/// Create a valid 7z archive at `archive_path` holding one file
fn create_7z_archive(archive_path: &Path, file_name: &str, content: &[u8]) {
    let source = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join(file_name), content).unwrap();
    sevenz_rust::compress_to_path(source.path(), archive_path).unwrap();
}

#[derive(Clone, Copy, Debug)]
enum Behavior {
    Succeed,
    Fail(FailureKind),
    /// Write one file into the destination, then fail as corrupt
    PartialThenFail,
}

/// Extractor double that counts calls and behaves as told
struct FakeExtractor {
    format: ArchiveFormat,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl FakeExtractor {
    fn new(format: ArchiveFormat, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            format,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FormatExtractor for FakeExtractor {
    fn format(&self) -> ArchiveFormat {
        self.format
    }

    fn extract(
        &self,
        _archive_path: &Path,
        dest_path: &Path,
    ) -> std::result::Result<Vec<PathBuf>, FormatFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => {
                let out = dest_path.join("content.txt");
                std::fs::write(&out, b"hello").unwrap();
                Ok(vec![out])
            }
            Behavior::Fail(kind) => Err(FormatFailure::new(self.format, kind, "fake failure")),
            Behavior::PartialThenFail => {
                std::fs::write(dest_path.join("partial.bin"), b"half").unwrap();
                Err(FormatFailure::corrupt(self.format, "truncated after first member"))
            }
        }
    }
}

struct Fakes {
    zip: Arc<FakeExtractor>,
    rar: Arc<FakeExtractor>,
    sevenz: Arc<FakeExtractor>,
}

impl Fakes {
    fn new(zip: Behavior, rar: Behavior, sevenz: Behavior) -> Self {
        Self {
            zip: FakeExtractor::new(ArchiveFormat::Zip, zip),
            rar: FakeExtractor::new(ArchiveFormat::Rar, rar),
            sevenz: FakeExtractor::new(ArchiveFormat::SevenZip, sevenz),
        }
    }

    fn engine(&self) -> ArchiveExtractor {
        ArchiveExtractor::with_extractors(
            &Config::default(),
            vec![
                self.zip.clone() as Arc<dyn FormatExtractor>,
                self.rar.clone() as Arc<dyn FormatExtractor>,
                self.sevenz.clone() as Arc<dyn FormatExtractor>,
            ],
        )
    }

    fn total_calls(&self) -> usize {
        self.zip.calls() + self.rar.calls() + self.sevenz.calls()
    }
}

fn corrupt_everywhere() -> Fakes {
    Fakes::new(
        Behavior::Fail(FailureKind::Corrupt),
        Behavior::Fail(FailureKind::Corrupt),
        Behavior::Fail(FailureKind::Corrupt),
    )
}

fn write_junk(path: &Path) {
    std::fs::write(path, b"definitely not an archive").unwrap();
}

// ---------------------------------------------------------------------------
// ZIP extractor
// ---------------------------------------------------------------------------

#[test]
fn zip_extract_writes_all_members() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("a.zip");
    create_zip_archive(&archive, &[("one.txt", b"1"), ("sub/two.txt", b"2")]);
    let dest = temp.path().join("out");
    std::fs::create_dir_all(&dest).unwrap();

    let files = ZipExtractor::default().extract(&archive, &dest).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(std::fs::read(dest.join("one.txt")).unwrap(), b"1");
    assert_eq!(std::fs::read(dest.join("sub").join("two.txt")).unwrap(), b"2");
}

#[test]
fn zip_extract_rejects_non_zip_as_mismatch() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("fake.zip");
    write_junk(&archive);

    let failure = ZipExtractor::default()
        .extract(&archive, temp.path())
        .unwrap_err();

    assert_eq!(failure.format, ArchiveFormat::Zip);
    assert_eq!(failure.kind, FailureKind::Mismatch);
}

#[test]
fn zip_extract_reports_encryption() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("locked.zip");
    create_encrypted_zip(&archive, "secret.txt", b"top secret", b"hunter2");

    let failure = ZipExtractor::default()
        .extract(&archive, temp.path())
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Encrypted);
}

#[test]
fn decode_member_name_prefers_utf8() {
    assert_eq!(
        decode_member_name("报告.txt".as_bytes(), encoding_rs::GBK),
        "报告.txt"
    );
}

#[test]
fn decode_member_name_falls_back_to_codepage() {
    // "中文.txt" in GBK
    let raw = [0xD6, 0xD0, 0xCE, 0xC4, b'.', b't', b'x', b't'];
    assert_eq!(decode_member_name(&raw, encoding_rs::GBK), "中文.txt");
}

#[test]
fn decode_member_name_falls_back_to_lossy() {
    let raw = [0xFF, b'a'];
    assert_eq!(decode_member_name(&raw, encoding_rs::GBK), "\u{FFFD}a");
}

#[test]
fn enclosed_path_strips_traversal() {
    assert_eq!(
        enclosed_path("../../etc/passwd"),
        Some(PathBuf::from("etc/passwd"))
    );
    assert_eq!(
        enclosed_path(r"dir\file.txt"),
        Some(PathBuf::from("dir/file.txt"))
    );
    assert_eq!(enclosed_path("C:/x"), Some(PathBuf::from("x")));
    assert_eq!(enclosed_path(r"d:\x\y"), Some(PathBuf::from("x/y")));
    assert_eq!(enclosed_path("../.."), None);
    assert_eq!(enclosed_path("/"), None);
}

#[test]
fn enclosed_path_keeps_colons_outside_drive_prefix() {
    assert_eq!(enclosed_path("a:b.txt"), Some(PathBuf::from("a:b.txt")));
    assert_eq!(
        enclosed_path("dir/x:y.txt"),
        Some(PathBuf::from("dir/x:y.txt"))
    );
    assert_eq!(enclosed_path("dir/C:"), Some(PathBuf::from("dir/C:")));
}

#[test]
fn zip_extract_keeps_members_with_colons() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("times.zip");
    create_zip_archive(
        &archive,
        &[("a:b.txt", b"ab"), ("dir/x:y.txt", b"xy"), ("dir/z.txt", b"z")],
    );
    let dest = temp.path().join("out");
    std::fs::create_dir_all(&dest).unwrap();

    let files = ZipExtractor::default().extract(&archive, &dest).unwrap();

    assert_eq!(files.len(), 3);
    assert_eq!(std::fs::read(dest.join("a:b.txt")).unwrap(), b"ab");
    assert_eq!(std::fs::read(dest.join("dir").join("x:y.txt")).unwrap(), b"xy");
    assert_eq!(std::fs::read(dest.join("dir").join("z.txt")).unwrap(), b"z");
}

// ---------------------------------------------------------------------------
// RAR and 7z extractors
// ---------------------------------------------------------------------------

#[test]
fn sevenz_extract_writes_member() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("a.7z");
    create_7z_archive(&archive, "inside.txt", b"seven");
    let dest = temp.path().join("out");
    std::fs::create_dir_all(&dest).unwrap();

    let files = SevenZipExtractor.extract(&archive, &dest).unwrap();

    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("inside.txt"));
    assert_eq!(std::fs::read(dest.join("inside.txt")).unwrap(), b"seven");
}

#[test]
fn sevenz_extract_rejects_zip_as_mismatch() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("a.7z");
    create_zip_archive(&archive, &[("x.txt", b"x")]);
    let dest = temp.path().join("out");
    std::fs::create_dir_all(&dest).unwrap();

    let failure = SevenZipExtractor.extract(&archive, &dest).unwrap_err();

    assert_eq!(failure.kind, FailureKind::Mismatch);
}

#[test]
fn rar_extract_rejects_zip_without_claiming_encryption() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("a.rar");
    create_zip_archive(&archive, &[("x.txt", b"x")]);

    let failure = RarExtractor.extract(&archive, temp.path()).unwrap_err();

    assert_eq!(failure.format, ArchiveFormat::Rar);
    assert_ne!(failure.kind, FailureKind::Encrypted);
}

// ---------------------------------------------------------------------------
// Engine: format fallback with real codecs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zip_content_named_7z_is_extracted() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("photos.7z");
    create_zip_archive(&archive, &[("img.jpg", b"jpeg")]);

    let engine = ArchiveExtractor::new(&Config::default());
    let task = ArchiveTask::new(&archive, "h-zip", ArchiveOrigin::FreshDownload);
    let report = engine.extract(&task).await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(
        std::fs::read(temp.path().join("photos").join("img.jpg")).unwrap(),
        b"jpeg"
    );
    assert!(!archive.exists());
}

#[tokio::test]
async fn sevenz_content_named_zip_is_extracted() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("notes.zip");
    create_7z_archive(&archive, "n.txt", b"note");

    let engine = ArchiveExtractor::new(&Config::default());
    let task = ArchiveTask::new(&archive, "h-7z", ArchiveOrigin::FreshDownload);
    let report = engine.extract(&task).await;

    assert_eq!(
        report,
        ExtractionReport::Extracted {
            destination: temp.path().join("notes"),
            files: 1,
        }
    );
    assert_eq!(
        engine.ledger_for(temp.path()).lookup("h-7z").await.as_deref(),
        Some("notes")
    );
    assert!(!temp.path().join("notes.retry_count").exists());
    assert!(!temp.path().join("notes.extract_failed").exists());
}

#[tokio::test]
async fn real_encrypted_zip_is_reported_as_encrypted() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("locked.zip");
    create_encrypted_zip(&archive, "secret.txt", b"top secret", b"hunter2");

    let engine = ArchiveExtractor::new(&Config::default());
    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::FreshDownload);
    let report = engine.extract(&task).await;

    assert_eq!(report.outcome(), Some(ExtractionOutcome::Encrypted));
    assert!(archive.exists());
    assert!(!temp.path().join("locked").exists());
}

#[tokio::test]
async fn second_extraction_of_same_content_is_a_noop() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("set.zip");
    create_zip_archive(&archive, &[("a.txt", b"a")]);

    let engine = ArchiveExtractor::new(&Config::default());
    let task = ArchiveTask::new(&archive, "same-hash", ArchiveOrigin::FreshDownload);

    assert!(engine.extract(&task).await.is_success());
    assert_eq!(engine.extract(&task).await, ExtractionReport::Missing);

    let entries = engine.ledger_for(temp.path()).entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries["same-hash"], "set");
    assert!(!temp.path().join("set.retry_count").exists());
}

#[tokio::test]
async fn purge_set_removes_matching_files_after_success() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("bundle.zip");
    create_zip_archive(
        &archive,
        &[("keep.png", b"png"), ("ad.url", b"[InternetShortcut]"), ("deep/ad2.URL", b"x")],
    );

    let engine = ArchiveExtractor::new(&Config::default());
    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::FreshDownload);
    let report = engine.extract_with_purge(&task, &["url".to_string()]).await;

    assert!(report.is_success());
    let dest = temp.path().join("bundle");
    assert!(dest.join("keep.png").exists());
    assert!(!dest.join("ad.url").exists());
    assert!(!dest.join("deep").join("ad2.URL").exists());
}

#[tokio::test]
async fn configured_purge_set_applies_to_extract() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("bundle.zip");
    create_zip_archive(&archive, &[("keep.png", b"png"), ("junk.txt", b"x")]);

    let mut config = Config::default();
    config.extraction.purge_extensions = vec!["txt".to_string()];
    let engine = ArchiveExtractor::new(&config);
    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::FreshDownload);

    assert!(engine.extract(&task).await.is_success());
    assert!(!temp.path().join("bundle").join("junk.txt").exists());
}

#[tokio::test]
async fn extract_archive_returns_boolean_contract() {
    let temp = tempfile::tempdir().unwrap();
    let good = temp.path().join("good.zip");
    create_zip_archive(&good, &[("a.txt", b"a")]);
    let bad = temp.path().join("bad.zip");
    write_junk(&bad);

    assert!(extract_archive(&good, "h1", &[], true).await);
    assert!(!extract_archive(&bad, "h2", &[], true).await);
    assert!(!bad.exists());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("bad.retry_count")).unwrap(),
        "1"
    );
}

// ---------------------------------------------------------------------------
// Engine: fallback ordering and retry policy with fake codecs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rar_content_named_zip_falls_back_to_rar() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("report.zip");
    write_junk(&archive);
    let fakes = Fakes::new(
        Behavior::Fail(FailureKind::Mismatch),
        Behavior::Succeed,
        Behavior::Succeed,
    );
    let engine = fakes.engine();

    let task = ArchiveTask::new(&archive, "h1", ArchiveOrigin::FreshDownload);
    let report = engine.extract(&task).await;

    assert!(report.is_success());
    assert_eq!(fakes.zip.calls(), 1);
    assert_eq!(fakes.rar.calls(), 1);
    assert_eq!(fakes.sevenz.calls(), 0);
    assert_eq!(
        engine.ledger_for(temp.path()).lookup("h1").await.as_deref(),
        Some("report")
    );
    assert!(!archive.exists());
    assert!(!temp.path().join("report.retry_count").exists());
    assert!(!temp.path().join("report.extract_failed").exists());
}

#[tokio::test]
async fn unknown_extension_tries_formats_in_fixed_order() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("mystery.bin");
    write_junk(&archive);
    let fakes = Fakes::new(
        Behavior::Fail(FailureKind::Mismatch),
        Behavior::Fail(FailureKind::Other),
        Behavior::Succeed,
    );

    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::FreshDownload);
    let report = fakes.engine().extract(&task).await;

    assert!(report.is_success());
    assert_eq!(fakes.total_calls(), 3);
}

#[tokio::test]
async fn encryption_stops_the_format_loop() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("locked.zip");
    write_junk(&archive);
    let fakes = Fakes::new(
        Behavior::Fail(FailureKind::Encrypted),
        Behavior::Succeed,
        Behavior::Succeed,
    );

    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::FreshDownload);
    let report = fakes.engine().extract(&task).await;

    assert_eq!(
        report,
        ExtractionReport::Failed {
            outcome: ExtractionOutcome::Encrypted,
            decision: RetryDecision::RetryScheduled {
                attempt: 1,
                archive_removed: false,
            },
        }
    );
    assert_eq!(fakes.zip.calls(), 1);
    assert_eq!(fakes.rar.calls(), 0);
    assert_eq!(fakes.sevenz.calls(), 0);
    assert!(!temp.path().join("locked").exists());
    assert!(archive.exists());
}

#[tokio::test]
async fn three_fresh_failures_mark_archive_and_fourth_is_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("x.zip");
    let fakes = corrupt_everywhere();
    let engine = fakes.engine();
    let task = ArchiveTask::new(&archive, "hx", ArchiveOrigin::FreshDownload);

    for attempt in 1..=2 {
        write_junk(&archive);
        let report = engine.extract(&task).await;
        assert_eq!(
            report,
            ExtractionReport::Failed {
                outcome: ExtractionOutcome::UnsupportedOrCorrupt {
                    last_error: "extraction error: 7z extraction failed (Corrupt): fake failure"
                        .to_string(),
                },
                decision: RetryDecision::RetryScheduled {
                    attempt,
                    archive_removed: true,
                },
            }
        );
        assert!(!archive.exists());
    }

    write_junk(&archive);
    let report = engine.extract(&task).await;
    assert!(matches!(
        report,
        ExtractionReport::Failed {
            decision: RetryDecision::PermanentlyFailed { attempts: 3 },
            ..
        }
    ));
    assert!(temp.path().join("x.extract_failed").exists());
    assert!(!temp.path().join("x.retry_count").exists());
    assert!(!temp.path().join("x").exists());

    let calls_before = fakes.total_calls();
    write_junk(&archive);
    assert_eq!(engine.extract(&task).await, ExtractionReport::Skipped);
    assert_eq!(fakes.total_calls(), calls_before);
    assert!(archive.exists());
}

#[tokio::test]
async fn clearing_markers_makes_archive_eligible_again() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("x.zip");
    let fakes = corrupt_everywhere();
    let engine = fakes.engine();
    let task = ArchiveTask::new(&archive, "hx", ArchiveOrigin::FreshDownload);

    for _ in 0..3 {
        write_junk(&archive);
        engine.extract(&task).await;
    }
    write_junk(&archive);
    assert_eq!(engine.extract(&task).await, ExtractionReport::Skipped);

    let cleared = clear_failed_marks(temp.path(), engine.retry_policy().config())
        .await
        .unwrap();
    assert_eq!(cleared, 1);

    let calls_before = fakes.total_calls();
    let report = engine.extract(&task).await;
    assert!(matches!(
        report,
        ExtractionReport::Failed {
            decision: RetryDecision::RetryScheduled { attempt: 1, .. },
            ..
        }
    ));
    assert_eq!(fakes.total_calls(), calls_before + 3);
}

#[tokio::test]
async fn sweep_failures_do_not_consume_retry_budget() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("old.rar");
    write_junk(&archive);
    let fakes = corrupt_everywhere();

    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::Sweep);
    let report = fakes.engine().extract(&task).await;

    assert!(matches!(
        report,
        ExtractionReport::Failed {
            decision: RetryDecision::Discarded,
            ..
        }
    ));
    assert!(!archive.exists());
    assert!(!temp.path().join("old.retry_count").exists());
    assert!(!temp.path().join("old.extract_failed").exists());
}

#[tokio::test]
async fn sweep_ignores_permanent_failure_marker() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("x.zip");
    write_junk(&archive);
    std::fs::write(temp.path().join("x.extract_failed"), "Failed at earlier").unwrap();
    let fakes = Fakes::new(Behavior::Succeed, Behavior::Succeed, Behavior::Succeed);

    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::Sweep);
    assert!(fakes.engine().extract(&task).await.is_success());
    assert_eq!(fakes.zip.calls(), 1);
}

#[tokio::test]
async fn partial_output_is_left_in_place_on_failure() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("half.zip");
    write_junk(&archive);
    let fakes = Fakes::new(
        Behavior::PartialThenFail,
        Behavior::Fail(FailureKind::Mismatch),
        Behavior::Fail(FailureKind::Mismatch),
    );

    let task = ArchiveTask::new(&archive, "h", ArchiveOrigin::FreshDownload);
    let report = fakes.engine().extract(&task).await;

    assert!(!report.is_success());
    assert!(temp.path().join("half").join("partial.bin").exists());
}

#[tokio::test]
async fn missing_archive_touches_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let fakes = corrupt_everywhere();
    let task = ArchiveTask::new(temp.path().join("gone.zip"), "h", ArchiveOrigin::FreshDownload);

    assert_eq!(fakes.engine().extract(&task).await, ExtractionReport::Missing);
    assert_eq!(fakes.total_calls(), 0);
    assert!(!temp.path().join("gone").exists());
    assert!(!temp.path().join("gone.retry_count").exists());
}

#[tokio::test]
async fn extract_to_without_extractors_reports_no_supported_format() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("a.zip");
    write_junk(&archive);
    let engine = ArchiveExtractor::with_extractors(&Config::default(), Vec::new());

    let err = engine
        .extract_to(&archive, &temp.path().join("a"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Extraction(ExtractionError::NoSupportedFormat { .. })
    ));
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_existing_archives_extracts_and_discards() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(temp.path().join("post")).unwrap();
    let good = temp.path().join("post").join("good.zip");
    create_zip_archive(&good, &[("a.txt", b"a")]);
    let bad = temp.path().join("bad.rar");
    write_junk(&bad);
    std::fs::write(temp.path().join("notes.txt"), b"not an archive").unwrap();

    let engine = ArchiveExtractor::new(&Config::default());
    let summary = process_existing_archives(&engine, temp.path()).await.unwrap();

    assert_eq!(summary.found, 2);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.unreadable, 0);
    assert!(temp.path().join("post").join("good").join("a.txt").exists());
    assert!(!bad.exists());
    assert!(!temp.path().join("bad.retry_count").exists());

    let entries = engine.ledger_for(&temp.path().join("post")).entries().await;
    assert_eq!(entries.values().collect::<Vec<_>>(), vec!["good"]);
}
