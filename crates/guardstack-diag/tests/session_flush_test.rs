//! Integration test: session flush contract through the shared handle.
//!
//! Validates that:
//! 1. Sessions below their threshold print nothing.
//! 2. Sessions at or above their threshold print every entry in order.
//! 3. The file sink appends across engines and matches the writer output.
//! 4. The JSONL mirror carries one record per printed entry.
//! 5. A stopped log swallows everything.
//!
//! Run: cargo test -p guardstack-diag --test session_flush_test

use guardstack_diag::trace::NoFrames;
use guardstack_diag::{
    DiagnosticChannel, DiagnosticLog, Diagnostics, LogConfig, Severity, SharedBuffer,
    SourceLocation, TagStyle, hex_byte,
};

fn captured() -> (Diagnostics, SharedBuffer) {
    let buf = SharedBuffer::new();
    let mut log = DiagnosticLog::new();
    log.set_frame_source(Box::new(NoFrames));
    log.attach_writer(Box::new(buf.clone()), TagStyle::Plain);
    let diag = Diagnostics::new(log);
    diag.start();
    buf.clear();
    (diag, buf)
}

fn loc() -> SourceLocation {
    SourceLocation::new("stack.rs", "pop", 12)
}

fn validation_session(diag: &impl DiagnosticChannel, checksum: Severity) {
    diag.begin("Stack checking...", "stack numbers", loc());
    diag.add("Stack handle is live.", "numbers", Severity::Ok, 1);
    diag.add("Element size is positive.", "element_size = 4", Severity::Ok, 2);
    diag.add_table(
        "Data isn't corrupted.",
        &[0x91; 4],
        1,
        3,
        &hex_byte,
        Severity::Ok,
    );
    diag.add("Checksum", "stored vs computed", checksum, 2);
    diag.end(Severity::Warning);
}

#[test]
fn quiet_session_is_discarded() {
    let (diag, buf) = captured();
    validation_session(&diag, Severity::Ok);
    assert!(buf.contents().is_empty(), "got {:?}", buf.contents());
}

#[test]
fn warning_session_prints_every_entry_in_order() {
    let (diag, buf) = captured();
    validation_session(&diag, Severity::Warning);
    let text = buf.contents();

    let order = [
        "In stack.rs: pop():12: Stack checking...",
        "\t[OK]: Stack handle is live.",
        "\t\t[OK]: Element size is positive.",
        "\t\t\t[OK]: Data isn't corrupted.",
        "\t\t\t\t91  91  91  91",
        "\t\t==> WARNING: Checksum",
    ];
    let mut cursor = 0;
    for needle in order {
        let found = text[cursor..]
            .find(needle)
            .unwrap_or_else(|| panic!("missing {needle:?} after offset {cursor} in {text:?}"));
        cursor += found + needle.len();
    }
}

#[test]
fn error_threshold_hides_warnings() {
    let (diag, buf) = captured();
    diag.begin("s", "", loc());
    diag.add("w", "", Severity::Warning, 1);
    diag.end(Severity::Error);
    assert!(buf.contents().is_empty());

    diag.begin("s", "", loc());
    diag.add("e", "", Severity::Error, 1);
    diag.end(Severity::Error);
    assert!(buf.contents().contains("\t!!! ERROR: e"));
}

#[test]
fn file_sink_appends_and_matches_writer_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.log");

    for round in 0..2 {
        let config = LogConfig::default()
            .with_file(&path)
            .with_backtrace(false);
        let diag = Diagnostics::from_config(&config).unwrap();
        let buf = SharedBuffer::new();
        diag.lock()
            .attach_writer(Box::new(buf.clone()), TagStyle::Plain);
        diag.start();
        diag.write("round", &round.to_string(), Severity::Ok, 1, loc());
        diag.stop();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with(&buf.contents()));
    }

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("Logging was started...").count(), 2);
    assert_eq!(text.matches("Logging was stopped...").count(), 2);
    assert!(text.contains("\t[OK]: round\n\t0\n"));
    assert!(text.contains("\t[OK]: round\n\t1\n"));
}

#[test]
fn jsonl_mirror_has_one_record_per_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.jsonl");
    let config = LogConfig::default()
        .with_jsonl(&path)
        .with_backtrace(false);
    let diag = Diagnostics::from_config(&config).unwrap();
    diag.start();
    validation_session(&diag, Severity::Warning);
    diag.stop();

    let text = std::fs::read_to_string(&path).unwrap();
    let records: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect();
    // start, 6 session entries, stop
    assert_eq!(records.len(), 8);
    assert_eq!(records[1]["message"], "Stack checking...");
    assert_eq!(records[1]["location"]["function"], "pop");
    assert_eq!(records[6]["severity"], "warning");
}

#[test]
fn stopped_log_is_silent() {
    let (diag, buf) = captured();
    diag.stop();
    buf.clear();
    validation_session(&diag, Severity::Error);
    diag.write("late", "", Severity::Error, 0, loc());
    assert!(buf.contents().is_empty());
    assert!(!diag.enabled());
}
