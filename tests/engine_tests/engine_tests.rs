//! Tests for Engine
//!
//! These tests verify:
//! - Engine lifecycle (open, directory creation, reopen)
//! - Record operations and payload rejection
//! - Audit log operations
//! - Monitor is idle between operations

use recstore::audit::AuditEvent;
use recstore::config::Config;
use recstore::engine::Engine;
use recstore::{DataRecord, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn jan() -> DataRecord {
    DataRecord::new("Jan '21", 5.0, 10.0, 3.0, 18.0)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_files() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("nested").join("data");

    let engine = Engine::open_path(&data_dir).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("records.bin").exists());
    assert!(data_dir.join("server.log").exists());
    assert_eq!(engine.records_path(), data_dir.join("records.bin"));
    assert_eq!(engine.log_path(), data_dir.join("server.log"));
}

#[test]
fn test_engine_custom_file_names() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .records_file("sales.dat")
        .log_file("audit.txt")
        .build();

    let engine = Engine::open(config).unwrap();

    assert!(temp_dir.path().join("sales.dat").exists());
    assert!(temp_dir.path().join("audit.txt").exists());
    assert_eq!(engine.config().records_file, "sales.dat");
}

#[test]
fn test_engine_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .records_file("same")
        .log_file("same")
        .build();

    assert!(matches!(Engine::open(config), Err(StoreError::Config(_))));
}

#[test]
fn test_engine_monitor_key_from_listen_port() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .listen_addr("127.0.0.1:16001")
        .build();

    let engine = Engine::open(config).unwrap();

    assert_eq!(engine.monitor().key(), 16001);
}

#[test]
fn test_engine_explicit_monitor_key() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .monitor_key(77)
        .build();

    let engine = Engine::open(config).unwrap();

    assert_eq!(engine.monitor().key(), 77);
}

#[test]
fn test_engine_reopen_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = Engine::open_path(temp_dir.path()).unwrap();
        engine.add_record(&jan()).unwrap();
        engine
            .audit(&AuditEvent::Added { client: 1 })
            .unwrap();
    }

    let engine = Engine::open_path(temp_dir.path()).unwrap();

    assert_eq!(engine.record_count().unwrap(), 1);
    assert_eq!(engine.log_count().unwrap(), 1);
}

// =============================================================================
// Record Operation Tests
// =============================================================================

#[test]
fn test_engine_add_and_get() {
    let (_temp, engine) = setup_temp_engine();

    assert!(engine.add_record(&jan()).unwrap());
    assert_eq!(engine.record_count().unwrap(), 1);

    let record = engine.get_record(1).unwrap();
    assert_eq!(record.index, Some(1));
    assert_eq!(record.period, "Jan '21");
    assert_eq!(record.total, 18.0);
    assert_eq!(
        engine.record_text(1).unwrap(),
        "Jan '21,18.00,10.00,3.00,5.00"
    );
}

#[test]
fn test_engine_update_record() {
    let (_temp, engine) = setup_temp_engine();
    engine.add_record(&jan()).unwrap();

    let mut record = engine.get_record(1).unwrap();
    record.set_accessories(7.5);
    record.update_total();
    assert!(engine.update_record(1, &record).unwrap());

    assert_eq!(engine.get_record(1).unwrap().total, 20.5);
}

#[test]
fn test_engine_apply_new_and_fix() {
    let (_temp, engine) = setup_temp_engine();

    assert!(engine.apply_new("Jan '21,18.00,10.00,3.00,5.00").unwrap());
    assert!(engine.apply_fix(1, "Jan '21,20.50,10.00,3.00,7.50").unwrap());

    let record = engine.get_record(1).unwrap();
    assert_eq!(record.accessories, 7.5);
    assert_eq!(record.total, 20.5);
}

#[test]
fn test_engine_apply_rejects_bad_payloads() {
    let (_temp, engine) = setup_temp_engine();

    assert!(!engine.apply_new("").unwrap());
    assert!(!engine.apply_new("not,a,record").unwrap());
    assert!(!engine.apply_fix(1, "garbage").unwrap());

    assert_eq!(engine.record_count().unwrap(), 0);
}

#[test]
fn test_engine_apply_fix_out_of_range() {
    let (_temp, engine) = setup_temp_engine();
    engine.add_record(&jan()).unwrap();

    assert!(!engine.apply_fix(9, "Jan '21,18.00,10.00,3.00,5.00").unwrap());
    assert_eq!(engine.record_count().unwrap(), 1);
}

#[test]
fn test_engine_apply_new_overlong_payload() {
    let (_temp, engine) = setup_temp_engine();
    let period = "p".repeat(60);

    // Decodes fine but is too long to re-encode into a slot
    let accepted = engine
        .apply_new(&format!("{},1.00,1.00,0.00,0.00", period))
        .unwrap();

    assert!(!accepted);
    assert_eq!(engine.record_count().unwrap(), 0);
}

#[test]
fn test_engine_fix_one_past_end_appends() {
    let (_temp, engine) = setup_temp_engine();

    assert!(engine.apply_fix(1, "Jan '21,18.00,10.00,3.00,5.00").unwrap());

    assert_eq!(engine.record_count().unwrap(), 1);
}

// =============================================================================
// Audit Log Tests
// =============================================================================

#[test]
fn test_engine_audit_lines() {
    let (_temp, engine) = setup_temp_engine();

    engine
        .audit(&AuditEvent::Counted { client: 10, count: 3 })
        .unwrap();
    engine
        .audit(&AuditEvent::Updated { client: 10, index: 2 })
        .unwrap();

    assert_eq!(engine.log_count().unwrap(), 2);
    assert_eq!(
        engine.log_line(1).unwrap().as_deref(),
        Some("Server responded to Client 10 with 3 total records.")
    );
    assert_eq!(
        engine.log_line(2).unwrap().as_deref(),
        Some("Server successfully updated record #2 for Client 10.")
    );
    assert_eq!(engine.log_line(3).unwrap(), None);
}

#[test]
fn test_engine_log_line_at_streams() {
    let (_temp, engine) = setup_temp_engine();
    engine.audit(&AuditEvent::Added { client: 1 }).unwrap();
    engine.audit(&AuditEvent::Added { client: 2 }).unwrap();

    let (first, next) = engine.log_line_at(0).unwrap().unwrap();
    let (second, end) = engine.log_line_at(next).unwrap().unwrap();

    assert!(first.ends_with("Client 1."));
    assert!(second.ends_with("Client 2."));
    assert_eq!(engine.log_line_at(end).unwrap(), None);
}

#[test]
fn test_audit_event_sentences() {
    let cases = vec![
        (
            AuditEvent::Connected {
                addr: "127.0.0.1:5000".into(),
            },
            "127.0.0.1:5000 successfully connected.",
        ),
        (
            AuditEvent::SentRecord { client: 3, index: 4 },
            "Server responded to Client 3 with record #4.",
        ),
        (
            AuditEvent::SentAllRecords { client: 3, count: 5 },
            "Server responded to Client 3 with list of 5 records.",
        ),
        (
            AuditEvent::Added { client: 3 },
            "Server successfully added record provided by Client 3.",
        ),
        (
            AuditEvent::SentLog { client: 3, count: 6 },
            "Server responded to Client 3 with list of 6 log records.",
        ),
    ];

    for (event, expected) in cases {
        assert_eq!(event.to_string(), expected);
    }
}

// =============================================================================
// Monitor State Tests
// =============================================================================

#[test]
fn test_engine_leaves_monitor_idle() {
    let (_temp, engine) = setup_temp_engine();

    engine.add_record(&jan()).unwrap();
    engine.record_count().unwrap();
    engine.get_record(1).unwrap();
    let _ = engine.get_record(5);
    engine.audit(&AuditEvent::Added { client: 1 }).unwrap();
    engine.log_count().unwrap();

    assert!(engine.monitor().snapshot().is_idle());
}
