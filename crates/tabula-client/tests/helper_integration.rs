//! Integration tests for the table helper.
//!
//! These tests drive `TableHelper` over the in-memory store and check the
//! scan, schema and alter behavior end to end, including cursor release on
//! every exit path.

use bytes::Bytes;

use tabula_client::{
    Cell, FaultPlan, MemoryStore, ScanLimit, TableHelper, TabulaError, Value,
};
use tabula_common::{ClientConfig, ColumnDescriptor, ColumnType, Schema, StoreError};

/// Builds `T[id INT32, name STRING]` with rows (1,"a") .. (5,"e").
fn scenario_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .create_table(
            "T",
            Schema::new(vec![
                ColumnDescriptor::not_null("id", ColumnType::Int32),
                ColumnDescriptor::not_null("name", ColumnType::String),
            ]),
        )
        .expect("create T");
    for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")] {
        store
            .insert_values("T", vec![Value::Int32(id), Value::from(name)])
            .expect("insert into T");
    }
    store
}

fn small_pages() -> ClientConfig {
    ClientConfig::builder()
        .masters("m1:7051,m2:7051")
        .scan_batch_size_rows(2)
        .build()
        .expect("valid config")
}

fn pairs(records: &[tabula_client::Record]) -> Vec<(i64, String)> {
    records
        .iter()
        .map(|r| {
            (
                r.get("id").and_then(Value::as_i64).expect("id"),
                r.get("name").and_then(Value::as_str).expect("name").to_string(),
            )
        })
        .collect()
}

#[test]
fn test_scenario_limit_three() {
    let store = scenario_store();
    let helper = TableHelper::with_table(store.clone(), small_pages(), "T").unwrap();

    let records = helper.scan(3).unwrap();
    assert_eq!(
        pairs(&records),
        vec![(1, "a".into()), (2, "b".into()), (3, "c".into())]
    );
    assert_eq!(store.probe().cursors_opened, 1);
    assert_eq!(store.probe().close_calls, 1);
}

#[test]
fn test_scenario_unbounded() {
    let store = scenario_store();
    let helper = TableHelper::with_table(store, small_pages(), "T").unwrap();

    let records = helper.scan_table("T", -1).unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(pairs(&records)[4], (5, "e".into()));
    for record in &records {
        assert_eq!(record.column_names(), vec!["id", "name"]);
    }
}

#[test]
fn test_scenario_limit_zero() {
    let store = scenario_store();
    let helper = TableHelper::with_table(store.clone(), small_pages(), "T").unwrap();

    assert!(helper.scan(0).unwrap().is_empty());
    let probe = store.probe();
    assert_eq!(probe.cursors_opened, 1);
    assert_eq!(probe.close_calls, 1);
    assert_eq!(probe.pages_fetched, 0);
}

#[test]
fn test_limit_law() {
    let store = scenario_store();
    let helper = TableHelper::with_table(store.clone(), small_pages(), "T").unwrap();

    for limit in 0..8i64 {
        let records = helper.scan(limit).unwrap();
        assert_eq!(records.len(), (limit as usize).min(5), "limit {}", limit);
    }
    assert_eq!(store.probe().open_cursors(), 0);
}

#[test]
fn test_every_supported_type_round_trips() {
    let store = MemoryStore::new();
    store
        .create_table(
            "all_types",
            Schema::new(vec![
                ColumnDescriptor::not_null("i8", ColumnType::Int8),
                ColumnDescriptor::not_null("i16", ColumnType::Int16),
                ColumnDescriptor::not_null("i32", ColumnType::Int32),
                ColumnDescriptor::not_null("i64", ColumnType::Int64),
                ColumnDescriptor::not_null("ts", ColumnType::UnixtimeMicros),
                ColumnDescriptor::not_null("bin", ColumnType::Binary),
                ColumnDescriptor::not_null("s", ColumnType::String),
                ColumnDescriptor::not_null("b", ColumnType::Bool),
                ColumnDescriptor::not_null("f", ColumnType::Float),
                ColumnDescriptor::not_null("d", ColumnType::Double),
                ColumnDescriptor::nullable("maybe", ColumnType::String),
            ]),
        )
        .unwrap();
    let stored = vec![
        Value::Int8(i8::MIN),
        Value::Int16(i16::MAX),
        Value::Int32(-123_456),
        Value::Int64(i64::MAX),
        Value::Int64(1_700_000_000_123_456),
        Value::Binary(Bytes::from_static(&[0, 159, 146, 150, 255])),
        Value::from("héllo wörld"),
        Value::Bool(false),
        Value::Float(3.25),
        Value::Double(-1.0e-300),
        Value::Null,
    ];
    store.insert_values("all_types", stored.clone()).unwrap();

    let helper = TableHelper::new(store, ClientConfig::default()).unwrap();
    let records = helper.scan_table("all_types", -1).unwrap();
    assert_eq!(records.len(), 1);

    let names = helper.table_schema(Some("all_types")).unwrap();
    for (column, expected) in names.iter().zip(&stored) {
        assert_eq!(
            records[0].get(column.name()),
            Some(expected),
            "column {}",
            column.name()
        );
    }
    assert_eq!(records[0].len(), stored.len());
}

#[test]
fn test_unsupported_type_closes_cursor_once() {
    let store = MemoryStore::new();
    store
        .create_table(
            "prices",
            Schema::new(vec![
                ColumnDescriptor::not_null("id", ColumnType::Int32),
                ColumnDescriptor::not_null("amount", ColumnType::Decimal),
            ]),
        )
        .unwrap();
    store
        .insert("prices", vec![Cell::Int32(1), Cell::Decimal(1999)])
        .unwrap();
    let helper = TableHelper::new(store.clone(), ClientConfig::default()).unwrap();

    let err = helper.scan_table("prices", -1).unwrap_err();
    assert!(matches!(
        err,
        TabulaError::UnsupportedColumnType { ref column, column_type: ColumnType::Decimal }
            if column == "amount"
    ));
    assert!(err.to_string().contains("DECIMAL"));

    let probe = store.probe();
    assert_eq!(probe.cursors_opened, 1);
    assert_eq!(probe.close_calls, 1);
    assert_eq!(probe.pages_fetched, 0);
}

#[test]
fn test_unsupported_type_fails_on_empty_table() {
    let store = MemoryStore::new();
    store
        .create_table(
            "days",
            Schema::new(vec![ColumnDescriptor::nullable("day", ColumnType::Date)]),
        )
        .unwrap();
    let helper = TableHelper::with_table(store.clone(), ClientConfig::default(), "days").unwrap();

    assert!(matches!(
        helper.scan(0),
        Err(TabulaError::UnsupportedColumnType { column_type: ColumnType::Date, .. })
    ));
    assert_eq!(store.probe().close_calls, 1);
}

#[test]
fn test_schema_errors() {
    let helper = TableHelper::new(scenario_store(), ClientConfig::default()).unwrap();

    assert!(matches!(
        helper.table_schema(Some("missing")),
        Err(TabulaError::TableNotFound(name)) if name == "missing"
    ));
    assert!(matches!(
        helper.table_schema(None),
        Err(TabulaError::NoTableBound)
    ));

    let schema = helper.table_schema(Some("T")).unwrap();
    assert_eq!(schema.to_string(), "(id INT32 NOT NULL, name STRING NOT NULL)");
}

#[test]
fn test_unreachable_store_is_a_connection_error() {
    let store = scenario_store();
    let helper = TableHelper::new(store.clone(), ClientConfig::default()).unwrap();
    store.set_faults(FaultPlan {
        unreachable: true,
        ..FaultPlan::default()
    });

    assert!(matches!(
        helper.scan_table("T", -1),
        Err(TabulaError::Connection(StoreError::Unreachable(_)))
    ));
    assert_eq!(store.probe().cursors_opened, 0);
}

#[test]
fn test_page_failure_surfaces_scan_error_and_releases() {
    let store = scenario_store();
    let helper = TableHelper::with_table(store.clone(), small_pages(), "T").unwrap();
    store.set_faults(FaultPlan {
        fail_page: Some(2),
        fail_close: true,
        ..FaultPlan::default()
    });

    let err = helper.scan(-1).unwrap_err();
    assert!(matches!(err, TabulaError::Scan { ref table, .. } if table == "T"));
    assert!(err.to_string().contains("page 2"));
    assert_eq!(store.probe().close_calls, 1);
    assert_eq!(helper.stats().failed_scans, 1);
}

#[test]
fn test_summary_reports_truncation() {
    let store = scenario_store();
    let helper = TableHelper::with_table(store.clone(), small_pages(), "T").unwrap();

    let projection = helper.scan_with(None, ScanLimit::Rows(4)).unwrap();
    assert_eq!(projection.summary.rows, 4);
    assert_eq!(projection.summary.pages, 2);
    assert!(projection.summary.truncated);
    assert_eq!(store.probe().pages_fetched, 2);

    let projection = helper.scan_with(Some("T"), ScanLimit::Unbounded).unwrap();
    assert!(!projection.summary.truncated);
    assert_eq!(projection.summary.pages, 3);
}

#[test]
fn test_alter_round_trip() {
    let store = scenario_store();
    let helper = TableHelper::with_table(store, small_pages(), "T").unwrap();

    helper
        .add_column("created", ColumnType::UnixtimeMicros, false, Some(Value::Int64(0)))
        .unwrap();
    helper.add_column("tag", ColumnType::Binary, true, None).unwrap();
    helper.drop_column("name").unwrap();

    let schema = helper.schema().unwrap();
    assert_eq!(schema.names(), vec!["id", "created", "tag"]);

    let records = helper.scan(-1).unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[2].get("created"), Some(&Value::Int64(0)));
    assert_eq!(records[2].get("tag"), Some(&Value::Null));
    assert!(!records[2].contains("name"));
}

#[test]
fn test_helper_is_shareable_across_threads() {
    let helper = std::sync::Arc::new(
        TableHelper::with_table(scenario_store(), small_pages(), "T").unwrap(),
    );

    let handles: Vec<_> = (0..4i64)
        .map(|limit| {
            let helper = std::sync::Arc::clone(&helper);
            std::thread::spawn(move || helper.scan(limit).map(|r| r.len()))
        })
        .collect();

    for (limit, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap().unwrap(), limit);
    }
    assert_eq!(helper.stats().scans, 4);
}
