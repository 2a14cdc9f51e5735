// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use common::record;
use scale_recorder::config::{CsvLedgerConfig, LedgerConfig};
use scale_recorder::record::parse_timestamp;
use scale_recorder::{
    BagId, BatchTracker, BatchPosition, CsvLedger, LedgerFactory, MemoryLedger, QueryService,
    RecordStore, StationError, WeighRecord,
};
use std::sync::Arc;
use tempfile::TempDir;

fn ledger_in(temp_dir: &TempDir) -> CsvLedger {
    CsvLedger::at(temp_dir.path().join("weighing_data.csv"))
}

#[tokio::test]
async fn test_append_then_load_preserves_order() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    ledger.initialize().await.unwrap();

    let written: Vec<_> = (0..30)
        .map(|i| record(&format!("{:06}", 100000 + i), 10.0 + i as f64 / 4.0, 1 + i / 22))
        .collect();
    for r in &written {
        ledger.append(r).await.unwrap();
    }

    let loaded = ledger.load_all().await.unwrap();
    assert_eq!(loaded, written);
}

#[tokio::test]
async fn test_leading_zero_ids_survive_reload() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    ledger.append(&record("000042", 3.0, 1)).await.unwrap();

    let found = ledger
        .find_by_id(&BagId::parse("000042").unwrap())
        .await
        .unwrap();
    assert_eq!(found.map(|r| r.gross_weight), Some(3.0));
}

#[tokio::test]
async fn test_failed_replace_keeps_previous_image() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    ledger.initialize().await.unwrap();
    for i in 0..5 {
        ledger
            .append(&record(&format!("{}", 700000 + i), 20.0, 1))
            .await
            .unwrap();
    }
    let before = std::fs::read(ledger.path()).unwrap();

    // A row that cannot be encoded interrupts the rewrite halfway through
    let mut replacement = ledger.load_all().await.unwrap();
    replacement[0].gross_weight = 99.0;
    replacement[3].gross_weight = f64::NAN;
    let result = ledger.replace_all(&replacement).await;

    assert!(matches!(result, Err(StationError::StoreIo { .. })));
    assert_eq!(std::fs::read(ledger.path()).unwrap(), before);
    assert!(!ledger.temp_path().exists());
}

#[tokio::test]
async fn test_stale_temp_file_is_ignored_and_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    ledger.initialize().await.unwrap();
    ledger.append(&record("123123", 8.0, 1)).await.unwrap();

    // Left behind by a crash during an earlier rewrite
    std::fs::write(ledger.temp_path(), b"BagID,Gross\npartial").unwrap();

    let records = ledger.load_all().await.unwrap();
    assert_eq!(records.len(), 1);

    ledger.replace_all(&records).await.unwrap();
    assert!(!ledger.temp_path().exists());
    assert_eq!(ledger.load_all().await.unwrap(), records);
}

#[tokio::test]
async fn test_replace_with_empty_keeps_header() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    ledger.append(&record("1", 1.0, 1)).await.unwrap();

    ledger.replace_all(&[]).await.unwrap();

    let content = std::fs::read_to_string(ledger.path()).unwrap();
    assert_eq!(
        content.trim_end(),
        "BagID,GrossWeight,DateAndTime,BatchNumb,ProductType"
    );
    assert!(ledger.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unwritable_location_is_store_io() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"x").unwrap();
    let ledger = CsvLedger::at(blocker.join("weighing_data.csv"));

    let result = ledger.append(&record("1", 1.0, 1)).await;
    assert!(matches!(result, Err(StationError::StoreIo { .. })));

    let result = ledger.load_all().await;
    assert!(matches!(result, Err(StationError::StoreIo { .. })));
}

#[tokio::test]
async fn test_malformed_row_is_store_format() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    std::fs::write(
        ledger.path(),
        "BagID,GrossWeight,DateAndTime,BatchNumb,ProductType\n\
         111111,12.5,2024-01-09 14:02:11.000001,1,Product\n\
         222222,heavy,2024-01-09 14:03:11.000001,1,Product\n",
    )
    .unwrap();

    match ledger.load_all().await {
        Err(StationError::StoreFormat { row, .. }) => assert_eq!(row, 2),
        other => panic!("expected StoreFormat, got {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_position_from_csv_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let store: Arc<dyn RecordStore> = Arc::new(ledger_in(&temp_dir));

    let tracker = BatchTracker::new(store.clone());
    assert_eq!(
        tracker.position().await.unwrap(),
        BatchPosition { batch: 1, filled: 0 }
    );

    for i in 0..3 {
        store.append(&record(&format!("{}", i), 1.0, 4)).await.unwrap();
    }
    assert_eq!(
        tracker.position().await.unwrap(),
        BatchPosition { batch: 4, filled: 3 }
    );
}

#[tokio::test]
async fn test_get_details_on_csv_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let config = LedgerConfig {
        backend: "csv".to_string(),
        csv: Some(CsvLedgerConfig {
            path: temp_dir
                .path()
                .join("ledger.csv")
                .to_string_lossy()
                .into_owned(),
        }),
    };
    let store = LedgerFactory::create(&config).unwrap();
    store.initialize().await.unwrap();
    store.append(&record("246810", 17.5, 2)).await.unwrap();

    let query = QueryService::new(store);
    let found = query
        .get_details(&BagId::parse("246810").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.gross_weight, 17.5);
    assert_eq!(found.batch_number, 2);

    assert!(query
        .get_details(&BagId::parse("135790").unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_append_after_unterminated_last_row() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    // Torn tail: the last row lost its line break
    std::fs::write(
        ledger.path(),
        "BagID,GrossWeight,DateAndTime,BatchNumb,ProductType\n\
         111111,1.0,2024-01-01 00:00:00,1,Product",
    )
    .unwrap();

    ledger.append(&record("222222", 2.0, 1)).await.unwrap();

    let records = ledger.load_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].bag_id.as_str(), "111111");
    assert_eq!(records[1].bag_id.as_str(), "222222");
    assert!(std::fs::read_to_string(ledger.path()).unwrap().ends_with('\n'));
}

#[tokio::test]
async fn test_append_after_unterminated_header() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = ledger_in(&temp_dir);
    std::fs::write(
        ledger.path(),
        "BagID,GrossWeight,DateAndTime,BatchNumb,ProductType",
    )
    .unwrap();

    ledger.append(&record("333333", 3.0, 1)).await.unwrap();

    let records = ledger.load_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].gross_weight, 3.0);
}

#[tokio::test]
async fn test_nanosecond_timestamp_round_trips() {
    let stamped = parse_timestamp("2024-03-01 08:00:00.123456789").unwrap();
    let written = WeighRecord::new(BagId::parse("424242").unwrap(), 9.5, stamped, 1, "Product");

    let temp_dir = TempDir::new().unwrap();
    let csv = ledger_in(&temp_dir);
    csv.append(&written).await.unwrap();
    let memory = MemoryLedger::new();
    memory.append(&written).await.unwrap();

    let from_csv = csv.load_all().await.unwrap();
    let from_memory = memory.load_all().await.unwrap();
    assert_eq!(from_csv, vec![written.clone()]);
    assert_eq!(from_memory, from_csv);
}

#[tokio::test]
async fn test_sub_microsecond_edit_is_rejected_by_both_backends() {
    let mut edited = record("515151", 4.0, 1);
    edited.timestamp = parse_timestamp("2024-03-01 08:00:00.000000500").unwrap();

    let temp_dir = TempDir::new().unwrap();
    let csv = ledger_in(&temp_dir);
    assert!(matches!(
        csv.append(&edited).await,
        Err(StationError::StoreIo { .. })
    ));
    assert!(csv.load_all().await.unwrap().is_empty());

    let memory = MemoryLedger::new();
    assert!(memory.append(&edited).await.is_err());
    assert!(memory.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replace_all_in_nested_directory() {
    let temp_dir = TempDir::new().unwrap();
    let ledger = CsvLedger::at(temp_dir.path().join("site").join("weighing_data.csv"));
    ledger.initialize().await.unwrap();
    ledger.append(&record("616161", 6.0, 1)).await.unwrap();

    let mut records = ledger.load_all().await.unwrap();
    records[0].gross_weight = 6.5;
    ledger.replace_all(&records).await.unwrap();

    assert_eq!(ledger.load_all().await.unwrap(), records);
    assert!(!ledger.temp_path().exists());
}
