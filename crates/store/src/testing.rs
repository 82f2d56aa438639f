use uuid::Uuid;
use vitrine_core::{CallContext, Filter, Memory, Processor, Record};

use crate::error::StoreError;
use crate::record::RecordStore;

/// Build a record with the attributes searches filter on.
pub fn laptop(id: &str, price_usd: f64, cores: u32, min_ghz: f64, memory: Memory) -> Record {
    Record {
        id: id.to_owned(),
        brand: "Acme".into(),
        name: "Book Pro".into(),
        processor: Processor {
            brand: "Intel".into(),
            name: "Core i7".into(),
            cores,
            threads: cores * 2,
            min_ghz,
            max_ghz: min_ghz + 1.5,
        },
        memory,
        price_usd,
        release_year: 2024,
        ..Record::default()
    }
}

/// Run the record store conformance test suite.
///
/// Call this from your backend's test module with a fresh, empty store.
///
/// # Errors
///
/// Returns an error if a store operation fails unexpectedly.
pub async fn run_record_store_conformance_tests(
    store: &dyn RecordStore,
) -> Result<(), StoreError> {
    test_find_missing(store).await?;
    test_save_generates_id(store).await?;
    test_save_keeps_supplied_id(store).await?;
    test_duplicate_rejected(store).await?;
    test_invalid_id_rejected(store).await?;
    test_search_returns_matching_subset(store).await?;
    Ok(())
}

async fn test_find_missing(store: &dyn RecordStore) -> Result<(), StoreError> {
    let missing = Uuid::new_v4().to_string();
    assert!(store.find(&missing).await?.is_none(), "find on missing ID should return None");
    assert!(!store.contains(&missing).await?);
    Ok(())
}

async fn test_save_generates_id(store: &dyn RecordStore) -> Result<(), StoreError> {
    let input = laptop("", 1200.0, 4, 2.0, Memory::gigabytes(8));
    let id = store.save(input.clone()).await?;
    assert!(Uuid::parse_str(&id).is_ok(), "generated ID should be a UUID");
    let found = store.find(&id).await?;
    assert_eq!(found, Some(Record { id, ..input }), "found record should equal the input");
    Ok(())
}

async fn test_save_keeps_supplied_id(store: &dyn RecordStore) -> Result<(), StoreError> {
    let supplied = Uuid::new_v4().to_string();
    let id = store
        .save(laptop(&supplied, 1200.0, 4, 2.0, Memory::gigabytes(8)))
        .await?;
    assert_eq!(id, supplied);
    assert!(store.contains(&supplied).await?);
    assert_eq!(
        store.find(&supplied).await?,
        Some(laptop(&supplied, 1200.0, 4, 2.0, Memory::gigabytes(8)))
    );
    Ok(())
}

async fn test_duplicate_rejected(store: &dyn RecordStore) -> Result<(), StoreError> {
    let id = Uuid::new_v4().to_string();
    store
        .save(laptop(&id, 800.0, 2, 1.8, Memory::gigabytes(4)))
        .await?;
    let before = store.len().await?;
    let result = store
        .save(laptop(&id, 999.0, 2, 1.8, Memory::gigabytes(4)))
        .await;
    assert!(
        matches!(result, Err(StoreError::AlreadyExists { .. })),
        "second save with the same ID should fail"
    );
    assert_eq!(store.len().await?, before);
    let stored = store.find(&id).await?;
    assert_eq!(stored.map(|r| r.price_usd), Some(800.0));
    Ok(())
}

async fn test_invalid_id_rejected(store: &dyn RecordStore) -> Result<(), StoreError> {
    let result = store
        .save(laptop("laptop-1", 800.0, 2, 1.8, Memory::gigabytes(4)))
        .await;
    assert!(matches!(result, Err(StoreError::InvalidId(_))));
    Ok(())
}

async fn test_search_returns_matching_subset(store: &dyn RecordStore) -> Result<(), StoreError> {
    let tag = Uuid::new_v4().to_string();
    let fixtures = [
        (2500.0, 8, 3.2, 32),
        (1800.0, 6, 2.8, 16),
        (3500.0, 8, 3.5, 64),
        (1500.0, 2, 2.4, 16),
        (1900.0, 8, 2.2, 16),
        (1700.0, 8, 3.0, 8),
    ];
    let mut expected = Vec::new();
    for (price, cores, ghz, ram) in fixtures {
        let mut record = laptop("", price, cores, ghz, Memory::gigabytes(ram));
        record.name.clone_from(&tag);
        let id = store.save(record).await?;
        if price <= 3000.0 && cores >= 4 && ghz >= 2.5 && ram >= 8 {
            expected.push(id);
        }
    }

    let filter = Filter::new()
        .max_price_usd(3000.0)
        .min_cpu_cores(4)
        .min_cpu_ghz(2.5)
        .min_ram(Memory::gigabytes(8));
    let mut out = Vec::new();
    let summary = store.search(&filter, &CallContext::new(), &mut out).await?;

    let mut found: Vec<String> = out
        .into_iter()
        .filter(|r| r.name == tag)
        .map(|r| r.id)
        .collect();
    found.sort();
    expected.sort();
    assert_eq!(found, expected);
    assert!(summary.emitted >= expected.len());
    Ok(())
}
