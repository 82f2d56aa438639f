use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;
use vitrine_core::{CallContext, Filter, Record};

use crate::error::StoreError;
use crate::record::{RecordSink, RecordStore, SearchSummary, validate_record_id};

/// In-memory [`RecordStore`] guarded by a single reader-writer lock.
///
/// Searches copy the matching records while holding the read lock and emit
/// them after releasing it, so a slow consumer never blocks writers.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill in a missing ID or check that a supplied one is a UUID.
    fn assign_id(record: &mut Record) -> Result<(), StoreError> {
        validate_record_id(&record.id)?;
        if record.id.is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(&self, mut record: Record) -> Result<String, StoreError> {
        Self::assign_id(&mut record)?;

        let mut records = self.records.write().await;
        match records.entry(record.id.clone()) {
            Entry::Occupied(occupied) => {
                Err(StoreError::already_exists("record", occupied.key().as_str()))
            }
            Entry::Vacant(vacant) => {
                let id = vacant.key().clone();
                vacant.insert(record);
                Ok(id)
            }
        }
    }

    async fn find(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn contains(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.read().await.contains_key(id))
    }

    async fn search(
        &self,
        filter: &Filter,
        ctx: &CallContext,
        sink: &mut dyn RecordSink,
    ) -> Result<SearchSummary, StoreError> {
        ctx.check().map_err(StoreError::Interrupted)?;

        let (scanned, matches) = {
            let records = self.records.read().await;
            let matches: Vec<Record> = records
                .values()
                .filter(|record| filter.matches(record))
                .cloned()
                .collect();
            (records.len(), matches)
        };

        let mut emitted = 0;
        for record in matches {
            ctx.check().map_err(StoreError::Interrupted)?;
            sink.emit(record).await?;
            emitted += 1;
        }

        Ok(SearchSummary { scanned, emitted })
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use vitrine_core::{Interrupt, Memory};

    use super::*;
    use crate::testing::{laptop, run_record_store_conformance_tests};

    #[tokio::test]
    async fn conformance() {
        let store = MemoryRecordStore::new();
        run_record_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn stored_record_is_isolated_from_caller() {
        let store = MemoryRecordStore::new();
        let mut record = laptop("", 1500.0, 8, 3.0, Memory::gigabytes(16));
        let id = store.save(record.clone()).await.unwrap();

        record.brand = "mutated".into();
        let mut found = store.find(&id).await.unwrap().unwrap();
        assert_eq!(found.brand, "Acme");

        found.name = "also mutated".into();
        let again = store.find(&id).await.unwrap().unwrap();
        assert_eq!(again.name, "Book Pro");
    }

    #[tokio::test]
    async fn duplicate_id_keeps_first_writer() {
        let store = MemoryRecordStore::new();
        let id = Uuid::new_v4().to_string();
        let first = laptop(&id, 1000.0, 4, 2.5, Memory::gigabytes(8));
        let mut second = first.clone();
        second.brand = "Second".into();

        store.save(first).await.unwrap();
        let err = store.save(second).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));

        let stored = store.find(&id).await.unwrap().unwrap();
        assert_eq!(stored.brand, "Acme");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn non_uuid_id_is_rejected() {
        let store = MemoryRecordStore::new();
        let record = laptop("not-a-uuid", 1000.0, 4, 2.5, Memory::gigabytes(8));
        let err = store.save(record).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(ref id) if id == "not-a-uuid"));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_saves_with_same_id_admit_one_winner() {
        let store = Arc::new(MemoryRecordStore::new());
        let id = Uuid::new_v4().to_string();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let record = laptop(&id, 900.0, 4, 2.0, Memory::gigabytes(8));
                tokio::spawn(async move { store.save(record).await })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn canceled_search_emits_nothing() {
        let store = MemoryRecordStore::new();
        store
            .save(laptop("", 500.0, 4, 2.0, Memory::gigabytes(8)))
            .await
            .unwrap();

        let ctx = CallContext::new();
        ctx.cancel();
        let mut out = Vec::new();
        let err = store
            .search(&Filter::default(), &ctx, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupt::Canceled)));
        assert!(out.is_empty());
    }

    /// Sink that cancels the call after the first record it accepts.
    struct CancelAfterFirst {
        ctx: CallContext,
        seen: Vec<Record>,
    }

    #[async_trait]
    impl RecordSink for CancelAfterFirst {
        async fn emit(&mut self, record: Record) -> Result<(), StoreError> {
            self.seen.push(record);
            self.ctx.cancel();
            Ok(())
        }
    }

    #[tokio::test]
    async fn search_stops_at_next_emission_after_cancel() {
        let store = MemoryRecordStore::new();
        for _ in 0..5 {
            store
                .save(laptop("", 500.0, 4, 2.0, Memory::gigabytes(8)))
                .await
                .unwrap();
        }

        let ctx = CallContext::new();
        let mut sink = CancelAfterFirst {
            ctx: ctx.clone(),
            seen: Vec::new(),
        };
        let err = store
            .search(&Filter::default(), &ctx, &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupt::Canceled)));
        assert_eq!(sink.seen.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_interrupts_search() {
        let store = MemoryRecordStore::new();
        store
            .save(laptop("", 500.0, 4, 2.0, Memory::gigabytes(8)))
            .await
            .unwrap();

        let ctx = CallContext::new().with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;

        let mut out = Vec::new();
        let err = store
            .search(&Filter::default(), &ctx, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Interrupted(Interrupt::DeadlineExceeded)
        ));
    }

    #[tokio::test]
    async fn closed_channel_sink_aborts_search() {
        let store = MemoryRecordStore::new();
        store
            .save(laptop("", 500.0, 4, 2.0, Memory::gigabytes(8)))
            .await
            .unwrap();

        let (mut tx, rx) = mpsc::channel::<Record>(1);
        drop(rx);
        let err = store
            .search(&Filter::default(), &CallContext::new(), &mut tx)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SinkClosed(_)));
    }

    #[tokio::test]
    async fn writers_are_not_blocked_by_a_slow_consumer() {
        let store = Arc::new(MemoryRecordStore::new());
        for _ in 0..3 {
            store
                .save(laptop("", 500.0, 4, 2.0, Memory::gigabytes(8)))
                .await
                .unwrap();
        }

        // Capacity 1 and no reader: the search parks on its second send.
        let (mut tx, mut rx) = mpsc::channel::<Record>(1);
        let search_store = Arc::clone(&store);
        let search = tokio::spawn(async move {
            search_store
                .search(&Filter::default(), &CallContext::new(), &mut tx)
                .await
        });
        tokio::task::yield_now().await;

        let id = tokio::time::timeout(
            Duration::from_secs(5),
            store.save(laptop("", 700.0, 2, 1.5, Memory::gigabytes(4))),
        )
        .await
        .expect("save should not wait for the search")
        .unwrap();
        assert!(store.contains(&id).await.unwrap());

        let mut received = 0;
        while rx.recv().await.is_some() {
            received += 1;
        }
        let summary = search.await.unwrap().unwrap();
        assert_eq!(summary.emitted, 3);
        assert_eq!(received, 3);
    }
}
