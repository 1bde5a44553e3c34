//! Behavioural tests shared by every blob store backend.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use codedrop_shared::ShareCode;
use futures::future::join_all;
use opendal::{Operator, services};
use proptest::prelude::*;

use super::*;
use crate::code::RandomCodeGenerator;

/// Hands out a fixed list of codes in order, wrapping around.
struct SequenceCodes {
    codes: Vec<ShareCode>,
    next: AtomicUsize,
}

impl SequenceCodes {
    fn new(codes: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            codes: codes.iter().map(|c| ShareCode::parse(c).unwrap()).collect(),
            next: AtomicUsize::new(0),
        })
    }
}

impl CodeGenerator for SequenceCodes {
    fn generate(&self) -> ShareCode {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.codes[i % self.codes.len()].clone()
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap()
}

fn blob(content: &'static [u8]) -> NewBlob {
    NewBlob::new("notes.txt", Some("text/plain"), Bytes::from_static(content))
}

fn memory_store(codes: Arc<dyn CodeGenerator>) -> Arc<dyn BlobStore> {
    Arc::new(MemoryBlobStore::new(codes))
}

fn object_store(codes: Arc<dyn CodeGenerator>) -> Arc<dyn BlobStore> {
    let operator = Operator::new(services::Memory::default())
        .expect("memory operator")
        .finish();
    Arc::new(ObjectBlobStore::new(operator, "memory", codes))
}

type StoreFactory = fn(Arc<dyn CodeGenerator>) -> Arc<dyn BlobStore>;

const BACKENDS: [(&str, StoreFactory); 2] = [("memory", memory_store), ("object", object_store)];

#[tokio::test]
async fn test_put_then_get_returns_identical_bytes() {
    for (name, make) in BACKENDS {
        let store = make(Arc::new(RandomCodeGenerator));
        let expiry = t0() + Duration::hours(1);

        let code = store.put(blob(b"0123456789"), expiry, t0()).await.unwrap();
        let record = store
            .get(&code, t0())
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{name}: record missing right after put"));

        assert_eq!(record.code, code, "{name}");
        assert_eq!(record.content.as_ref(), b"0123456789", "{name}");
        assert_eq!(record.size, 10, "{name}");
        assert_eq!(record.filename, "notes.txt", "{name}");
        assert_eq!(record.content_type, "text/plain", "{name}");
        assert_eq!(record.upload_time, t0(), "{name}");
        assert_eq!(record.expiry_time, expiry, "{name}");
    }
}

#[tokio::test]
async fn test_expired_record_is_invisible_before_purge() {
    for (name, make) in BACKENDS {
        let store = make(Arc::new(RandomCodeGenerator));
        let expiry = t0() + Duration::hours(5);
        let code = store.put(blob(b"data"), expiry, t0()).await.unwrap();

        let just_before = expiry - Duration::seconds(1);
        assert!(store.get(&code, just_before).await.unwrap().is_some(), "{name}");
        assert!(store.get(&code, expiry).await.unwrap().is_none(), "{name}");
        assert!(
            store
                .get(&code, t0() + Duration::hours(6))
                .await
                .unwrap()
                .is_none(),
            "{name}"
        );
    }
}

#[tokio::test]
async fn test_get_unknown_code_is_none() {
    for (name, make) in BACKENDS {
        let store = make(Arc::new(RandomCodeGenerator));
        let code = ShareCode::parse("NEVER").unwrap();
        assert!(store.get(&code, t0()).await.unwrap().is_none(), "{name}");
    }
}

#[tokio::test]
async fn test_purge_removes_exactly_expired() {
    for (name, make) in BACKENDS {
        let store = make(SequenceCodes::new(&["AAAAA", "BBBBB", "CCCCC"]));
        let a = store
            .put(blob(b"a"), t0() + Duration::hours(1), t0())
            .await
            .unwrap();
        let b = store
            .put(blob(b"b"), t0() + Duration::hours(2), t0())
            .await
            .unwrap();
        let c = store
            .put(blob(b"c"), t0() + Duration::hours(5), t0())
            .await
            .unwrap();

        // `b` expires exactly at the purge instant and must go.
        let now = t0() + Duration::hours(2);
        assert_eq!(store.purge(now).await.unwrap(), 2, "{name}");
        assert_eq!(store.purge(now).await.unwrap(), 0, "{name}");

        assert!(store.get(&a, t0()).await.unwrap().is_none(), "{name}");
        assert!(store.get(&b, t0()).await.unwrap().is_none(), "{name}");
        assert!(store.get(&c, now).await.unwrap().is_some(), "{name}");
        assert_eq!(store.live_count(now).await.unwrap(), 1, "{name}");
    }
}

#[tokio::test]
async fn test_collision_with_live_record_retries() {
    for (name, make) in BACKENDS {
        let store = make(SequenceCodes::new(&["AAAAA", "AAAAA", "AAAAA", "BBBBB"]));
        let expiry = t0() + Duration::hours(1);

        let first = store.put(blob(b"first"), expiry, t0()).await.unwrap();
        let second = store.put(blob(b"second"), expiry, t0()).await.unwrap();

        assert_eq!(first.as_str(), "AAAAA", "{name}");
        assert_eq!(second.as_str(), "BBBBB", "{name}");

        let record = store.get(&first, t0()).await.unwrap().unwrap();
        assert_eq!(record.content.as_ref(), b"first", "{name}");
    }
}

#[tokio::test]
async fn test_expired_code_can_be_reissued() {
    for (name, make) in BACKENDS {
        let store = make(SequenceCodes::new(&["AAAAA"]));
        let old = store
            .put(blob(b"old"), t0() + Duration::hours(1), t0())
            .await
            .unwrap();

        let later = t0() + Duration::hours(2);
        let new = store
            .put(blob(b"new"), later + Duration::hours(1), later)
            .await
            .unwrap();

        assert_eq!(old, new, "{name}");
        let record = store.get(&new, later).await.unwrap().unwrap();
        assert_eq!(record.content.as_ref(), b"new", "{name}");
        assert_eq!(record.upload_time, later, "{name}");
    }
}

#[tokio::test]
async fn test_capacity_exhausted_after_bounded_attempts() {
    for (name, make) in BACKENDS {
        let codes = SequenceCodes::new(&["AAAAA"]);
        let store = make(codes.clone());
        let expiry = t0() + Duration::hours(1);
        store.put(blob(b"taken"), expiry, t0()).await.unwrap();

        let err = store.put(blob(b"again"), expiry, t0()).await.unwrap_err();
        assert!(
            matches!(err, StoreError::CapacityExhausted { attempts } if attempts == MAX_PUT_ATTEMPTS),
            "{name}: {err:?}"
        );
        // One draw for the first put, then the full retry budget.
        assert_eq!(
            codes.next.load(Ordering::SeqCst),
            1 + MAX_PUT_ATTEMPTS as usize,
            "{name}"
        );
        assert_eq!(store.live_count(t0()).await.unwrap(), 1, "{name}");
    }
}

#[tokio::test]
async fn test_put_rejects_non_positive_retention() {
    for (name, make) in BACKENDS {
        let store = make(Arc::new(RandomCodeGenerator));
        let err = store.put(blob(b"x"), t0(), t0()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidExpiry { .. }), "{name}");
        assert_eq!(store.live_count(t0()).await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
async fn test_delete_removes_regardless_of_expiry() {
    for (name, make) in BACKENDS {
        let store = make(Arc::new(RandomCodeGenerator));
        let code = store
            .put(blob(b"x"), t0() + Duration::days(1), t0())
            .await
            .unwrap();

        assert!(store.delete(&code).await.unwrap(), "{name}");
        assert!(!store.delete(&code).await.unwrap(), "{name}");
        assert!(store.get(&code, t0()).await.unwrap().is_none(), "{name}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_yield_distinct_codes() {
    for (name, make, uploads) in [
        ("memory", memory_store as StoreFactory, 500),
        ("object", object_store as StoreFactory, 100),
    ] {
        let store = make(Arc::new(RandomCodeGenerator));
        let expiry = t0() + Duration::hours(1);

        let handles = (0..uploads).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let content = Bytes::from(format!("file-{i}"));
                let code = store
                    .put(NewBlob::new("f.txt", None, content), expiry, t0())
                    .await
                    .unwrap();
                (i, code)
            })
        });
        let results: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        let codes: HashSet<_> = results.iter().map(|(_, code)| code.clone()).collect();
        assert_eq!(codes.len(), uploads, "{name}: duplicate codes issued");

        for (i, code) in results {
            let record = store.get(&code, t0()).await.unwrap().unwrap();
            assert_eq!(record.content, Bytes::from(format!("file-{i}")), "{name}");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_collisions_never_share_a_code() {
    // Only three codes exist; ten concurrent uploads must fill them without
    // overwriting, and the rest must fail rather than clobber.
    let store = memory_store(SequenceCodes::new(&["AAAAA", "BBBBB", "CCCCC"]));
    let expiry = t0() + Duration::hours(1);

    let handles = (0..10).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            let content = Bytes::from(format!("upload-{i}"));
            store
                .put(NewBlob::new("f", None, content.clone()), expiry, t0())
                .await
                .map(|code| (code, content))
        })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let stored: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(stored.len(), 3);
    for (code, content) in stored {
        let record = store.get(code, t0()).await.unwrap().unwrap();
        assert_eq!(&record.content, content);
    }
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StoreError::CapacityExhausted { .. }))
    );
}

#[tokio::test]
async fn test_from_config_memory() {
    let store = from_config(
        &codedrop_shared::config::StorageConfig::Memory,
        Arc::new(RandomCodeGenerator),
    )
    .unwrap();
    assert_eq!(store.backend_name(), "memory");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Purge removes exactly the records with expiry at or before `now`.
    #[test]
    fn prop_purge_partitions_by_expiry(
        offsets in prop::collection::vec(1i64..10_000, 1..40),
        cutoff in 0i64..10_000,
    ) {
        let store = MemoryBlobStore::new(Arc::new(RandomCodeGenerator));
        let now = t0() + Duration::seconds(cutoff);

        let codes: Vec<_> = offsets
            .iter()
            .map(|&offset| {
                let expiry = t0() + Duration::seconds(offset);
                let code = futures::executor::block_on(store.put(blob(b"p"), expiry, t0())).unwrap();
                (code, expiry)
            })
            .collect();

        let expected = codes.iter().filter(|(_, expiry)| *expiry <= now).count();
        let removed = futures::executor::block_on(store.purge(now)).unwrap();
        prop_assert_eq!(removed, expected);
        prop_assert_eq!(store.stored_count(), codes.len() - expected);

        for (code, expiry) in &codes {
            let survived = futures::executor::block_on(store.get(code, t0())).unwrap().is_some();
            prop_assert_eq!(survived, *expiry > now);
        }

        prop_assert_eq!(futures::executor::block_on(store.purge(now)).unwrap(), 0);
    }
}
