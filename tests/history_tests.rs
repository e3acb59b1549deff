mod helpers;
use helpers::{offsets, record, setup_store, ContentionBench, SENTINEL};
use std::sync::{Arc, Barrier};
use std::thread;
use tailgate::history::{HistoryLookup, HistoryStore, Record};

// =========================================================================================
// 1. FEATURE TESTS
// =========================================================================================

mod features {
    use super::*;

    #[test]
    fn test_bounded_eviction_keeps_newest() {
        let store = setup_store(3);
        for offset in 0..8 {
            store.append(record("orders", "a", offset));
        }

        let history = store.query_by_limit("orders", Some("a"), 100).unwrap();
        assert_eq!(offsets(&history), vec![7, 6, 5]);
    }

    #[test]
    fn test_sentinel_aggregates_all_keys_in_arrival_order() {
        let store = setup_store(4);
        let keys = ["k1", "k2", "k1", "k2", "k1", "k2"];
        for (offset, key) in keys.iter().enumerate() {
            store.append(record("orders", key, offset as i64));
        }

        let all = store.query_by_limit("orders", None, 100).unwrap();
        assert_eq!(offsets(&all), vec![5, 4, 3, 2]);

        // Same history when the sentinel is named explicitly
        let named = store.query_by_limit("orders", Some(SENTINEL), 100).unwrap();
        assert_eq!(offsets(&named), offsets(&all));

        // Per-key histories are bounded independently
        assert_eq!(offsets(&store.query_by_limit("orders", Some("k1"), 100).unwrap()), vec![4, 2, 0]);
        assert_eq!(offsets(&store.query_by_limit("orders", Some("k2"), 100).unwrap()), vec![5, 3, 1]);
    }

    #[test]
    fn test_query_by_limit() {
        let store = setup_store(10);
        for offset in 0..5 {
            store.append(record("t", "k", offset));
        }

        assert_eq!(offsets(&store.query_by_limit("t", Some("k"), 5).unwrap()), vec![4, 3, 2, 1, 0]);
        assert_eq!(offsets(&store.query_by_limit("t", Some("k"), 50).unwrap()), vec![4, 3, 2, 1, 0]);
        assert_eq!(offsets(&store.query_by_limit("t", Some("k"), 2).unwrap()), vec![4, 3]);
    }

    #[test]
    fn test_unknown_topic_and_key_have_no_data() {
        let store = setup_store(10);
        store.append(record("t", "k", 0));

        assert!(store.query_by_limit("missing", None, 1).is_none());
        assert!(store.query_by_limit("t", Some("missing"), 1).is_none());
        assert!(store.query_from_offset("missing", None, 0).is_none());
        assert!(matches!(store.lookup("missing", Some("k")), HistoryLookup::UnknownTopic));
        assert!(matches!(store.lookup("t", Some("missing")), HistoryLookup::UnknownKey));
        assert!(store.list_keys("missing").is_none());
    }

    #[test]
    fn test_query_from_offset_is_best_effort() {
        let store = setup_store(3);
        for offset in 10..16 {
            store.append(record("t", "k", offset));
        }

        // 10..=12 evicted: only the retained suffix comes back
        assert_eq!(offsets(&store.query_from_offset("t", Some("k"), 10).unwrap()), vec![15, 14, 13]);
        assert_eq!(offsets(&store.query_from_offset("t", None, 14).unwrap()), vec![15, 14]);
        assert!(store.query_from_offset("t", Some("k"), 100).unwrap().is_empty());
    }

    #[test]
    fn test_list_topics_and_keys() {
        let store = setup_store(5);
        assert!(store.list_topics().is_empty());

        store.append(record("b-topic", "x", 0));
        store.append(record("a-topic", "y", 0));
        store.append(record("a-topic", "", 1));
        store.append(record("a-topic", "y", 2));

        assert_eq!(store.list_topics(), vec!["a-topic", "b-topic"]);
        assert_eq!(store.list_keys("a-topic").unwrap(), vec!["", "y"]);
        assert_eq!(store.topic_count(), 2);
    }

    #[test]
    fn test_records_are_stored_verbatim() {
        let store = setup_store(5);
        let original = Record::new(vec![0xde, 0xad], "key", "raw", 3, 42);
        store.append(original.clone());

        let stored = store.query_by_limit("raw", Some("key"), 1).unwrap();
        assert_eq!(*stored[0], original);
        let via_sentinel = store.query_by_limit("raw", None, 1).unwrap();
        assert!(Arc::ptr_eq(&stored[0], &via_sentinel[0]), "one record, two histories");
    }

    #[test]
    fn test_concurrent_first_appends_lose_nothing() {
        const WRITERS: usize = 16;
        const PER_WRITER: usize = 50;

        for round in 0..20 {
            let store = Arc::new(HistoryStore::new(WRITERS * PER_WRITER, SENTINEL));
            let barrier = Arc::new(Barrier::new(WRITERS));
            let topic = format!("race-{}", round);

            thread::scope(|scope| {
                for writer in 0..WRITERS {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    let topic = topic.clone();
                    scope.spawn(move || {
                        barrier.wait();
                        for i in 0..PER_WRITER {
                            let offset = (writer * PER_WRITER + i) as i64;
                            store.append(record(&topic, "shared", offset));
                        }
                    });
                }
            });

            let total = WRITERS * PER_WRITER;
            let by_key = store.query_by_limit(&topic, Some("shared"), total).unwrap();
            let all = store.query_by_limit(&topic, None, total).unwrap();
            assert_eq!(by_key.len(), total, "round {}: key history lost records", round);
            assert_eq!(all.len(), total, "round {}: sentinel history lost records", round);

            let mut seen = offsets(&by_key);
            seen.sort_unstable();
            assert_eq!(seen, (0..total as i64).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_concurrent_appends_respect_capacity() {
        let store = Arc::new(HistoryStore::new(10, SENTINEL));
        thread::scope(|scope| {
            for writer in 0..8i64 {
                let store = store.clone();
                scope.spawn(move || {
                    for i in 0..100 {
                        store.append(record("busy", &format!("k{}", writer), writer * 1000 + i));
                    }
                });
            }
        });

        assert_eq!(store.query_by_limit("busy", None, 1000).unwrap().len(), 10);
        for writer in 0..8 {
            let key = format!("k{}", writer);
            let history = store.query_by_limit("busy", Some(&key), 1000).unwrap();
            // Single writer per key: strict newest-first order
            let expected: Vec<i64> = (90..100).rev().map(|i| writer * 1000 + i).collect();
            assert_eq!(offsets(&history), expected);
        }
    }
}

// =========================================================================================
// 2. PERFORMANCE BENCHMARKS
// =========================================================================================

mod performance {
    use super::*;
    const THREADS: usize = 8;
    const PER_THREAD: usize = 20_000;

    #[test]
    fn bench_append_own_key_per_thread() {
        let store = setup_store(100);
        let bench = ContentionBench::run("HISTORY - Append, one key per thread", THREADS, PER_THREAD, |t, i| {
            store.append(record("bench", &t.to_string(), i as i64));
        });
        bench.report();

        assert_eq!(bench.total_ops(), THREADS * PER_THREAD);
        assert_eq!(store.list_keys("bench").unwrap().len(), THREADS);
        assert_eq!(store.query_by_limit("bench", None, 1_000).unwrap().len(), 100);
    }

    #[test]
    fn bench_append_shared_key() {
        let store = setup_store(100);
        let bench = ContentionBench::run("HISTORY - Append, one shared key", THREADS, PER_THREAD, |_, i| {
            store.append(record("bench", "hot", i as i64));
        });
        bench.report();

        assert_eq!(store.list_keys("bench").unwrap(), vec!["hot"]);
        assert_eq!(store.query_by_limit("bench", Some("hot"), 1_000).unwrap().len(), 100);
    }

    #[test]
    fn bench_query_during_appends() {
        let store = setup_store(100);
        for i in 0..1_000 {
            store.append(record("bench", &(i % 16).to_string(), i as i64));
        }

        // Even threads write, odd threads read the same keys
        let bench = ContentionBench::run("HISTORY - Query (limit 10) under writes", THREADS, PER_THREAD, |t, i| {
            let key = (i % 16).to_string();
            if t % 2 == 0 {
                store.append(record("bench", &key, (1_000 + i) as i64));
            } else {
                let records = store.query_by_limit("bench", Some(&key), 10).unwrap();
                assert_eq!(records.len(), 10);
            }
        });
        bench.report();
    }
}
