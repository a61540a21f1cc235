//! Property tests over generated keys, options and configurations.

use proptest::prelude::*;
use serde_json::json;
use tiercache_test_utils::fixtures;
use tiercache_test_utils::generators::{
    arb_cache_key, arb_content, arb_store_options, arb_valid_config,
};
use tiercache_test_utils::{CacheConfig, MissReason, StorageAdapter, VerificationTier};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build")
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_stored_key_hits_until_its_files_change(
        key in arb_cache_key(),
        options in arb_store_options(),
    ) {
        block_on(async {
            let (cache, _clock) = fixtures::in_memory_cache(CacheConfig::default());
            cache.store(&key, json!({"ok": true}), options.clone()).await.unwrap();
            assert!(cache.lookup(&key).await.unwrap().is_hit());

            let touched = options
                .dependencies
                .first()
                .or(options.spec_name.as_ref())
                .or(options.impl_path.as_ref());
            match touched {
                Some(path) => {
                    assert_eq!(cache.invalidate_for_file(path).await.unwrap(), 1);
                    assert_eq!(
                        cache.lookup(&key).await.unwrap().miss_reason(),
                        Some(MissReason::NotFound)
                    );
                }
                None => {
                    assert_eq!(cache.invalidate_for_file("src/unrelated.rs").await.unwrap(), 0);
                    assert!(cache.lookup(&key).await.unwrap().is_hit());
                }
            }
        });
    }

    #[test]
    fn prop_entry_count_never_exceeds_bound(
        config in arb_valid_config(),
        contents in prop::collection::vec(arb_content(), 1..24),
    ) {
        let bound = config.max_entries % 8 + 1;
        let config = config.with_max_entries(bound);
        block_on(async {
            let (cache, clock) = fixtures::in_memory_cache(config.clone());
            for content in &contents {
                let key = cache.create_key(content, "impl", VerificationTier::Structure, None);
                cache.store(&key, json!(null), Default::default()).await.unwrap();
                clock.advance(chrono::Duration::milliseconds(1));
                let stored = cache.storage().keys().await.unwrap().len();
                assert!(stored <= config.max_entries);
            }
        });
    }

    #[test]
    fn prop_hit_rate_matches_counters(hits in 0usize..20, misses in 0usize..20) {
        block_on(async {
            let (cache, _clock) = fixtures::in_memory_cache(CacheConfig::default());
            let present = cache.create_key("spec", "impl", VerificationTier::Behavior, None);
            let absent = cache.create_key("spec", "other", VerificationTier::Behavior, None);
            cache.store(&present, json!(1), Default::default()).await.unwrap();

            for _ in 0..hits {
                cache.lookup(&present).await.unwrap();
            }
            for _ in 0..misses {
                cache.lookup(&absent).await.unwrap();
            }

            let stats = cache.stats().await.unwrap();
            assert_eq!(stats.hits, hits as u64);
            assert_eq!(stats.misses, misses as u64);
            let expected = if hits + misses == 0 {
                0
            } else {
                ((hits as f64 / (hits + misses) as f64) * 100.0).round() as u8
            };
            assert_eq!(stats.hit_rate, expected);
        });
    }
}
