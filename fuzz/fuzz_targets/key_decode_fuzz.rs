//! Fuzz target for the cache key codec.
//!
//! Decoding runs over every stored key during spec invalidation, so it must
//! never panic. Anything it accepts must re-encode to a key that decodes back
//! to the same truncated hashes, tier and model.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tiercache_core::CacheKey;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Some(key) = CacheKey::decode(input) {
            let reencoded = key.encode();
            let again = CacheKey::decode(&reencoded);
            assert!(again.is_some_and(|again| again.matches_encoded(&key)));
        }
    }
});
