//! Fuzz target: stored config blobs
//!
//! Loads arbitrary bytes through `MemoryConfigStore` and verifies:
//! - No panics on corrupt or truncated postcard data
//! - Anything that loads successfully also passes validation
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use raksha::adapters::config_store::MemoryConfigStore;
use raksha::app::ports::ConfigPort;

fuzz_target!(|data: &[u8]| {
    let store = MemoryConfigStore::with_blob(data.to_vec());
    if let Ok(config) = store.load() {
        assert!(config.validate().is_ok(), "loaded config must be valid");
        store.save(&config).expect("valid config must save");
    }
});
