//! Static asset manifest of the exchange front-end
//!
//! Every asset the top page pulls in, with the SHA-256 of the bytes the
//! target is required to serve. The manifest is regenerated whenever the
//! front-end build changes.

use sha2::{Digest, Sha256};

/// One asset the top-page sweep must fetch and verify
#[derive(Debug, Clone)]
pub struct StaticAsset {
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

impl StaticAsset {
    pub fn new(path: &str, size: u64, sha256: &str) -> Self {
        Self {
            path: path.to_string(),
            size,
            sha256: sha256.to_string(),
        }
    }
}

/// SHA-256 of a response body, hex-encoded
pub fn hash_bytes(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// The manifest of the current front-end build
pub fn default_assets() -> Vec<StaticAsset> {
    vec![
        StaticAsset::new(
            "/",
            886,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03",
        ),
        StaticAsset::new(
            "/css/app.033eaee3.css",
            11992,
            "c8a4239a4b1a1a6e3c9ddc2b3a5d5a4efab9cf2ca45c57042b1b9baae6f7ddc5",
        ),
        StaticAsset::new(
            "/favicon.ico",
            894,
            "4355a46b19d348dc2f57c046f8ef63d4538ebb936000f3c9ee954a27460dd865",
        ),
        StaticAsset::new(
            "/img/exchange_logo.png",
            8988,
            "53c234e5e8472b6ac51c1ae1cab3fe06fad053beb8ebfd8977b010655bfdd3c3",
        ),
        StaticAsset::new(
            "/js/chart.financial.js",
            14403,
            "1121cfccd5913f0a63fec40a6ffd44ea64f9dc135c66634ba001d10bcf4302a2",
        ),
        StaticAsset::new(
            "/js/chart.min.js",
            159638,
            "7de1555df0c2700329e815b93b32c571c3ea54dc967b89e81ab73b9972b72d1d",
        ),
        StaticAsset::new(
            "/js/app.2be81752.js",
            19425,
            "f0b5c2c2211c8d67ed15e75e656c7862d086e9245420892a7de62cd9ec582a06",
        ),
        StaticAsset::new(
            "/js/chunk-vendors.3f054da5.js",
            139427,
            "8254c329a92850f6d539dd376f4816ee2764517da5e0235514af433164480d7a",
        ),
        StaticAsset::new(
            "/js/moment.min.js",
            51679,
            "bb7208bc9b5d7c04f1236a82a0093a5e33f40423d5ba8d4266f7092c3ba43b62",
        ),
    ]
}
