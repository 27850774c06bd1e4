// Shared test doubles for integration tests.
//
// HashingEncoder stands in for the ONNX sentence encoder: a bag-of-words
// vector with each lower-cased word hashed (FNV-1a) into a fixed bucket.
// Identical texts get identical vectors and texts sharing most of their
// words score high, which is all the engine's callers rely on.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use wastewatch::classify::engine::ClassificationEngine;
use wastewatch::config::EngineSettings;
use wastewatch::embedding::traits::TextEncoder;

pub const TEST_DIM: usize = 256;

pub struct HashingEncoder {
    dim: usize,
    failing: AtomicBool,
}

impl HashingEncoder {
    pub fn new() -> Self {
        Self {
            dim: TEST_DIM,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent encode call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn vector(&self, text: &str) -> Vec<f64> {
        let mut v = vec![0.0; self.dim];
        let lower = text.to_lowercase();
        let mut any = false;
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            v[(fnv1a(word) % self.dim as u64) as usize] += 1.0;
            any = true;
        }
        if !any {
            v[0] = 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }
}

#[async_trait]
impl TextEncoder for HashingEncoder {
    fn model_id(&self) -> &str {
        "test-hashing-encoder"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("encoder offline");
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

fn fnv1a(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// An initialized engine plus a handle to toggle encoder failure.
pub async fn test_engine() -> (Arc<ClassificationEngine>, Arc<HashingEncoder>) {
    let encoder = Arc::new(HashingEncoder::new());
    let engine = ClassificationEngine::initialize(encoder.clone(), EngineSettings::default())
        .await
        .unwrap();
    (Arc::new(engine), encoder)
}
