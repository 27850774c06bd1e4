// Text encoder trait, the seam between the engine and the embedding model.
//
// The default implementation runs all-MiniLM-L6-v2 locally through ONNX
// Runtime. Tests substitute a deterministic hashing encoder.

use anyhow::Result;
use async_trait::async_trait;

/// Produces fixed-length dense vectors from text.
///
/// Implementations must be deterministic per input and safe for concurrent
/// use once constructed.
#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// Identifier of the underlying model (e.g. "all-MiniLM-L6-v2").
    fn model_id(&self) -> &str;

    /// Length of every vector this encoder returns.
    fn dimension(&self) -> usize;

    /// Encode a single text.
    async fn encode(&self, text: &str) -> Result<Vec<f64>> {
        let mut out = self.encode_batch(&[text.to_string()]).await?;
        if out.is_empty() {
            anyhow::bail!("encoder returned no vector for a single input");
        }
        Ok(out.swap_remove(0))
    }

    /// Encode multiple texts, returning vectors in the same order.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;
}
