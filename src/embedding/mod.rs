// Embedding provider: local sentence encoder and vector math.

pub mod download;
pub mod onnx;
pub mod similarity;
pub mod traits;
