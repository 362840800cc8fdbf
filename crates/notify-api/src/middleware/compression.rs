//! Response compression layer.

use tower_http::compression::CompressionLayer;

/// Gzip for JSON responses; bulk listings compress well.
pub fn build_compression_layer() -> CompressionLayer {
    CompressionLayer::new().gzip(true)
}
