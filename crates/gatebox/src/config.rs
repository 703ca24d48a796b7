//! Service configuration.

use serde::Deserialize;

/// Configuration for [`Credentials`](crate::Credentials).
///
/// Every field has a default, so partial configs deserialize fine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Maximum number of idle transfer buffers kept for reuse.
    pub pool_capacity: usize,
    /// Initial capacity of a freshly allocated transfer buffer.
    pub buffer_size: usize,
    /// Buffers that grew beyond this are dropped instead of returned to the pool.
    pub max_retained_size: usize,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 64,
            buffer_size: 4096,
            max_retained_size: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CredentialsConfig::default();
        assert_eq!(config.pool_capacity, 64);
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.max_retained_size, 1 << 20);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: CredentialsConfig = serde_json::from_str(r#"{"pool_capacity": 8}"#).unwrap();
        assert_eq!(config.pool_capacity, 8);
        assert_eq!(config.buffer_size, 4096);
    }
}
