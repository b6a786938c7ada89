//! Response delivery: inline text or a reference to a stored object

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::error::AvError;
use crate::request::{Choice, RoutedRequest};
use crate::store::ObjectStore;

/// Responses larger than this go to object storage unless forced inline
pub const DEFAULT_MAX_INLINE_BYTES: usize = 100_000;

/// Decides whether a response is returned inline or uploaded
pub struct OutputDelivery {
    store: Option<Arc<dyn ObjectStore>>,
    max_inline_bytes: usize,
}

impl OutputDelivery {
    pub fn new(store: Option<Arc<dyn ObjectStore>>) -> Self {
        Self {
            store,
            max_inline_bytes: DEFAULT_MAX_INLINE_BYTES,
        }
    }

    /// Delivery with no object store; everything is returned inline
    pub fn inline_only() -> Self {
        Self::new(None)
    }

    pub fn with_max_inline_bytes(mut self, max_inline_bytes: usize) -> Self {
        self.max_inline_bytes = max_inline_bytes;
        self
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Key for a stored response
    pub fn response_key(routed: &RoutedRequest, now: DateTime<Utc>) -> String {
        format!(
            "responses/{}/{}/{}.{}",
            routed.function,
            now.format("%Y%m%d"),
            now.timestamp_millis(),
            routed.datatype.extension()
        )
    }

    /// Return `body` inline, or upload it and return a `data_file` reference
    pub async fn deliver(&self, routed: &RoutedRequest, body: String, now: DateTime<Utc>) -> Result<String, AvError> {
        let flags = routed.flags;
        if flags.force_inline {
            return Ok(body);
        }
        if !flags.force_file && body.len() <= self.max_inline_bytes {
            return Ok(body);
        }

        let Some(store) = &self.store else {
            log::warn!(
                "No object store configured; returning {} bytes from {} inline",
                body.len(),
                routed.function
            );
            return Ok(body);
        };

        let key = Self::response_key(routed, now);
        let size_bytes = body.len();
        match store
            .put_object(&key, body.as_bytes().to_vec(), routed.datatype.content_type())
            .await
        {
            Ok(()) => {
                log::info!("Stored {} bytes from {} at {}", size_bytes, routed.function, key);
                let reference = json!({
                    "data_file": {
                        "bucket": store.bucket(),
                        "key": key,
                        "size_bytes": size_bytes,
                        "format": routed.datatype.as_str(),
                    }
                });
                Ok(reference.to_string())
            }
            Err(e) if flags.force_file => Err(e.into()),
            Err(e) => {
                log::warn!("Upload of {} response failed, returning inline: {}", routed.function, e);
                Ok(body)
            }
        }
    }
}
