//! Trusted-device flags: `<ns>:trusted:<email>` = `true`.
//!
//! A flag never expires. It is set after a successful code verification and
//! only removed by [`TrustedDeviceRepository::forget`].

use tracing::info;

use crate::error::DbResult;
use crate::namespaced_key;
use crate::repository::blob::BlobRepository;

#[derive(Debug, Clone)]
pub struct TrustedDeviceRepository {
    blobs: BlobRepository,
    namespace: String,
}

impl TrustedDeviceRepository {
    pub fn new(blobs: BlobRepository, namespace: String) -> Self {
        TrustedDeviceRepository { blobs, namespace }
    }

    fn key(&self, email: &str) -> String {
        namespaced_key(&self.namespace, &format!("trusted:{email}"))
    }

    pub async fn is_trusted(&self, email: &str) -> DbResult<bool> {
        Ok(self.blobs.get_raw(&self.key(email)).await?.as_deref() == Some("true"))
    }

    pub async fn mark_trusted(&self, email: &str) -> DbResult<()> {
        self.blobs.put_raw(&self.key(email), "true").await?;
        info!(email = %email, "Device trusted");
        Ok(())
    }

    /// Clears the flag. Returns whether one was set.
    pub async fn forget(&self, email: &str) -> DbResult<bool> {
        self.blobs.delete(&self.key(email)).await
    }
}
