//! Anonymous device identity.
//!
//! The device identifier is the sole voter identity: there is no login and
//! no check that one identifier corresponds to one person. It is created
//! lazily on first access and persisted in [`ClientStorage`] under
//! [`DEVICE_ID_KEY`].

use std::sync::{Arc, OnceLock};

use crate::storage::ClientStorage;
use crate::types::DeviceId;

/// Storage key holding the persisted device identifier.
pub const DEVICE_ID_KEY: &str = "gv_device_id";

/// Source of the current device's identity.
///
/// Kept behind a trait so the random client token can later be swapped for
/// a server-issued one without touching the voting or submission code.
pub trait IdentityProvider: Send + Sync {
    /// Return this device's identifier. Never fails and is stable across
    /// calls within the same storage scope.
    fn device_id(&self) -> DeviceId;
}

/// Identity persisted in client storage.
pub struct DeviceIdentity {
    storage: Arc<dyn ClientStorage>,
    /// Identifier generated by this instance, reused when storage is
    /// unreadable or unwritable so the value stays stable.
    generated: OnceLock<DeviceId>,
}

impl DeviceIdentity {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self {
            storage,
            generated: OnceLock::new(),
        }
    }
}

impl IdentityProvider for DeviceIdentity {
    fn device_id(&self) -> DeviceId {
        match self.storage.get(DEVICE_ID_KEY) {
            Ok(Some(stored)) if !stored.trim().is_empty() => return DeviceId::from(stored),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read device id from storage"),
        }

        let id = self.generated.get_or_init(DeviceId::generate).clone();
        match self.storage.set(DEVICE_ID_KEY, id.as_str()) {
            Ok(()) => tracing::debug!(device_id = %id, "Persisted new device id"),
            Err(e) => tracing::warn!(error = %e, "Failed to persist device id"),
        }
        id
    }
}

/// Fixed identity, e.g. a token issued by a server.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub DeviceId);

impl IdentityProvider for StaticIdentity {
    fn device_id(&self) -> DeviceId {
        self.0.clone()
    }
}
