//! Row encoding shared by paste storage operations.

use crate::db::time_util::{expiry_millis, reverse_millis};
use crate::error::StorageFault;
use crate::models::paste::Paste;
use serde::{Deserialize, Serialize};

/// On-disk row: the paste plus its insert sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredPaste {
    pub(crate) seq: u64,
    pub(crate) paste: Paste,
}

impl StoredPaste {
    pub(crate) fn recency_key(&self) -> (u64, u64) {
        (reverse_millis(self.paste.created_at), u64::MAX - self.seq)
    }

    pub(crate) fn expiry_key(&self) -> (u64, &str) {
        (
            expiry_millis(self.paste.created_at, self.paste.duration),
            self.paste.id.as_str(),
        )
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, StorageFault> {
        Ok(bincode::serialize(self)?)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self, StorageFault> {
        Ok(bincode::deserialize(bytes)?)
    }
}
