//! Directory change log.

use serde::{Deserialize, Serialize};
use tcr_types::{Address, IdentityId, Timestamp};

/// One change to an identity. `previous_change` is the sequence number of the
/// identity's preceding change (0 for the first), so an indexer can walk an
/// identity's history backwards without scanning the whole log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryEvent {
    OwnerChanged {
        identity: IdentityId,
        owner: Address,
        previous_change: u64,
    },
    DelegateChanged {
        identity: IdentityId,
        delegate: Address,
        valid_until: Timestamp,
        previous_change: u64,
    },
    AttributeChanged {
        identity: IdentityId,
        key: String,
        #[serde(with = "hex::serde")]
        value: Vec<u8>,
        valid_until: Timestamp,
        previous_change: u64,
    },
}

impl DirectoryEvent {
    pub fn identity(&self) -> &IdentityId {
        match self {
            Self::OwnerChanged { identity, .. }
            | Self::DelegateChanged { identity, .. }
            | Self::AttributeChanged { identity, .. } => identity,
        }
    }
}
