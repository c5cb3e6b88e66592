use std::{collections::HashMap, sync::Arc};

use bls::COMPRESSED_SIZE;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::Error;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum DutyRole {
    Attester = 0,
    Proposer = 1,
    Aggregator = 2,
    SyncCommittee = 3,
}

/// A role byte followed by the bytes of a compressed public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DutyLockKey([u8; DutyLockKey::LENGTH]);

impl DutyLockKey {
    pub const LENGTH: usize = 1 + COMPRESSED_SIZE;

    pub fn new(role: DutyRole, public_key: &[u8]) -> Result<Self, Error> {
        if public_key.len() != COMPRESSED_SIZE {
            return Err(Error::LockKeyError {
                length: public_key.len(),
            });
        }

        let mut bytes = [0; Self::LENGTH];
        let [role_byte, key_bytes @ ..] = &mut bytes;

        *role_byte = role as u8;
        key_bytes.copy_from_slice(public_key);

        Ok(Self(bytes))
    }
}

/// Mutexes for signing identities, created on first use and kept for the lifetime of the registry.
#[derive(Default)]
pub struct DutyLocks {
    locks: Mutex<HashMap<DutyLockKey, Arc<AsyncMutex<()>>>>,
}

impl DutyLocks {
    /// The registry lock is only held while looking up the mutex for `key`, never while waiting.
    pub async fn lock(&self, key: DutyLockKey) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(self.locks.lock().entry(key).or_default());
        mutex.lock_owned().await
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }
}
