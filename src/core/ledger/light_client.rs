// Copyright (c) 2026 Groupledger
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Light client: follows the chain on root commitments only.
//!
//! Blocks are applied in trusted mode. Values written by observed blocks are cached
//! locally; anything else is served from trie knowledge gained through
//! [`LightClient::add_proof`].

use crate::config::Limits;
use crate::core::ledger::block::Block;
use crate::core::ledger::blockchain::Blockchain;
use crate::core::ledger::change::Change;
use crate::core::ledger::error::LedgerError;
use crate::core::ledger::group::{GroupSharedKeyRef, GroupStateRef};
use crate::core::ledger::state::Materialization;
use crate::core::security::keys::PrivateKey;
use crate::core::state::trie;
use crate::core::types::PublicKey;
use crate::monitoring::metrics::LedgerMetrics;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache key width.
pub const CACHE_KEY_LEN: usize = 32;

/// Last observed write of a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Height of the block that wrote the value.
    pub height: i64,
    /// Value bytes.
    pub value: Vec<u8>,
}

/// Light client state.
pub struct LightClient {
    chain: Blockchain,
    cache: BTreeMap<[u8; CACHE_KEY_LEN], CacheEntry>,
    metrics: Option<Arc<LedgerMetrics>>,
}

impl LightClient {
    /// Client with no blocks yet.
    pub fn create_empty(limits: Limits) -> Self {
        Self {
            chain: Blockchain::with_limits(limits),
            cache: BTreeMap::new(),
            metrics: None,
        }
    }

    /// Start from a serialized block (usually the latest one a peer handed over).
    /// `own_key` must belong to a participant of the seeded group.
    pub fn create_from_block(
        block_bytes: &[u8],
        own_key: &PublicKey,
        limits: Limits,
    ) -> Result<Self, LedgerError> {
        let block = Block::from_bytes(block_bytes, limits.max_block_bytes)?;
        let chain = Blockchain::create_from_block(block, None, limits)?;
        if chain.group_state().participant_by_key(own_key).is_none() {
            return Err(LedgerError::ParticipantNotFound);
        }

        let mut client = Self {
            chain,
            cache: BTreeMap::new(),
            metrics: None,
        };
        let last = client.chain.last_block().clone();
        client.remember(last.height, &last.changes);
        Ok(client)
    }

    /// Report to `metrics` from now on.
    pub fn with_metrics(mut self, metrics: Arc<LedgerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Underlying chain.
    pub fn blockchain(&self) -> &Blockchain {
        &self.chain
    }

    /// Height of the last applied block.
    pub fn height(&self) -> i64 {
        self.chain.height()
    }

    /// Committed roster.
    pub fn group_state(&self) -> GroupStateRef {
        self.chain.group_state()
    }

    /// Committed shared key.
    pub fn shared_key(&self) -> GroupSharedKeyRef {
        self.chain.shared_key()
    }

    /// Number of cached values.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Decode and apply a block in trusted mode, then cache its writes.
    /// Returns the block's changes.
    pub fn apply_block(&mut self, block_bytes: &[u8]) -> Result<Vec<Change>, LedgerError> {
        let res = Block::from_bytes(block_bytes, self.chain.limits().max_block_bytes)
            .map_err(LedgerError::from)
            .and_then(|block| {
                self.chain
                    .try_apply_block(block.clone(), Materialization::Trusted)?;
                Ok(block)
            });

        let block = match res {
            Ok(block) => block,
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.on_block_rejected();
                }
                return Err(e);
            }
        };

        self.remember(block.height, &block.changes);
        if let Some(m) = &self.metrics {
            m.on_block_applied(block.height);
            m.cache_entries.set(self.cache.len() as i64);
        }
        Ok(block.changes)
    }

    fn remember(&mut self, height: i64, changes: &[Change]) {
        for change in changes.iter() {
            match change {
                Change::SetValue { key, value } => {
                    let Ok(k) = <[u8; CACHE_KEY_LEN]>::try_from(key.as_slice()) else {
                        debug!(len = key.len(), "write with non fixed-width key left uncached");
                        continue;
                    };
                    let fresh = self.cache.get(&k).map_or(true, |e| e.height <= height);
                    if fresh {
                        self.cache.insert(
                            k,
                            CacheEntry {
                                height,
                                value: value.clone(),
                            },
                        );
                    }
                }
                Change::SetGroupState { .. } | Change::SetSharedKey { .. } => {}
            }
        }
    }

    /// Value for `key`: cached write first, then merged proof data. Fails when the
    /// key's path is only known by hash.
    pub fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Ok(k) = <[u8; CACHE_KEY_LEN]>::try_from(key) {
            if let Some(entry) = self.cache.get(&k) {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.chain.get_value(key)
    }

    /// Decode a proof, check it commits to the current root and merge it into local
    /// trie knowledge. Undecodable bytes are `ProofInvalid` as well.
    pub fn add_proof(&mut self, proof_bytes: &[u8]) -> Result<(), LedgerError> {
        let res = trie::decode_proof(proof_bytes, self.chain.limits().max_proof_bytes)
            .map_err(|_| LedgerError::ProofInvalid)
            .and_then(|proof| self.chain.merge_proof(&proof));

        if let Some(m) = &self.metrics {
            m.on_proof(res.is_ok());
        }
        match &res {
            Ok(()) => debug!(height = self.chain.height(), "proof merged"),
            Err(e) => warn!(height = self.chain.height(), error = %e, "proof rejected"),
        }
        res
    }

    /// Build, sign and serialize the next block.
    pub fn build_block(
        &self,
        changes: Vec<Change>,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>, LedgerError> {
        let block = self.chain.build_block(changes, private_key)?;
        Ok(block.to_bytes()?)
    }
}
