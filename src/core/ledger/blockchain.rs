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

//! Hash-linked chain of blocks over a single committed state.
//!
//! Every mutation follows copy-validate-publish: a candidate `State` is cloned
//! from the committed one, all checks run against the candidate, and only then is
//! it swapped in together with the new tip. A failed call leaves the chain exactly
//! as it was.

use crate::config::Limits;
use crate::core::ledger::block::{Block, StateProof};
use crate::core::ledger::change::Change;
use crate::core::ledger::error::LedgerError;
use crate::core::ledger::group::{GroupSharedKeyRef, GroupStateRef};
use crate::core::ledger::state::{Materialization, State};
use crate::core::security::keys::PrivateKey;
use crate::core::state::trie::{NodeRef, TrieError};
use crate::core::types::{sha256, Signature, H256};
use tracing::{debug, warn};

/// Committed chain tip and state.
#[derive(Clone, Debug)]
pub struct Blockchain {
    last_block: Block,
    last_block_hash: H256,
    state: State,
    limits: Limits,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::create_empty()
    }
}

impl Blockchain {
    /// Chain with no blocks, default limits.
    pub fn create_empty() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Chain with no blocks.
    pub fn with_limits(limits: Limits) -> Self {
        Self {
            last_block: Block::empty(),
            last_block_hash: H256::ZERO,
            state: State::create_empty(),
            limits,
        }
    }

    /// Seed a chain from one block (typically genesis), optionally importing a full
    /// key-value snapshot matching the block's declared root.
    pub fn create_from_block(
        block: Block,
        snapshot: Option<&[u8]>,
        limits: Limits,
    ) -> Result<Self, LedgerError> {
        if block.height < 0 {
            return Err(LedgerError::HeightMismatch {
                expected: 0,
                got: block.height,
            });
        }
        let last_block_hash = block.calc_hash()?;
        let state = State::create_from_block(&block, snapshot, limits.max_snapshot_bytes)?;
        debug!(height = block.height, hash = %last_block_hash, "chain seeded from block");
        Ok(Self {
            last_block: block,
            last_block_hash,
            state,
            limits,
        })
    }

    /// Height of the last applied block, `-1` when empty.
    pub fn height(&self) -> i64 {
        self.last_block.height
    }

    /// Height the next block must carry.
    fn next_height(&self, got: i64) -> Result<i64, LedgerError> {
        self.height()
            .checked_add(1)
            .ok_or(LedgerError::HeightMismatch {
                expected: self.height(),
                got,
            })
    }

    /// Last applied block.
    pub fn last_block(&self) -> &Block {
        &self.last_block
    }

    /// Hash of the last applied block.
    pub fn last_block_hash(&self) -> H256 {
        self.last_block_hash
    }

    /// Committed state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Committed roster.
    pub fn group_state(&self) -> GroupStateRef {
        self.state.group_state()
    }

    /// Committed shared key.
    pub fn shared_key(&self) -> GroupSharedKeyRef {
        self.state.shared_key()
    }

    /// Decode limits in force.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Build and sign the next block. The committed chain is not touched; any
    /// permission or state failure aborts construction.
    pub fn build_block(
        &self,
        changes: Vec<Change>,
        private_key: &PrivateKey,
    ) -> Result<Block, LedgerError> {
        let public_key = private_key.public_key()?;
        let height = self.next_height(self.height())?;

        let mut state = self.state.clone();
        if height == 0 {
            state.bootstrap_genesis(public_key);
        }
        let actor = state
            .group_state()
            .participant_by_key(&public_key)
            .cloned()
            .ok_or(LedgerError::ParticipantNotFound)?;

        state.begin_block();
        for change in changes.iter() {
            state.apply_change(change, &actor, Materialization::Full)?;
        }

        let state_proof = derive_state_proof(&state, &changes);
        let mut block = Block {
            signature: Signature::default(),
            prev_block_hash: self.last_block_hash,
            changes,
            height,
            state_proof,
            signer: Some(public_key),
        };
        block.sign_in_place(private_key)?;
        Ok(block)
    }

    /// Single-write block.
    pub fn set_value(
        &self,
        key: &[u8],
        value: &[u8],
        private_key: &PrivateKey,
    ) -> Result<Block, LedgerError> {
        self.build_block(vec![Change::set_value(key, value)], private_key)
    }

    /// Validate `block` against the tip and commit it.
    pub fn try_apply_block(
        &mut self,
        block: Block,
        mode: Materialization,
    ) -> Result<(), LedgerError> {
        let height = block.height;
        let (state, hash) = match self.stage(&block, mode) {
            Ok(staged) => staged,
            Err(e) => {
                warn!(height, ?mode, error = %e, "block rejected");
                return Err(e);
            }
        };

        // No errors after this point.
        self.state = state;
        self.last_block_hash = hash;
        self.last_block = block;
        debug!(height, hash = %hash, ?mode, "block applied");
        Ok(())
    }

    fn stage(&self, block: &Block, mode: Materialization) -> Result<(State, H256), LedgerError> {
        let expected = self.next_height(block.height)?;
        if block.height != expected {
            return Err(LedgerError::HeightMismatch {
                expected,
                got: block.height,
            });
        }
        if block.prev_block_hash != self.last_block_hash {
            return Err(LedgerError::HashMismatch);
        }

        let bytes = block.to_bytes()?;
        if bytes.len() > self.limits.max_block_bytes {
            return Err(LedgerError::BlockTooLarge {
                size: bytes.len(),
                max: self.limits.max_block_bytes,
            });
        }

        let mut state = self.state.clone();
        state.apply(block, mode)?;

        // Height is at least 0 here, so this is the block hash.
        Ok((state, sha256(&bytes)))
    }

    /// Read a committed value.
    pub fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.state.kv().get_value(key)?)
    }

    /// Proof for `keys` against the committed root (full replicas).
    pub fn generate_proof(&self, keys: &[&[u8]]) -> Result<Vec<u8>, LedgerError> {
        Ok(self.state.kv().gen_proof(keys)?)
    }

    /// Full key-value snapshot (full replicas).
    pub fn export_snapshot(&self) -> Result<Vec<u8>, LedgerError> {
        Ok(self.state.kv().build_snapshot()?)
    }

    /// Merge proof data into the committed key-value view. The root is unchanged,
    /// only what is known below it grows.
    pub fn merge_proof(&mut self, proof: &NodeRef) -> Result<(), LedgerError> {
        self.state
            .kv_mut()
            .merge_proof(proof)
            .map_err(|e| match e {
                TrieError::HashMismatch => LedgerError::ProofInvalid,
                other => other.into(),
            })
    }
}

/// Post-state commitments minus whatever this block's changes already attest.
fn derive_state_proof(state: &State, changes: &[Change]) -> StateProof {
    let mut proof = StateProof {
        kv_hash: state.kv().root_hash(),
        group_state: Some(state.group_state()),
        shared_key: Some(state.shared_key()),
    };
    for change in changes.iter() {
        match change {
            Change::SetValue { .. } => {}
            Change::SetGroupState { .. } => {
                proof.group_state = None;
                proof.shared_key = None;
            }
            Change::SetSharedKey { .. } => proof.shared_key = None,
        }
    }
    proof
}
