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

//! Working state and the per-block validate/apply engine.
//!
//! `State::apply` leaves `self` in an unspecified intermediate state on error, so it
//! is only ever run on a private clone that is discarded unless every step passes.

use crate::core::ledger::block::{Block, StateProof};
use crate::core::ledger::change::Change;
use crate::core::ledger::error::LedgerError;
use crate::core::ledger::group::{
    authorize_group_change, GroupSharedKey, GroupSharedKeyRef, GroupState, GroupStateRef,
    Participant,
};
use crate::core::state::kv::KeyValueState;
use crate::core::types::{PublicKey, H256};

/// How value writes reach the key-value state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Materialization {
    /// Replay every write against a fully known trie and check the resulting root.
    Full,
    /// Trust the block's declared root. Used by replicas holding only commitments;
    /// later reads may fail until proofs covering the key are merged.
    Trusted,
}

/// Key-value handle plus the current roster and shared key.
#[derive(Clone, Debug)]
pub struct State {
    kv: KeyValueState,
    group_state: GroupStateRef,
    shared_key: GroupSharedKeyRef,
    has_group_state_change: bool,
    has_shared_key_change: bool,
}

impl Default for State {
    fn default() -> Self {
        Self::create_empty()
    }
}

impl State {
    /// No values, no group, no shared key.
    pub fn create_empty() -> Self {
        Self::new(
            KeyValueState::empty(),
            GroupState::empty_state(),
            GroupSharedKey::empty_shared_key(),
        )
    }

    /// Assemble a state.
    pub fn new(
        kv: KeyValueState,
        group_state: GroupStateRef,
        shared_key: GroupSharedKeyRef,
    ) -> Self {
        Self {
            kv,
            group_state,
            shared_key,
            has_group_state_change: false,
            has_shared_key_change: false,
        }
    }

    /// Key-value handle.
    pub fn kv(&self) -> &KeyValueState {
        &self.kv
    }

    pub(crate) fn kv_mut(&mut self) -> &mut KeyValueState {
        &mut self.kv
    }

    /// Current roster.
    pub fn group_state(&self) -> GroupStateRef {
        self.group_state.clone()
    }

    /// Current shared key.
    pub fn shared_key(&self) -> GroupSharedKeyRef {
        self.shared_key.clone()
    }

    /// Write one value.
    pub fn set_value(&mut self, key: &[u8], value: &[u8]) -> Result<(), LedgerError> {
        Ok(self.kv.set_value(key, value)?)
    }

    /// Jump to a declared root without replaying writes.
    pub fn set_value_fast(&mut self, kv_hash: H256) {
        self.kv = KeyValueState::from_root_hash(kv_hash);
    }

    /// Replace the roster on behalf of `actor`. Nothing changes on error.
    pub fn set_group_state(
        &mut self,
        group_state: GroupStateRef,
        actor: &Participant,
    ) -> Result<(), LedgerError> {
        authorize_group_change(&self.group_state, &group_state, actor)?;
        self.group_state = group_state;
        Ok(())
    }

    /// Reset to the canonical empty shared key.
    pub fn clear_shared_key(&mut self) {
        self.shared_key = GroupSharedKey::empty_shared_key();
    }

    /// Install a shared key. Only one key per roster: the previous one must have been
    /// cleared by a group change first.
    pub fn set_shared_key(&mut self, shared_key: GroupSharedKeyRef) -> Result<(), LedgerError> {
        if !self.shared_key.is_empty() {
            return Err(LedgerError::InvalidSharedKey("shared key is already set"));
        }
        shared_key.check_destinations(&self.group_state)?;
        self.shared_key = shared_key;
        Ok(())
    }

    pub(crate) fn begin_block(&mut self) {
        self.has_group_state_change = false;
        self.has_shared_key_change = false;
    }

    /// Genesis only: stand in a one-member group so the first block can be
    /// authorized by its own signer.
    pub(crate) fn bootstrap_genesis(&mut self, signer: PublicKey) {
        if self.group_state.is_empty() {
            self.group_state = GroupState::bootstrap(signer);
        }
    }

    /// Apply one change with `actor` as the acting participant.
    pub fn apply_change(
        &mut self,
        change: &Change,
        actor: &Participant,
        mode: Materialization,
    ) -> Result<(), LedgerError> {
        match change {
            Change::SetValue { key, value } => match mode {
                Materialization::Full => self.set_value(key, value),
                Materialization::Trusted => Ok(()),
            },
            Change::SetGroupState { group_state } => {
                self.has_group_state_change = true;
                self.set_group_state(group_state.clone(), actor)?;
                // A secret shared with the old roster is void for the new one.
                self.clear_shared_key();
                Ok(())
            }
            Change::SetSharedKey { shared_key } => {
                self.has_shared_key_change = true;
                self.set_shared_key(shared_key.clone())
            }
        }
    }

    /// Check `proof` against the live state using this block's change flags.
    pub fn validate_state(&self, proof: &StateProof) -> Result<(), LedgerError> {
        if !proof.kv_hash.ct_eq(&self.kv.root_hash()) {
            return Err(LedgerError::StateHashMismatch);
        }

        match (&proof.group_state, self.has_group_state_change) {
            (Some(_), true) => {
                return Err(LedgerError::InvalidStateProofGroup(
                    "group state must be omitted when the block changes it",
                ))
            }
            (None, false) => {
                return Err(LedgerError::InvalidStateProofGroup(
                    "group state must be provided when the block does not change it",
                ))
            }
            (Some(group), false) if **group != *self.group_state => {
                return Err(LedgerError::InvalidStateProofGroup("group state differs"))
            }
            _ => {}
        }

        let key_changed = self.has_group_state_change || self.has_shared_key_change;
        match (&proof.shared_key, key_changed) {
            (Some(_), true) => Err(LedgerError::InvalidStateProofSecret(
                "shared key must be omitted when the block changes it",
            )),
            (None, false) => Err(LedgerError::InvalidStateProofSecret(
                "shared key must be provided when the block does not change it",
            )),
            (Some(key), false) if **key != *self.shared_key => {
                Err(LedgerError::InvalidStateProofSecret("shared key differs"))
            }
            _ => Ok(()),
        }
    }

    fn resolve_signer(&self, block: &Block) -> Result<Participant, LedgerError> {
        match &block.signer {
            Some(public_key) => self
                .group_state
                .participant_by_key(public_key)
                .cloned()
                .ok_or(LedgerError::ParticipantNotFound),
            None => match self.group_state.participants.as_slice() {
                [only] => Ok(only.clone()),
                _ => Err(LedgerError::ParticipantNotFound),
            },
        }
    }

    /// Trusted mode: keep local trie knowledge when the block's writes replay onto it
    /// and land on the declared root; otherwise fall back to a root-only handle.
    fn fast_forward(&mut self, block: &Block) {
        let declared = block.state_proof.kv_hash;
        let mut replayed = self.kv.clone();
        let replay = block.changes.iter().try_for_each(|change| match change {
            Change::SetValue { key, value } => replayed.set_value(key, value),
            Change::SetGroupState { .. } | Change::SetSharedKey { .. } => Ok(()),
        });
        if replay.is_ok() && replayed.root_hash() == declared {
            self.kv = replayed;
        } else {
            self.set_value_fast(declared);
        }
    }

    /// Validate and apply `block`: bootstrap, resolve signer, verify signature,
    /// replay changes, materialize the key-value root, check the state proof.
    pub fn apply(&mut self, block: &Block, mode: Materialization) -> Result<(), LedgerError> {
        if block.height == 0 {
            if let Some(signer) = block.signer {
                self.bootstrap_genesis(signer);
            }
        }

        // Permissions come from the roster as it was before this block.
        let actor = self.resolve_signer(block)?;
        block.verify_signature(&actor.public_key)?;

        self.begin_block();
        for change in block.changes.iter() {
            self.apply_change(change, &actor, mode)?;
        }
        if mode == Materialization::Trusted {
            self.fast_forward(block);
        }

        self.validate_state(&block.state_proof)
    }

    /// Seed a state from a single block, trusting its contents. Roster and shared key
    /// come from the block's own changes or, when unchanged, from its proof.
    pub fn create_from_block(
        block: &Block,
        snapshot: Option<&[u8]>,
        max_snapshot_bytes: usize,
    ) -> Result<Self, LedgerError> {
        let kv = match snapshot {
            Some(bytes) => {
                let kv = KeyValueState::from_snapshot(bytes, max_snapshot_bytes)?;
                if !kv.root_hash().ct_eq(&block.state_proof.kv_hash) {
                    return Err(LedgerError::StateHashMismatch);
                }
                kv
            }
            None => KeyValueState::from_root_hash(block.state_proof.kv_hash),
        };

        let mut group_state: Option<GroupStateRef> = None;
        let mut shared_key: Option<GroupSharedKeyRef> = None;

        if block.height == 0 {
            if let Some(signer) = block.signer {
                group_state = Some(GroupState::bootstrap(signer));
            }
        }
        for change in block.changes.iter() {
            match change {
                Change::SetValue { .. } => {}
                Change::SetGroupState { group_state: g } => {
                    group_state = Some(g.clone());
                    shared_key = Some(GroupSharedKey::empty_shared_key());
                }
                Change::SetSharedKey { shared_key: k } => shared_key = Some(k.clone()),
            }
        }
        if let Some(g) = &block.state_proof.group_state {
            group_state = Some(g.clone());
        }
        if let Some(k) = &block.state_proof.shared_key {
            shared_key = Some(k.clone());
        }

        let group_state =
            group_state.ok_or(LedgerError::InvalidStateProofGroup("no group state proof"))?;
        let shared_key =
            shared_key.ok_or(LedgerError::InvalidStateProofSecret("no shared key proof"))?;
        Ok(Self::new(kv, group_state, shared_key))
    }
}
