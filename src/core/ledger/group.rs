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

//! Group roster, permission flags and the rotating shared key.
//!
//! Group states and shared keys are immutable once built and passed around as
//! `Arc`s. A change always produces a new value that replaces the reference.

use crate::core::ledger::error::LedgerError;
use crate::core::types::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::BitOr;
use std::sync::{Arc, OnceLock};

/// Participant permission bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionFlags(u32);

impl PermissionFlags {
    /// No permissions.
    pub const NONE: PermissionFlags = PermissionFlags(0);
    /// May add participants.
    pub const ADD_USERS: PermissionFlags = PermissionFlags(1);
    /// May remove participants.
    pub const REMOVE_USERS: PermissionFlags = PermissionFlags(1 << 1);
    /// Every flag known to this version.
    pub const ALL: PermissionFlags = PermissionFlags(1 | (1 << 1));

    /// From raw bits. Unknown bits are kept and checked like any other flag.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }
    /// Raw bits.
    pub fn bits(&self) -> u32 {
        self.0
    }
    /// True if every flag in `other` is held.
    pub fn contains(&self, other: PermissionFlags) -> bool {
        self.0 & other.0 == other.0
    }
    /// Flags of `self` not held by `holder`.
    pub fn missing_from(&self, holder: PermissionFlags) -> PermissionFlags {
        PermissionFlags(self.0 & !holder.0)
    }
    /// True if no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PermissionFlags {
    type Output = PermissionFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        PermissionFlags(self.0 | rhs.0)
    }
}

/// Group member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Application-level user id.
    pub user_id: i64,
    /// Granted permissions.
    pub flags: PermissionFlags,
    /// Signing key.
    pub public_key: PublicKey,
}

/// Shared handle to an immutable group state.
pub type GroupStateRef = Arc<GroupState>;

/// Ordered participant roster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    /// Participants in roster order.
    pub participants: Vec<Participant>,
}

impl GroupState {
    /// Build a shared group state.
    pub fn new(participants: Vec<Participant>) -> GroupStateRef {
        Arc::new(GroupState { participants })
    }

    /// Canonical "no group yet" value.
    pub fn empty_state() -> GroupStateRef {
        static EMPTY: OnceLock<GroupStateRef> = OnceLock::new();
        EMPTY.get_or_init(|| Arc::new(GroupState::default())).clone()
    }

    /// Ephemeral one-member group used to evaluate a genesis block: the signer
    /// as user 0 with every add/remove right.
    pub fn bootstrap(signer: PublicKey) -> GroupStateRef {
        Self::new(vec![Participant {
            user_id: 0,
            flags: PermissionFlags::ADD_USERS | PermissionFlags::REMOVE_USERS,
            public_key: signer,
        }])
    }

    /// True when the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Find by user id.
    pub fn participant_by_id(&self, user_id: i64) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// Find by public key.
    pub fn participant_by_key(&self, public_key: &PublicKey) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.public_key == public_key)
    }

    /// Reject duplicate user ids or public keys.
    pub fn check_unique(&self) -> Result<(), LedgerError> {
        let mut ids = BTreeSet::new();
        let mut keys = BTreeSet::new();
        for p in self.participants.iter() {
            if !ids.insert(p.user_id) {
                return Err(LedgerError::InvalidGroupState("duplicate user_id"));
            }
            if !keys.insert(p.public_key) {
                return Err(LedgerError::InvalidGroupState("duplicate public_key"));
            }
        }
        Ok(())
    }
}

/// Check that `actor` may replace `old` with `new`.
///
/// Removing anyone needs `REMOVE_USERS`. Adding anyone needs `ADD_USERS`, and the
/// newcomer's flags must all be held by `actor`. Flags newly granted to an existing
/// participant must be held by `actor` as well.
pub fn authorize_group_change(
    old: &GroupState,
    new: &GroupState,
    actor: &Participant,
) -> Result<(), LedgerError> {
    new.check_unique()?;

    let old_flags: BTreeMap<i64, PermissionFlags> = old
        .participants
        .iter()
        .map(|p| (p.user_id, p.flags))
        .collect();
    let new_ids: BTreeSet<i64> = new.participants.iter().map(|p| p.user_id).collect();

    let mut needed = PermissionFlags::NONE;
    let mut granted = PermissionFlags::NONE;

    if old.participants.iter().any(|p| !new_ids.contains(&p.user_id)) {
        needed = needed | PermissionFlags::REMOVE_USERS;
    }
    for p in new.participants.iter() {
        match old_flags.get(&p.user_id) {
            None => {
                needed = needed | PermissionFlags::ADD_USERS;
                granted = granted | p.flags;
            }
            Some(prev) => granted = granted | p.flags.missing_from(*prev),
        }
    }

    let missing = needed.missing_from(actor.flags);
    if missing.contains(PermissionFlags::ADD_USERS) {
        return Err(LedgerError::NoPermissions("missing add_users flag"));
    }
    if missing.contains(PermissionFlags::REMOVE_USERS) {
        return Err(LedgerError::NoPermissions("missing remove_users flag"));
    }
    if !granted.missing_from(actor.flags).is_empty() {
        return Err(LedgerError::NoPermissions(
            "cannot grant flags the signer does not hold",
        ));
    }
    Ok(())
}

/// Shared handle to an immutable shared key.
pub type GroupSharedKeyRef = Arc<GroupSharedKey>;

/// Group secret encrypted once per destination participant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSharedKey {
    /// Ephemeral public key used for the per-destination encryption.
    pub ek: PublicKey,
    /// Encrypted secret.
    pub encrypted_shared_key: Vec<u8>,
    /// Destination user ids, paired by position with `dest_header`.
    pub dest_user_id: Vec<i64>,
    /// Per-destination headers.
    pub dest_header: Vec<Vec<u8>>,
}

impl GroupSharedKey {
    /// Canonical "no shared key" value.
    pub fn empty_shared_key() -> GroupSharedKeyRef {
        static EMPTY: OnceLock<GroupSharedKeyRef> = OnceLock::new();
        EMPTY
            .get_or_init(|| Arc::new(GroupSharedKey::default()))
            .clone()
    }

    /// True for the canonical empty value.
    pub fn is_empty(&self) -> bool {
        *self == GroupSharedKey::default()
    }

    /// Check the destination lists against the roster.
    pub fn check_destinations(&self, group: &GroupState) -> Result<(), LedgerError> {
        if self.dest_user_id.len() != self.dest_header.len() {
            return Err(LedgerError::InvalidSharedKey(
                "destination ids and headers differ in length",
            ));
        }
        let mut seen = BTreeSet::new();
        for user_id in self.dest_user_id.iter() {
            if group.participant_by_id(*user_id).is_none() {
                return Err(LedgerError::InvalidSharedKey("unknown destination user_id"));
            }
            if !seen.insert(*user_id) {
                return Err(LedgerError::InvalidSharedKey("duplicate destination user_id"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(b: u8) -> PublicKey {
        PublicKey::from_bytes([b; 32])
    }

    fn member(user_id: i64, flags: PermissionFlags, key: u8) -> Participant {
        Participant {
            user_id,
            flags,
            public_key: pk(key),
        }
    }

    #[test]
    fn adding_needs_add_users() {
        let actor = member(1, PermissionFlags::REMOVE_USERS, 1);
        let old = GroupState {
            participants: vec![actor.clone()],
        };
        let new = GroupState {
            participants: vec![actor.clone(), member(2, PermissionFlags::NONE, 2)],
        };
        assert_eq!(
            authorize_group_change(&old, &new, &actor),
            Err(LedgerError::NoPermissions("missing add_users flag"))
        );
    }

    #[test]
    fn removing_needs_remove_users() {
        let actor = member(1, PermissionFlags::ADD_USERS, 1);
        let old = GroupState {
            participants: vec![actor.clone(), member(2, PermissionFlags::NONE, 2)],
        };
        let new = GroupState {
            participants: vec![actor.clone()],
        };
        assert_eq!(
            authorize_group_change(&old, &new, &actor),
            Err(LedgerError::NoPermissions("missing remove_users flag"))
        );
    }

    #[test]
    fn upgrading_existing_member_beyond_actor_is_rejected() {
        let actor = member(1, PermissionFlags::ADD_USERS, 1);
        let old = GroupState {
            participants: vec![actor.clone(), member(2, PermissionFlags::NONE, 2)],
        };
        let new = GroupState {
            participants: vec![actor.clone(), member(2, PermissionFlags::REMOVE_USERS, 2)],
        };
        assert!(matches!(
            authorize_group_change(&old, &new, &actor),
            Err(LedgerError::NoPermissions(_))
        ));
    }

    #[test]
    fn keeping_existing_flags_needs_nothing() {
        let actor = member(1, PermissionFlags::NONE, 1);
        let old = GroupState {
            participants: vec![actor.clone(), member(2, PermissionFlags::ALL, 2)],
        };
        // Reordering with unchanged flags is not an escalation.
        let new = GroupState {
            participants: vec![member(2, PermissionFlags::ALL, 2), actor.clone()],
        };
        assert_eq!(authorize_group_change(&old, &new, &actor), Ok(()));
    }

    #[test]
    fn duplicates_are_invalid() {
        let actor = member(1, PermissionFlags::ALL, 1);
        let new = GroupState {
            participants: vec![actor.clone(), member(2, PermissionFlags::NONE, 1)],
        };
        assert_eq!(
            authorize_group_change(&GroupState::default(), &new, &actor),
            Err(LedgerError::InvalidGroupState("duplicate public_key"))
        );
    }
}
