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

use groupledger::core::ledger::group::authorize_group_change;
use groupledger::core::ledger::{GroupState, LedgerError, Participant, PermissionFlags};
use groupledger::core::types::PublicKey;
use proptest::prelude::*;

fn participant(user_id: i64, bits: u32) -> Participant {
    Participant {
        user_id,
        flags: PermissionFlags::from_bits(bits),
        public_key: PublicKey::from_bytes([user_id as u8; 32]),
    }
}

proptest! {
    #[test]
    fn prop_accepted_changes_never_escalate(
        actor_bits in 0u32..4,
        old_bits in prop::collection::vec(0u32..4, 0..5),
        keep in prop::collection::vec(any::<bool>(), 5),
        new_bits in prop::collection::vec(0u32..4, 5),
        added_bits in prop::collection::vec(0u32..4, 0..3),
    ) {
        let actor = participant(100, actor_bits);

        let mut old = vec![actor.clone()];
        old.extend(old_bits.iter().enumerate().map(|(i, b)| participant(i as i64 + 1, *b)));

        let mut new = vec![actor.clone()];
        for i in 0..old_bits.len() {
            if keep[i] {
                new.push(participant(i as i64 + 1, new_bits[i]));
            }
        }
        new.extend(added_bits.iter().enumerate().map(|(j, b)| participant(j as i64 + 50, *b)));

        let removed = old_bits.iter().enumerate().any(|(i, _)| !keep[i]);
        let added = !added_bits.is_empty();

        let old_state = GroupState::new(old.clone());
        let new_state = GroupState::new(new.clone());
        match authorize_group_change(&old_state, &new_state, &actor) {
            Ok(()) => {
                for p in new.iter() {
                    let prev = old
                        .iter()
                        .find(|o| o.user_id == p.user_id)
                        .map_or(PermissionFlags::NONE, |o| o.flags);
                    prop_assert!(p.flags.missing_from(actor.flags | prev).is_empty());
                }
                prop_assert!(!removed || actor.flags.contains(PermissionFlags::REMOVE_USERS));
                prop_assert!(!added || actor.flags.contains(PermissionFlags::ADD_USERS));
            }
            Err(e) => prop_assert!(matches!(e, LedgerError::NoPermissions(_))),
        }
    }

    #[test]
    fn prop_full_admin_may_reshape_freely(
        old_bits in prop::collection::vec(0u32..4, 0..5),
        new_bits in prop::collection::vec(0u32..4, 0..5),
    ) {
        let actor = participant(100, PermissionFlags::ALL.bits());
        let mut old = vec![actor.clone()];
        old.extend(old_bits.iter().enumerate().map(|(i, b)| participant(i as i64 + 1, *b)));
        let mut new = vec![actor.clone()];
        new.extend(new_bits.iter().enumerate().map(|(i, b)| participant(i as i64 + 20, *b)));

        prop_assert!(
            authorize_group_change(&GroupState::new(old), &GroupState::new(new), &actor).is_ok()
        );
    }
}
