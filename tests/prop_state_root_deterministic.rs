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

use groupledger::core::state::kv::KeyValueState;
use groupledger::core::state::trie;
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #[test]
    fn prop_state_root_deterministic(
        kvs in prop::collection::vec((prop::collection::vec(any::<u8>(), 1..16),
                                      prop::collection::vec(any::<u8>(), 0..32)), 1..50)
    ) {
        let mut map: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        for (k, v) in kvs.into_iter() { map.insert(k, v); }

        let mut forward = KeyValueState::empty();
        for (k, v) in map.iter() {
            forward.set_value(k, v).unwrap();
        }
        let mut backward = KeyValueState::empty();
        for (k, v) in map.iter().rev() {
            backward.set_value(k, v).unwrap();
        }

        prop_assert_eq!(forward.root_hash(), backward.root_hash());

        let snap = forward.build_snapshot().unwrap();
        let restored = KeyValueState::from_snapshot(&snap, usize::MAX).unwrap();
        prop_assert_eq!(restored.root_hash(), forward.root_hash());
    }

    #[test]
    fn prop_proofs_answer_like_the_full_trie(
        kvs in prop::collection::vec((prop::collection::vec(any::<u8>(), 1..8),
                                      prop::collection::vec(any::<u8>(), 0..8)), 0..30),
        probe in prop::collection::vec(any::<u8>(), 1..8)
    ) {
        let mut full = KeyValueState::empty();
        for (k, v) in kvs.iter() {
            full.set_value(k, v).unwrap();
        }

        let bytes = full.gen_proof(&[probe.as_slice()]).unwrap();
        let proof = trie::decode_proof(&bytes, usize::MAX).unwrap();
        let mut light = KeyValueState::from_root_hash(full.root_hash());
        light.merge_proof(&proof).unwrap();

        prop_assert_eq!(light.get_value(&probe).unwrap(), full.get_value(&probe).unwrap());
        prop_assert_eq!(light.root_hash(), full.root_hash());
    }
}
