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

#![no_main]
#![forbid(unsafe_code)]

use arbitrary::Arbitrary;
use groupledger::core::state::kv::KeyValueState;
use groupledger::core::state::trie;
use libfuzzer_sys::fuzz_target;

#[derive(Clone, Debug, Arbitrary)]
struct Input {
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
    probe: Vec<u8>,
    raw_proof: Vec<u8>,
}

fuzz_target!(|inp: Input| {
    let mut full = KeyValueState::empty();
    for (k, v) in inp.pairs.iter() {
        if full.set_value(k, v).is_err() {
            return;
        }
    }
    let root = full.root_hash();

    // Honest proofs always merge and agree with the full trie.
    if let Ok(bytes) = full.gen_proof(&[inp.probe.as_slice()]) {
        let proof = trie::decode_proof(&bytes, usize::MAX).expect("own proof decodes");
        let mut light = KeyValueState::from_root_hash(root);
        light.merge_proof(&proof).expect("own proof merges");
        assert_eq!(light.get_value(&inp.probe).ok(), full.get_value(&inp.probe).ok());
    }

    // Arbitrary bytes never change the root or panic.
    if let Ok(proof) = trie::decode_proof(&inp.raw_proof, 1 << 20) {
        let mut light = KeyValueState::from_root_hash(root);
        let _ = light.merge_proof(&proof);
        assert_eq!(light.root_hash(), root);
    }
});
