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

use groupledger::config::Limits;
use groupledger::core::ledger::{
    Block, Blockchain, Change, GroupSharedKey, GroupState, LedgerError, LightClient, Materialization,
    Participant, PermissionFlags,
};
use groupledger::core::security::keys::PrivateKey;
use groupledger::core::state::trie::TrieError;
use groupledger::core::types::{PublicKey, H256};
use groupledger::monitoring::metrics::LedgerMetrics;
use std::sync::Arc;

const SLOT: [u8; 32] = [7u8; 32];

fn key(n: u8) -> PrivateKey {
    PrivateKey::from_seed([n; 32])
}

fn pk(k: &PrivateKey) -> PublicKey {
    k.public_key().unwrap()
}

/// Full replica with users 1 (admin) and 2 (no flags); returns every block's bytes.
fn full_chain(admin: &PrivateKey, member: &PrivateKey) -> (Blockchain, Vec<Vec<u8>>) {
    let mut chain = Blockchain::create_empty();
    let mut blocks = Vec::new();

    let mut push = |chain: &mut Blockchain, changes: Vec<Change>| {
        let block = chain.build_block(changes, admin).unwrap();
        blocks.push(block.to_bytes().unwrap());
        chain.try_apply_block(block, Materialization::Full).unwrap();
    };

    push(
        &mut chain,
        vec![Change::SetGroupState {
            group_state: GroupState::new(vec![
                Participant {
                    user_id: 1,
                    flags: PermissionFlags::ALL,
                    public_key: pk(admin),
                },
                Participant {
                    user_id: 2,
                    flags: PermissionFlags::NONE,
                    public_key: pk(member),
                },
            ]),
        }],
    );
    push(&mut chain, vec![Change::set_value("short", "s")]);
    for v in 1..=3u8 {
        push(&mut chain, vec![Change::set_value(SLOT.to_vec(), vec![v])]);
    }
    (chain, blocks)
}

#[test]
fn follows_the_chain_and_caches_latest_writes() {
    let (s, t) = (key(1), key(2));
    let (full, blocks) = full_chain(&s, &t);

    let mut lc = LightClient::create_empty(Limits::default());
    for bytes in blocks.iter() {
        lc.apply_block(bytes).unwrap();
    }
    assert_eq!(lc.height(), full.height());
    assert_eq!(lc.blockchain().last_block_hash(), full.last_block_hash());
    assert_eq!(lc.group_state(), full.group_state());
    assert_eq!(lc.cached_len(), 1);
    assert_eq!(lc.get_value(&SLOT).unwrap(), Some(vec![3]));
    // Followed from genesis, so the trie replayed every write.
    assert_eq!(lc.get_value(b"short").unwrap(), Some(b"s".to_vec()));
}

#[test]
fn apply_block_returns_the_changes() {
    let (s, t) = (key(1), key(2));
    let (_, blocks) = full_chain(&s, &t);

    let mut lc = LightClient::create_empty(Limits::default());
    let genesis = lc.apply_block(&blocks[0]).unwrap();
    assert!(matches!(genesis.as_slice(), [Change::SetGroupState { .. }]));
    let write = lc.apply_block(&blocks[1]).unwrap();
    assert_eq!(write, vec![Change::set_value("short", "s")]);
}

#[test]
fn unknown_paths_need_a_proof() {
    let (s, t) = (key(1), key(2));
    let (full, blocks) = full_chain(&s, &t);
    let last = blocks.last().unwrap();

    let mut lc = LightClient::create_from_block(last, &pk(&t), Limits::default()).unwrap();
    assert_eq!(lc.height(), full.height());
    // The seeding block's own write is cached.
    assert_eq!(lc.get_value(&SLOT).unwrap(), Some(vec![3]));

    assert_eq!(
        lc.get_value(b"short"),
        Err(LedgerError::Trie(TrieError::Pruned))
    );
    assert_eq!(
        lc.get_value(b"never"),
        Err(LedgerError::Trie(TrieError::Pruned))
    );

    let proof = full.generate_proof(&[b"short", b"never"]).unwrap();
    lc.add_proof(&proof).unwrap();
    assert_eq!(lc.get_value(b"short").unwrap(), Some(b"s".to_vec()));
    assert_eq!(lc.get_value(b"never").unwrap(), None);

    // Merging the same knowledge again is harmless.
    lc.add_proof(&proof).unwrap();
    assert_eq!(lc.get_value(b"short").unwrap(), Some(b"s".to_vec()));
}

#[test]
fn stale_proof_is_rejected_without_side_effects() {
    let (s, t) = (key(1), key(2));
    let (full, blocks) = full_chain(&s, &t);
    let metrics = Arc::new(LedgerMetrics::new().unwrap());

    // Proof taken two blocks before the tip.
    let mut old = Blockchain::create_empty();
    for bytes in blocks[..blocks.len() - 2].iter() {
        let block = Block::from_bytes(bytes, 1 << 20).unwrap();
        old.try_apply_block(block, Materialization::Full).unwrap();
    }
    let stale = old.generate_proof(&[b"short"]).unwrap();

    let mut lc = LightClient::create_from_block(blocks.last().unwrap(), &pk(&s), Limits::default())
        .unwrap()
        .with_metrics(metrics.clone());
    assert_eq!(lc.add_proof(&stale), Err(LedgerError::ProofInvalid));
    assert!(lc.get_value(b"short").is_err());

    assert_eq!(lc.add_proof(&[0xff, 0x01]), Err(LedgerError::ProofInvalid));
    lc.add_proof(&full.generate_proof(&[b"short"]).unwrap())
        .unwrap();

    assert_eq!(metrics.proofs_rejected_total.get(), 2);
    assert_eq!(metrics.proofs_merged_total.get(), 1);
}

#[test]
fn bad_blocks_leave_the_client_untouched() {
    let (s, t) = (key(1), key(2));
    let (_, blocks) = full_chain(&s, &t);
    let metrics = Arc::new(LedgerMetrics::new().unwrap());

    let mut lc = LightClient::create_empty(Limits::default()).with_metrics(metrics.clone());
    lc.apply_block(&blocks[0]).unwrap();

    let mut padded = blocks[1].clone();
    padded.push(0);
    assert!(matches!(lc.apply_block(&padded), Err(LedgerError::Codec(_))));
    assert!(matches!(
        lc.apply_block(&blocks[2]),
        Err(LedgerError::HeightMismatch {
            expected: 1,
            got: 2
        })
    ));
    assert_eq!(lc.height(), 0);

    lc.apply_block(&blocks[1]).unwrap();
    assert_eq!(metrics.blocks_rejected_total.get(), 2);
    assert_eq!(metrics.blocks_applied_total.get(), 2);
    assert_eq!(metrics.block_height.get(), 1);

    let text = metrics.encode_text().unwrap();
    assert!(text.contains("groupledger_blocks_rejected_total 2"));
    assert!(text.contains("groupledger_block_height 1"));
}

#[test]
fn seeding_requires_membership() {
    let (s, t) = (key(1), key(2));
    let (_, blocks) = full_chain(&s, &t);
    let stranger = key(9);
    assert!(matches!(
        LightClient::create_from_block(blocks.last().unwrap(), &pk(&stranger), Limits::default()),
        Err(LedgerError::ParticipantNotFound)
    ));
}

#[test]
fn light_client_blocks_are_accepted_by_full_replicas() {
    let (s, t) = (key(1), key(2));
    let (mut full, blocks) = full_chain(&s, &t);
    let mut lc =
        LightClient::create_from_block(blocks.last().unwrap(), &pk(&t), Limits::default())
            .unwrap();

    // No key-value writes, so no proof is needed.
    let bytes = lc
        .build_block(
            vec![Change::SetSharedKey {
                shared_key: Arc::new(GroupSharedKey {
                    ek: PublicKey::from_bytes([3u8; 32]),
                    encrypted_shared_key: b"sealed".to_vec(),
                    dest_user_id: vec![1, 2],
                    dest_header: vec![b"h1".to_vec(), b"h2".to_vec()],
                }),
            }],
            &t,
        )
        .unwrap();
    let block = Block::from_bytes(&bytes, 1 << 20).unwrap();
    full.try_apply_block(block, Materialization::Full).unwrap();
    lc.apply_block(&bytes).unwrap();
    assert_eq!(lc.shared_key(), full.shared_key());

    // Writes need the path first.
    assert!(lc
        .build_block(vec![Change::set_value("fresh", "1")], &t)
        .is_err());
    lc.add_proof(&full.generate_proof(&[b"fresh"]).unwrap())
        .unwrap();
    let bytes = lc
        .build_block(vec![Change::set_value("fresh", "1")], &t)
        .unwrap();
    let block = Block::from_bytes(&bytes, 1 << 20).unwrap();
    full.try_apply_block(block, Materialization::Full).unwrap();
    lc.apply_block(&bytes).unwrap();

    assert_eq!(full.get_value(b"fresh").unwrap(), Some(b"1".to_vec()));
    assert_eq!(lc.get_value(b"fresh").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn writes_to_unknown_paths_fall_back_to_the_declared_root() {
    let s = key(1);
    let mut full = Blockchain::create_empty();
    let mut blocks = Vec::new();
    for changes in [
        vec![Change::SetGroupState {
            group_state: GroupState::new(vec![Participant {
                user_id: 1,
                flags: PermissionFlags::ALL,
                public_key: pk(&s),
            }]),
        }],
        vec![Change::set_value("a", "1")],
        vec![Change::set_value("b", "2")],
    ] {
        let block = full.build_block(changes, &s).unwrap();
        blocks.push(block.to_bytes().unwrap());
        full.try_apply_block(block, Materialization::Full).unwrap();
    }

    let mut lc = LightClient::create_from_block(&blocks[1], &pk(&s), Limits::default()).unwrap();
    lc.apply_block(&blocks[2]).unwrap();

    let kv = lc.blockchain().state().kv();
    assert_eq!(kv.root_hash(), full.state().kv().root_hash());
    assert!(!kv.is_complete());
    assert_eq!(lc.get_value(b"a"), Err(LedgerError::Trie(TrieError::Pruned)));
    assert_eq!(lc.get_value(b"b"), Err(LedgerError::Trie(TrieError::Pruned)));

    lc.add_proof(&full.generate_proof(&[b"a"]).unwrap()).unwrap();
    assert_eq!(lc.get_value(b"a").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn declared_root_wins_over_replayed_writes() {
    let (s, t) = (key(1), key(2));
    let (mut full, blocks) = full_chain(&s, &t);

    let mut lc = LightClient::create_empty(Limits::default());
    for bytes in blocks.iter() {
        lc.apply_block(bytes).unwrap();
    }
    assert!(lc.blockchain().state().kv().is_complete());

    let declared = H256::from_bytes([5u8; 32]);
    let mut block = full.set_value(b"x", b"1", &s).unwrap();
    block.state_proof.kv_hash = declared;
    block.sign_in_place(&s).unwrap();

    // A full replica recomputes the root and refuses the block.
    assert_eq!(
        full.try_apply_block(block.clone(), Materialization::Full),
        Err(LedgerError::StateHashMismatch)
    );

    // The light client trusts the declaration and drops what it knew.
    lc.apply_block(&block.to_bytes().unwrap()).unwrap();
    let kv = lc.blockchain().state().kv();
    assert_eq!(kv.root_hash(), declared);
    assert!(!kv.is_complete());
    assert_eq!(
        lc.get_value(b"short"),
        Err(LedgerError::Trie(TrieError::Pruned))
    );
    // Cached writes survive.
    assert_eq!(lc.get_value(&SLOT).unwrap(), Some(vec![3]));
}
