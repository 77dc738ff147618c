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

//! Key-value state handle over the authenticated trie.
//!
//! Cloning is cheap: the trie is persistent, so a clone shares every node and
//! writes on the clone never show through the original.

use crate::core::state::trie::{self, Node, NodeRef, TrieError};
use crate::core::types::H256;

/// Key-value state.
#[derive(Clone, Debug)]
pub struct KeyValueState {
    root: NodeRef,
}

impl Default for KeyValueState {
    fn default() -> Self {
        Self::empty()
    }
}

impl KeyValueState {
    /// Empty state.
    pub fn empty() -> Self {
        Self { root: Node::empty() }
    }

    /// Root-only handle: usable for trusted fast-forward, not for reads or writes.
    pub fn from_root_hash(hash: H256) -> Self {
        Self {
            root: Node::pruned(hash),
        }
    }

    /// Import a full snapshot.
    pub fn from_snapshot(bytes: &[u8], max: usize) -> Result<Self, TrieError> {
        Ok(Self {
            root: trie::import_snapshot(bytes, max)?,
        })
    }

    /// Export a full snapshot. Fails on a partially known trie.
    pub fn build_snapshot(&self) -> Result<Vec<u8>, TrieError> {
        trie::export_snapshot(&self.root)
    }

    /// Get value.
    pub fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        trie::get(&self.root, key)
    }

    /// Put key/value.
    pub fn set_value(&mut self, key: &[u8], value: &[u8]) -> Result<(), TrieError> {
        self.root = trie::set(&self.root, key, value)?;
        Ok(())
    }

    /// Deterministic root commitment.
    pub fn root_hash(&self) -> H256 {
        self.root.hash()
    }

    /// True if every subtree is known locally.
    pub fn is_complete(&self) -> bool {
        self.root.is_complete()
    }

    /// Serialized proof covering `keys` (inclusion or absence).
    pub fn gen_proof(&self, keys: &[&[u8]]) -> Result<Vec<u8>, TrieError> {
        let pruned = trie::prove(&self.root, keys)?;
        trie::encode_proof(&pruned)
    }

    /// Merge a decoded proof into local knowledge. The proof must commit to the
    /// current root; on any error the handle is unchanged.
    pub fn merge_proof(&mut self, proof: &NodeRef) -> Result<(), TrieError> {
        if !proof.hash().ct_eq(&self.root.hash()) {
            return Err(TrieError::HashMismatch);
        }
        self.root = trie::merge(&self.root, proof)?;
        Ok(())
    }
}
