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

//! Authenticated binary Merkle trie.
//!
//! Keys are routed by the bits of `H(key)`, most significant bit first. A subtree
//! holding a single leaf collapses to that leaf, so the shape depends only on the
//! key set, never on insertion order.
//!
//! leaf  = H( "Groupledger-Trie-Leaf-v1" || H(key) || H(value) )
//! inner = H( "Groupledger-Trie-Node-v1" || left || right )
//! empty = ZERO
//!
//! Subtrees may be known only by hash (`Pruned`). Light clients start from a single
//! pruned root and widen their view by merging proofs, which are themselves pruned
//! trees.

use crate::core::types::{decode_canonical_limited, encode_canonical, sha256, CodecError, H256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

const LEAF_DOMAIN: &[u8] = b"Groupledger-Trie-Leaf-v1";
const NODE_DOMAIN: &[u8] = b"Groupledger-Trie-Node-v1";

/// Maximum depth of an inner node (one level per path bit).
pub const MAX_DEPTH: usize = 256;

const SNAPSHOT_VERSION: u32 = 1;

/// Trie errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TrieError {
    /// The lookup reached a subtree known only by its hash.
    #[error("subtree pruned")]
    Pruned,
    #[error("key path collision")]
    PathCollision,
    #[error("subtree hash mismatch")]
    HashMismatch,
    /// Snapshot export/import on a trie with pruned subtrees.
    #[error("trie contains pruned subtrees")]
    Incomplete,
    #[error("malformed node encoding")]
    Malformed,
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

/// Shared trie node handle.
pub type NodeRef = Arc<Node>;

/// Trie node with its cached hash.
#[derive(Debug)]
pub struct Node {
    hash: H256,
    kind: NodeKind,
}

#[derive(Debug)]
enum NodeKind {
    Empty,
    /// Known only by hash.
    Pruned,
    Leaf { key: Vec<u8>, value: Vec<u8> },
    /// Branch on one path bit; `left` is bit 0.
    Inner { left: NodeRef, right: NodeRef },
}

fn hash_leaf(key: &[u8], value: &[u8]) -> H256 {
    let hk = sha256(key);
    let hv = sha256(value);
    let mut buf = Vec::with_capacity(LEAF_DOMAIN.len() + 32 + 32);
    buf.extend_from_slice(LEAF_DOMAIN);
    buf.extend_from_slice(hk.as_bytes());
    buf.extend_from_slice(hv.as_bytes());
    sha256(&buf)
}

fn hash_node(left: &H256, right: &H256) -> H256 {
    let mut buf = Vec::with_capacity(NODE_DOMAIN.len() + 32 + 32);
    buf.extend_from_slice(NODE_DOMAIN);
    buf.extend_from_slice(left.as_bytes());
    buf.extend_from_slice(right.as_bytes());
    sha256(&buf)
}

impl Node {
    /// Empty trie.
    pub fn empty() -> NodeRef {
        Arc::new(Node {
            hash: H256::ZERO,
            kind: NodeKind::Empty,
        })
    }

    /// Subtree known only by `hash`. The zero hash is the empty trie.
    pub fn pruned(hash: H256) -> NodeRef {
        if hash.is_zero() {
            return Self::empty();
        }
        Arc::new(Node {
            hash,
            kind: NodeKind::Pruned,
        })
    }

    fn leaf(key: Vec<u8>, value: Vec<u8>) -> NodeRef {
        Arc::new(Node {
            hash: hash_leaf(&key, &value),
            kind: NodeKind::Leaf { key, value },
        })
    }

    fn inner(left: NodeRef, right: NodeRef) -> NodeRef {
        Arc::new(Node {
            hash: hash_node(&left.hash, &right.hash),
            kind: NodeKind::Inner { left, right },
        })
    }

    /// Subtree hash.
    pub fn hash(&self) -> H256 {
        self.hash
    }

    /// True if no pruned subtree remains below this node.
    pub fn is_complete(&self) -> bool {
        match &self.kind {
            NodeKind::Pruned => false,
            NodeKind::Inner { left, right } => left.is_complete() && right.is_complete(),
            NodeKind::Empty | NodeKind::Leaf { .. } => true,
        }
    }
}

fn path_of(key: &[u8]) -> H256 {
    sha256(key)
}

fn bit(path: &H256, depth: usize) -> bool {
    (path.as_bytes()[depth / 8] >> (7 - depth % 8)) & 1 == 1
}

/// Look up `key`. `Ok(None)` is a proven absence.
pub fn get(root: &NodeRef, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
    let path = path_of(key);
    let mut node = root;
    let mut depth = 0usize;
    loop {
        match &node.kind {
            NodeKind::Empty => return Ok(None),
            NodeKind::Pruned => return Err(TrieError::Pruned),
            NodeKind::Leaf { key: k, value } => {
                return Ok((k.as_slice() == key).then(|| value.clone()));
            }
            NodeKind::Inner { left, right } => {
                if depth >= MAX_DEPTH {
                    return Err(TrieError::Malformed);
                }
                node = if bit(&path, depth) { right } else { left };
                depth += 1;
            }
        }
    }
}

/// Insert or overwrite `key`, returning the new root. The old root is untouched.
pub fn set(root: &NodeRef, key: &[u8], value: &[u8]) -> Result<NodeRef, TrieError> {
    let path = path_of(key);
    set_at(root, key, &path, value, 0)
}

fn set_at(
    node: &NodeRef,
    key: &[u8],
    path: &H256,
    value: &[u8],
    depth: usize,
) -> Result<NodeRef, TrieError> {
    match &node.kind {
        NodeKind::Empty => Ok(Node::leaf(key.to_vec(), value.to_vec())),
        NodeKind::Pruned => Err(TrieError::Pruned),
        NodeKind::Leaf { key: existing, .. } => {
            let fresh = Node::leaf(key.to_vec(), value.to_vec());
            if existing.as_slice() == key {
                return Ok(fresh);
            }
            split(node.clone(), &path_of(existing), fresh, path, depth)
        }
        NodeKind::Inner { left, right } => {
            if depth >= MAX_DEPTH {
                return Err(TrieError::Malformed);
            }
            if bit(path, depth) {
                Ok(Node::inner(
                    left.clone(),
                    set_at(right, key, path, value, depth + 1)?,
                ))
            } else {
                Ok(Node::inner(
                    set_at(left, key, path, value, depth + 1)?,
                    right.clone(),
                ))
            }
        }
    }
}

/// Push two leaves down until their paths diverge.
fn split(
    a: NodeRef,
    path_a: &H256,
    b: NodeRef,
    path_b: &H256,
    depth: usize,
) -> Result<NodeRef, TrieError> {
    if depth >= MAX_DEPTH {
        return Err(TrieError::PathCollision);
    }
    match (bit(path_a, depth), bit(path_b, depth)) {
        (false, true) => Ok(Node::inner(a, b)),
        (true, false) => Ok(Node::inner(b, a)),
        (false, false) => Ok(Node::inner(
            split(a, path_a, b, path_b, depth + 1)?,
            Node::empty(),
        )),
        (true, true) => Ok(Node::inner(
            Node::empty(),
            split(a, path_a, b, path_b, depth + 1)?,
        )),
    }
}

/// Build a pruned tree revealing the lookup paths of `keys` (inclusion or exclusion).
/// Requires the paths to be fully known locally.
pub fn prove(root: &NodeRef, keys: &[&[u8]]) -> Result<NodeRef, TrieError> {
    let paths: Vec<H256> = keys.iter().map(|k| path_of(k)).collect();
    prune(root, &paths, 0)
}

fn prune(node: &NodeRef, paths: &[H256], depth: usize) -> Result<NodeRef, TrieError> {
    if paths.is_empty() {
        return Ok(match node.kind {
            NodeKind::Empty => node.clone(),
            _ => Node::pruned(node.hash),
        });
    }
    match &node.kind {
        NodeKind::Empty | NodeKind::Leaf { .. } => Ok(node.clone()),
        NodeKind::Pruned => Err(TrieError::Pruned),
        NodeKind::Inner { left, right } => {
            if depth >= MAX_DEPTH {
                return Err(TrieError::Malformed);
            }
            let (right_paths, left_paths): (Vec<H256>, Vec<H256>) =
                paths.iter().copied().partition(|p| bit(p, depth));
            Ok(Node::inner(
                prune(left, &left_paths, depth + 1)?,
                prune(right, &right_paths, depth + 1)?,
            ))
        }
    }
}

/// Union of two views of the same trie.
///
/// Both roots must carry the same hash. A pruned node yields to the other side, so
/// the result is at least as complete as either input. Any disagreement fails the
/// whole merge.
pub fn merge(a: &NodeRef, b: &NodeRef) -> Result<NodeRef, TrieError> {
    if a.hash != b.hash {
        return Err(TrieError::HashMismatch);
    }
    match (&a.kind, &b.kind) {
        (NodeKind::Pruned, _) => Ok(b.clone()),
        (_, NodeKind::Pruned) => Ok(a.clone()),
        (
            NodeKind::Inner {
                left: al,
                right: ar,
            },
            NodeKind::Inner {
                left: bl,
                right: br,
            },
        ) => Ok(Node::inner(merge(al, bl)?, merge(ar, br)?)),
        // Equal hashes over complete nodes.
        _ => Ok(a.clone()),
    }
}

/// Pre-order wire form shared by proofs and snapshots.
#[derive(Debug, Serialize, Deserialize)]
enum WireNode {
    Empty,
    Pruned(H256),
    Leaf { key: Vec<u8>, value: Vec<u8> },
    Inner,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotWire {
    version: u32,
    nodes: Vec<WireNode>,
}

fn flatten(node: &NodeRef, out: &mut Vec<WireNode>) {
    match &node.kind {
        NodeKind::Empty => out.push(WireNode::Empty),
        NodeKind::Pruned => out.push(WireNode::Pruned(node.hash)),
        NodeKind::Leaf { key, value } => out.push(WireNode::Leaf {
            key: key.clone(),
            value: value.clone(),
        }),
        NodeKind::Inner { left, right } => {
            out.push(WireNode::Inner);
            flatten(left, out);
            flatten(right, out);
        }
    }
}

fn rebuild<I>(it: &mut I, depth: usize, allow_pruned: bool) -> Result<NodeRef, TrieError>
where
    I: Iterator<Item = WireNode>,
{
    match it.next().ok_or(TrieError::Malformed)? {
        WireNode::Empty => Ok(Node::empty()),
        WireNode::Pruned(h) => {
            if !allow_pruned {
                return Err(TrieError::Incomplete);
            }
            Ok(Node::pruned(h))
        }
        WireNode::Leaf { key, value } => Ok(Node::leaf(key, value)),
        WireNode::Inner => {
            if depth >= MAX_DEPTH {
                return Err(TrieError::Malformed);
            }
            let left = rebuild(it, depth + 1, allow_pruned)?;
            let right = rebuild(it, depth + 1, allow_pruned)?;
            Ok(Node::inner(left, right))
        }
    }
}

fn rebuild_all(nodes: Vec<WireNode>, allow_pruned: bool) -> Result<NodeRef, TrieError> {
    let mut it = nodes.into_iter();
    let root = rebuild(&mut it, 0, allow_pruned)?;
    if it.next().is_some() {
        return Err(TrieError::Malformed);
    }
    Ok(root)
}

/// Serialize a (pruned) tree for transport.
pub fn encode_proof(root: &NodeRef) -> Result<Vec<u8>, TrieError> {
    let mut nodes = Vec::new();
    flatten(root, &mut nodes);
    Ok(encode_canonical(&nodes)?)
}

/// Decode a proof produced by [`encode_proof`]. Hashes are recomputed from content.
pub fn decode_proof(bytes: &[u8], max: usize) -> Result<NodeRef, TrieError> {
    let nodes: Vec<WireNode> = decode_canonical_limited(bytes, max)?;
    rebuild_all(nodes, true)
}

/// Serialize a complete trie.
pub fn export_snapshot(root: &NodeRef) -> Result<Vec<u8>, TrieError> {
    if !root.is_complete() {
        return Err(TrieError::Incomplete);
    }
    let mut nodes = Vec::new();
    flatten(root, &mut nodes);
    Ok(encode_canonical(&SnapshotWire {
        version: SNAPSHOT_VERSION,
        nodes,
    })?)
}

/// Load a snapshot produced by [`export_snapshot`].
pub fn import_snapshot(bytes: &[u8], max: usize) -> Result<NodeRef, TrieError> {
    let snap: SnapshotWire = decode_canonical_limited(bytes, max)?;
    if snap.version != SNAPSHOT_VERSION {
        return Err(TrieError::Malformed);
    }
    rebuild_all(snap.nodes, false)
}
