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

//! Block validation errors.

use crate::core::security::keys::KeyError;
use crate::core::state::trie::TrieError;
use crate::core::types::CodecError;
use thiserror::Error;

/// Ledger errors. Every variant is fatal to the attempted operation only.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Block height is not `current + 1`, or a seed block height is negative.
    #[error("height mismatch: expected {expected}, got {got}")]
    HeightMismatch {
        /// Height the chain would accept.
        expected: i64,
        /// Height the block carries.
        got: i64,
    },
    /// Previous-block hash does not match the committed tip.
    #[error("previous block hash mismatch")]
    HashMismatch,
    /// Roster is malformed (duplicate id or key).
    #[error("invalid group state: {0}")]
    InvalidGroupState(&'static str),
    /// Signer lacks a flag the roster change needs.
    #[error("no permissions: {0}")]
    NoPermissions(&'static str),
    /// Group state presence or content in the state proof is wrong.
    #[error("invalid state proof (group): {0}")]
    InvalidStateProofGroup(&'static str),
    /// Shared key presence or content in the state proof is wrong.
    #[error("invalid state proof (shared key): {0}")]
    InvalidStateProofSecret(&'static str),
    /// Declared key-value root differs from the computed one.
    #[error("state hash mismatch")]
    StateHashMismatch,
    /// Signer is not a participant of the current roster.
    #[error("participant not found")]
    ParticipantNotFound,
    /// Signature does not verify against the signer's key.
    #[error("invalid signature")]
    SignatureInvalid,
    /// Proof is undecodable or does not commit to the current key-value root.
    #[error("invalid proof")]
    ProofInvalid,
    /// Shared key is already set or its destinations do not match the roster.
    #[error("invalid shared key: {0}")]
    InvalidSharedKey(&'static str),
    /// Encoded block exceeds the configured limit.
    #[error("block too large: {size} > {max}")]
    BlockTooLarge {
        /// Encoded size.
        size: usize,
        /// Configured limit.
        max: usize,
    },
    /// Canonical encoding failure.
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
    /// Trie access failure, e.g. a read below a pruned subtree.
    #[error("trie: {0}")]
    Trie(#[from] TrieError),
    /// Key handling failure.
    #[error("key: {0}")]
    Key(#[from] KeyError),
}
