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

//! Signed, hash-linked blocks and their state proofs.

use crate::core::ledger::change::Change;
use crate::core::ledger::error::LedgerError;
use crate::core::ledger::group::{GroupSharedKeyRef, GroupStateRef};
use crate::core::ledger::signing::block_signing_bytes_v1;
use crate::core::security::keys::{self, PrivateKey};
use crate::core::types::{
    decode_canonical_limited, encode_canonical, sha256, CodecError, PublicKey, Signature, H256,
};
use serde::{Deserialize, Serialize};

/// Height of the "no block yet" sentinel.
pub const EMPTY_HEIGHT: i64 = -1;

/// Commitments accompanying a block.
///
/// `group_state` is present only when the block carries no `SetGroupState`;
/// `shared_key` only when it carries neither `SetGroupState` nor `SetSharedKey`.
/// Whatever the block's own changes install is already attested by its signature.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateProof {
    /// Key-value root after the block.
    pub kv_hash: H256,
    /// Roster after the block, if unchanged by it.
    pub group_state: Option<GroupStateRef>,
    /// Shared key after the block, if unchanged by it.
    pub shared_key: Option<GroupSharedKeyRef>,
}

/// Ledger block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Signature over [`block_signing_bytes_v1`].
    pub signature: Signature,
    /// Hash of the previous block (zero for genesis).
    pub prev_block_hash: H256,
    /// Ordered changes.
    pub changes: Vec<Change>,
    /// 0-based height, `EMPTY_HEIGHT` for the sentinel.
    pub height: i64,
    /// Post-state commitments.
    pub state_proof: StateProof,
    /// Explicit signer; when absent the group must have exactly one member.
    pub signer: Option<PublicKey>,
}

impl Default for Block {
    fn default() -> Self {
        Self::empty()
    }
}

impl Block {
    /// The sentinel preceding genesis.
    pub fn empty() -> Self {
        Self {
            signature: Signature::default(),
            prev_block_hash: H256::ZERO,
            changes: Vec::new(),
            height: EMPTY_HEIGHT,
            state_proof: StateProof::default(),
            signer: None,
        }
    }

    /// SHA-256 of the canonical encoding; zero for the sentinel.
    pub fn calc_hash(&self) -> Result<H256, CodecError> {
        if self.height == EMPTY_HEIGHT {
            return Ok(H256::ZERO);
        }
        Ok(sha256(&self.to_bytes()?))
    }

    /// Canonical encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode_canonical(self)
    }

    /// Decode, rejecting trailing bytes and payloads above `max`.
    pub fn from_bytes(bytes: &[u8], max: usize) -> Result<Self, CodecError> {
        decode_canonical_limited(bytes, max)
    }

    /// Sign with `key`, replacing any existing signature.
    pub fn sign_in_place(&mut self, key: &PrivateKey) -> Result<(), LedgerError> {
        let msg = block_signing_bytes_v1(self)?;
        self.signature = key.sign(&msg)?;
        Ok(())
    }

    /// Verify the signature against `public_key`.
    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<(), LedgerError> {
        let msg = block_signing_bytes_v1(self)?;
        keys::verify(public_key, &msg, &self.signature).map_err(|_| LedgerError::SignatureInvalid)
    }
}
