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

//! Domain-separated signing bytes for blocks.

use crate::core::ledger::block::{Block, StateProof};
use crate::core::ledger::change::Change;
use crate::core::types::{encode_canonical, CodecError, PublicKey, H256};
use serde::Serialize;

const BLOCK_DOMAIN_V1: &[u8] = b"Groupledger-Block-v1";

/// Every block field except the signature, in wire order.
#[derive(Serialize)]
struct UnsignedBlock<'a> {
    prev_block_hash: &'a H256,
    changes: &'a [Change],
    height: i64,
    state_proof: &'a StateProof,
    signer: &'a Option<PublicKey>,
}

/// Block signing payload: domain || canonical(block without signature)
pub fn block_signing_bytes_v1(block: &Block) -> Result<Vec<u8>, CodecError> {
    let body = encode_canonical(&UnsignedBlock {
        prev_block_hash: &block.prev_block_hash,
        changes: &block.changes,
        height: block.height,
        state_proof: &block.state_proof,
        signer: &block.signer,
    })?;
    let mut out = Vec::with_capacity(BLOCK_DOMAIN_V1.len() + body.len());
    out.extend_from_slice(BLOCK_DOMAIN_V1);
    out.extend_from_slice(&body);
    Ok(out)
}
