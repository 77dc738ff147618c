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

//! Permissioned, hash-linked ledger over a shared group.

pub mod block;
pub mod blockchain;
pub mod change;
pub mod error;
pub mod group;
pub mod light_client;
pub mod signing;
pub mod state;

pub use block::{Block, StateProof, EMPTY_HEIGHT};
pub use blockchain::Blockchain;
pub use change::Change;
pub use error::LedgerError;
pub use group::{
    GroupSharedKey, GroupSharedKeyRef, GroupState, GroupStateRef, Participant, PermissionFlags,
};
pub use light_client::{CacheEntry, LightClient};
pub use state::{Materialization, State};
