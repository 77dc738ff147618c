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

//! Mutations carried by a block.

use crate::core::ledger::group::{GroupSharedKeyRef, GroupStateRef};
use serde::{Deserialize, Serialize};

/// One atomic mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// Write a value into the key-value state.
    SetValue {
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes.
        value: Vec<u8>,
    },
    /// Replace the whole roster. Clears the shared key.
    SetGroupState {
        /// New roster.
        group_state: GroupStateRef,
    },
    /// Install a shared key for the current roster.
    SetSharedKey {
        /// New key.
        shared_key: GroupSharedKeyRef,
    },
}

impl Change {
    /// Value write.
    pub fn set_value(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Change::SetValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
