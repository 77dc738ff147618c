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

//! Core protocol primitives (types, keys, state, ledger).

/// Block validation, group permissions and the light client.
pub mod ledger;
/// Participant keys.
pub mod security;
/// Authenticated key-value state.
pub mod state;
/// Deterministic types and canonical encoding.
pub mod types;
