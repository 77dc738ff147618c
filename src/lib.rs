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

//! Groupledger - permissioned, append-only ledger for a small group of participants.
//!
//! This repository provides:
//! - Deterministic types & canonical encoding
//! - A group permission model with a rotating shared key
//! - Signed, hash-linked blocks with minimal-disclosure state proofs
//! - An authenticated key-value trie with proofs and snapshots
//! - A light client that follows the chain on root commitments
//! - Structured logging, TOML configuration and Prometheus metrics

/// Configuration.
pub mod config;
/// Core protocol primitives (types, keys, state, ledger).
pub mod core;
/// Observability (metrics, structured logging helpers).
pub mod monitoring;
