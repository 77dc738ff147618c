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

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
    #[error("text encoding")]
    Encode,
}

/// Ledger metrics container.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Registry.
    pub registry: Registry,

    /// Height of the last committed block.
    pub block_height: IntGauge,
    /// Blocks committed.
    pub blocks_applied_total: IntCounter,
    /// Blocks rejected by validation.
    pub blocks_rejected_total: IntCounter,
    /// Proofs merged into light-client knowledge.
    pub proofs_merged_total: IntCounter,
    /// Proofs rejected.
    pub proofs_rejected_total: IntCounter,
    /// Light-client cache size.
    pub cache_entries: IntGauge,
}

impl LedgerMetrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let block_height = IntGauge::new("groupledger_block_height", "Last committed block height")
            .map_err(|_| MetricsError::Prom)?;
        let blocks_applied_total =
            IntCounter::new("groupledger_blocks_applied_total", "Blocks committed")
                .map_err(|_| MetricsError::Prom)?;
        let blocks_rejected_total =
            IntCounter::new("groupledger_blocks_rejected_total", "Blocks rejected")
                .map_err(|_| MetricsError::Prom)?;
        let proofs_merged_total =
            IntCounter::new("groupledger_proofs_merged_total", "Proofs merged")
                .map_err(|_| MetricsError::Prom)?;
        let proofs_rejected_total =
            IntCounter::new("groupledger_proofs_rejected_total", "Proofs rejected")
                .map_err(|_| MetricsError::Prom)?;
        let cache_entries =
            IntGauge::new("groupledger_cache_entries", "Light-client cached values")
                .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(block_height.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(blocks_applied_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(blocks_rejected_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(proofs_merged_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(proofs_rejected_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(cache_entries.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            block_height,
            blocks_applied_total,
            blocks_rejected_total,
            proofs_merged_total,
            proofs_rejected_total,
            cache_entries,
        })
    }

    /// Record a committed block.
    pub fn on_block_applied(&self, height: i64) {
        self.block_height.set(height);
        self.blocks_applied_total.inc();
    }

    /// Record a rejected block.
    pub fn on_block_rejected(&self) {
        self.blocks_rejected_total.inc();
    }

    /// Record a proof outcome.
    pub fn on_proof(&self, accepted: bool) {
        if accepted {
            self.proofs_merged_total.inc();
        } else {
            self.proofs_rejected_total.inc();
        }
    }

    /// Prometheus text exposition of the registry.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|_| MetricsError::Encode)?;
        String::from_utf8(buf).map_err(|_| MetricsError::Encode)
    }
}
