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

//! Writes a fresh participant seed to `<dir>/participant.key` and prints the public key.

use anyhow::Result;
use groupledger::config::LogConfig;
use groupledger::core::security::keys::PrivateKey;
use groupledger::monitoring::logging::init_tracing;
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    init_tracing(&LogConfig::default())?;

    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let mut key_path = PathBuf::from(out_dir);
    std::fs::create_dir_all(&key_path)?;
    key_path.push("participant.key");

    let key = PrivateKey::generate()?;
    std::fs::write(&key_path, key.seed_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o600));
    }

    let pk = key.public_key()?;
    info!(path = %key_path.display(), "participant key written");
    println!("{}", hex::encode(pk.as_bytes()));
    Ok(())
}
