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

//! Ed25519 participant keys.
//!
//! A private key is kept as its 32-byte seed and expanded into a `ring` key pair
//! on demand. The seed is zeroized when the key is dropped.

use ring::{
    rand::{SecureRandom, SystemRandom},
    signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519},
};
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::types::{PublicKey, Signature};

/// Key errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid key encoding")]
    InvalidKey,
    #[error("crypto")]
    Crypto,
    #[error("bad signature")]
    BadSignature,
}

/// Ed25519 private key (seed form).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    seed: [u8; 32],
}

impl PrivateKey {
    /// Wrap an existing 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    /// Fresh key from the system RNG.
    pub fn generate() -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let mut seed = [0u8; 32];
        rng.fill(&mut seed).map_err(|_| KeyError::Crypto)?;
        let key = Self { seed };
        seed.zeroize();
        Ok(key)
    }

    /// Raw seed bytes, for key files.
    pub fn seed_bytes(&self) -> &[u8; 32] {
        &self.seed
    }

    fn keypair(&self) -> Result<Ed25519KeyPair, KeyError> {
        Ed25519KeyPair::from_seed_unchecked(&self.seed).map_err(|_| KeyError::InvalidKey)
    }

    /// Derive the public key.
    pub fn public_key(&self) -> Result<PublicKey, KeyError> {
        let kp = self.keypair()?;
        let mut out = [0u8; 32];
        out.copy_from_slice(kp.public_key().as_ref());
        Ok(PublicKey::from_bytes(out))
    }

    /// Sign message bytes.
    pub fn sign(&self, msg: &[u8]) -> Result<Signature, KeyError> {
        let kp = self.keypair()?;
        Ok(Signature(kp.sign(msg).as_ref().to_vec()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Verify `sig` over `msg` against a raw public key.
pub fn verify(public_key: &PublicKey, msg: &[u8], sig: &Signature) -> Result<(), KeyError> {
    // ring requires signature length 64 for Ed25519
    if sig.0.len() != 64 {
        return Err(KeyError::BadSignature);
    }
    let pk = UnparsedPublicKey::new(&ED25519, public_key.as_bytes());
    pk.verify(msg, &sig.0).map_err(|_| KeyError::BadSignature)
}
