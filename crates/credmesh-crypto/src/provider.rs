//! Crypto Provider capability set (C2, spec §4.2).
//!
//! `{sign(payload) -> sig, verify(payload, sig, key) -> bool, key_id()}`
//! with three selectable variants: Ed25519 (primary), Ed25519 (alternate
//! key material / rotation namespace), and HMAC-SHA256 (DEMO, symmetric).
//! Selection happens once at process boot; every signed envelope records
//! `key_id` and the algorithm that produced the signature so historical
//! envelopes remain verifiable after rotation.

use crate::error::{CmResult, CredMeshError};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Which primitive produced a given signature. Two Ed25519 variants exist
/// so a node can rotate signing keys into a fresh namespace (`EdAlternate`)
/// while old `EdPrimary` key_ids remain valid for verifying historical
/// envelopes (spec §4.2 key rotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    EdPrimary,
    EdAlternate,
    HmacSha256Demo,
}

impl Algorithm {
    pub fn label(self) -> &'static str {
        match self {
            Algorithm::EdPrimary => "ed25519-primary",
            Algorithm::EdAlternate => "ed25519-alternate",
            Algorithm::HmacSha256Demo => "hmac-sha256-demo",
        }
    }
}

/// Capability set every signing key exposes.
pub trait CryptoProvider: Send + Sync {
    fn sign(&self, payload: &[u8]) -> CmResult<Vec<u8>>;
    fn verify(&self, payload: &[u8], signature: &[u8]) -> CmResult<bool>;
    fn key_id(&self) -> &str;
    fn algorithm(&self) -> Algorithm;
}

/// Ed25519 provider. Used for both `EdPrimary` and `EdAlternate` —
/// distinguished only by `key_id` namespace, since the primitive is
/// identical and importing a second Ed25519 implementation purely to have
/// two libraries would add a dependency with no behavioral difference.
pub struct Ed25519Provider {
    key_id: String,
    algorithm: Algorithm,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519Provider {
    pub fn generate(key_id: impl Into<String>, algorithm: Algorithm) -> CmResult<Self> {
        let mut csprng = rand::rngs::OsRng;
        let signing_key = SigningKey::generate(&mut csprng);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            key_id: key_id.into(),
            algorithm,
            signing_key,
            verifying_key,
        })
    }

    pub fn from_seed(
        key_id: impl Into<String>,
        algorithm: Algorithm,
        seed: &[u8; 32],
    ) -> CmResult<Self> {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            key_id: key_id.into(),
            algorithm,
            signing_key,
            verifying_key,
        })
    }

    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }
}

impl CryptoProvider for Ed25519Provider {
    fn sign(&self, payload: &[u8]) -> CmResult<Vec<u8>> {
        Ok(self.signing_key.sign(payload).to_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> CmResult<bool> {
        let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| {
            CredMeshError::new(
                credmesh_api::error::ErrorKind::InputInvalid,
                "ed25519 signature must be 64 bytes",
            )
        })?;
        let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
        // ed25519-dalek's verify is constant-time with respect to the key
        // material it compares; no additional timing hardening needed here.
        Ok(self.verifying_key.verify(payload, &sig).is_ok())
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

/// HMAC-SHA256 symmetric provider, explicitly labeled DEMO (spec §4.2): not
/// suitable for multi-party verification since signer and verifier share
/// the same secret.
pub struct HmacDemoProvider {
    key_id: String,
    secret: Zeroizing<Vec<u8>>,
}

impl HmacDemoProvider {
    pub fn new(key_id: impl Into<String>, secret: Vec<u8>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: Zeroizing::new(secret),
        }
    }
}

impl CryptoProvider for HmacDemoProvider {
    fn sign(&self, payload: &[u8]) -> CmResult<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e| {
            CredMeshError::new(
                credmesh_api::error::ErrorKind::InputInvalid,
                format!("invalid hmac key: {e}"),
            )
        })?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> CmResult<bool> {
        let expected = self.sign(payload)?;
        Ok(bool::from(expected.as_slice().ct_eq(signature)))
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::HmacSha256Demo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ed25519_roundtrip_sign_verify() {
        let provider = Ed25519Provider::generate("k1", Algorithm::EdPrimary).unwrap();
        let payload = b"hello mesh";
        let sig = provider.sign(payload).unwrap();
        assert!(provider.verify(payload, &sig).unwrap());
        assert!(!provider.verify(b"tampered", &sig).unwrap());
    }

    #[test]
    fn hmac_roundtrip_sign_verify() {
        let provider = HmacDemoProvider::new("demo-k1", b"shared-secret".to_vec());
        let payload = b"hello mesh";
        let sig = provider.sign(payload).unwrap();
        assert!(provider.verify(payload, &sig).unwrap());
        assert!(!provider.verify(b"tampered", &sig).unwrap());
    }

    #[test]
    fn hmac_rejects_wrong_length_signature_via_constant_time_compare() {
        let provider = HmacDemoProvider::new("demo-k1", b"shared-secret".to_vec());
        assert!(!provider.verify(b"hello", &[0u8; 4]).unwrap());
    }
}
