//! Key rotation: a signing key plus a set of retired keys still usable for
//! verifying historical envelopes (spec §4.2).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{CmResult, CredMeshError, ErrorKind};
use crate::provider::CryptoProvider;

/// Holds the process's active signing key plus every retired key still
/// needed to verify envelopes signed before a rotation.
pub struct KeyRegistry {
    active_key_id: String,
    providers: HashMap<String, Arc<dyn CryptoProvider>>,
}

impl KeyRegistry {
    pub fn new(active: Arc<dyn CryptoProvider>) -> Self {
        let active_key_id = active.key_id().to_string();
        let mut providers = HashMap::new();
        providers.insert(active_key_id.clone(), active);
        Self {
            active_key_id,
            providers,
        }
    }

    /// Rotates to a new signing key, retaining the previous one for
    /// verification only.
    pub fn rotate(&mut self, new_active: Arc<dyn CryptoProvider>) {
        let new_id = new_active.key_id().to_string();
        self.providers.insert(new_id.clone(), new_active);
        self.active_key_id = new_id;
    }

    pub fn active(&self) -> &Arc<dyn CryptoProvider> {
        // Safe: `active_key_id` is only ever set to a key already inserted
        // into `providers`, in `new` and `rotate`.
        self.providers
            .get(&self.active_key_id)
            .unwrap_or_else(|| unreachable!("active key_id always present"))
    }

    pub fn sign(&self, payload: &[u8]) -> CmResult<Vec<u8>> {
        self.active().sign(payload)
    }

    pub fn verify(&self, key_id: &str, payload: &[u8], signature: &[u8]) -> CmResult<bool> {
        let provider = self.providers.get(key_id).ok_or_else(|| {
            CredMeshError::new(
                ErrorKind::InputInvalid,
                format!("unknown key_id: {key_id}"),
            )
        })?;
        provider.verify(payload, signature)
    }

    pub fn active_key_id(&self) -> &str {
        &self.active_key_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Algorithm, Ed25519Provider};

    #[test]
    fn old_key_still_verifies_after_rotation() {
        let k1 = Arc::new(Ed25519Provider::generate("k1", Algorithm::EdPrimary).unwrap());
        let mut registry = KeyRegistry::new(k1.clone());
        let payload = b"episode-001";
        let sig = registry.sign(payload).unwrap();

        let k2 = Arc::new(Ed25519Provider::generate("k2", Algorithm::EdPrimary).unwrap());
        registry.rotate(k2);

        assert_eq!(registry.active_key_id(), "k2");
        assert!(registry.verify("k1", payload, &sig).unwrap());
    }

    #[test]
    fn unknown_key_id_errors() {
        let k1 = Arc::new(Ed25519Provider::generate("k1", Algorithm::EdPrimary).unwrap());
        let registry = KeyRegistry::new(k1);
        assert!(registry.verify("missing", b"x", &[0u8; 64]).is_err());
    }
}
