//! Signature verification capability and the default recoverable scheme
//!
//! Admission authenticates every block through a [`Verifier`], injected at
//! log-store construction. The default [`RecoverVerifier`] uses signed-message
//! style recoverable secp256k1: the signer's identity is recovered from the
//! `(message, signature)` pair and compared with the claimed identity, so
//! verification needs no out-of-band public key.

use crate::block::Identity;
use crate::error::{LogError, Result};
use bytes::Bytes;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

/// Byte length of a recoverable signature: `r || s || v`
pub const SIGNATURE_LEN: usize = 65;

/// Pluggable block-authenticity check
///
/// Implementations must fail closed: malformed input yields `false`, never a
/// panic or an error the caller could downgrade.
pub trait Verifier {
    /// Accept iff `signature` authenticates `canonical` under `claimed`'s key
    fn verify(&self, canonical: &[u8], signature: &[u8], claimed: &Identity) -> bool;
}

/// Default verifier: recoverable secp256k1 over the signed-message digest
///
/// Accepts iff the address recovered from `(canonical, signature)` equals the
/// claimed identity under case-insensitive comparison. Tampering with any
/// canonical field, or substituting a different claimed identity, flips the
/// result to `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverVerifier;

impl Verifier for RecoverVerifier {
    fn verify(&self, canonical: &[u8], signature: &[u8], claimed: &Identity) -> bool {
        match recover_signer(canonical, signature) {
            Some(recovered) => claimed.matches(recovered.as_str()),
            None => false,
        }
    }
}

/// Signing side of the default scheme
///
/// Wraps a secp256k1 secret key; its [`identity`](Keypair::identity) is the
/// address-form handle the verifier recovers.
#[derive(Clone)]
pub struct Keypair {
    secret: SigningKey,
}

impl Keypair {
    /// Generate a fresh random keypair
    pub fn generate() -> Self {
        Self {
            secret: SigningKey::random(&mut rand_core::OsRng),
        }
    }

    /// Load a keypair from a 32-byte secret scalar
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        SigningKey::from_slice(bytes)
            .map(|secret| Self { secret })
            .map_err(|e| LogError::InvalidKey(e.to_string()))
    }

    /// The 32-byte secret scalar
    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes().into()
    }

    /// The identity this keypair signs as
    pub fn identity(&self) -> Identity {
        address_of(self.secret.verifying_key())
    }

    /// Produce a 65-byte `r || s || v` recoverable signature over `message`
    ///
    /// `v` is the legacy offset encoding (27 or 28).
    pub fn sign(&self, message: &[u8]) -> Result<Bytes> {
        let digest = signed_message_digest(message);
        let (sig, recovery) = self
            .secret
            .sign_prehash_recoverable(&digest)
            .map_err(LogError::crypto)?;

        // Recovery ids 2 and 3 (reduced r) have no encoding in the one-byte
        // v scheme and would never verify; refuse to emit them.
        if recovery.to_byte() > 1 {
            return Err(LogError::Crypto(
                "signature recovery id out of range for r || s || v encoding".into(),
            ));
        }

        let mut out = Vec::with_capacity(SIGNATURE_LEN);
        out.extend_from_slice(&sig.to_bytes());
        out.push(recovery.to_byte() + 27);
        Ok(Bytes::from(out))
    }
}

/// Keccak-256 digest of the personal-message envelope (EIP-191):
/// `"\x19Ethereum Signed Message:\n" || len(message) || message`
fn signed_message_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Recover the signer's identity from a signed message, `None` on any
/// malformed input
fn recover_signer(message: &[u8], signature: &[u8]) -> Option<Identity> {
    if signature.len() != SIGNATURE_LEN {
        return None;
    }
    let recovery = parse_recovery_byte(signature[64])?;
    let sig = Signature::from_slice(&signature[..64]).ok()?;
    let digest = signed_message_digest(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery).ok()?;
    Some(address_of(&key))
}

/// Accept both raw (0/1) and legacy offset (27/28) recovery encodings
fn parse_recovery_byte(v: u8) -> Option<RecoveryId> {
    let raw = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return None,
    };
    RecoveryId::from_byte(raw)
}

/// Address of a verifying key: keccak-256 of the uncompressed point without
/// its `0x04` prefix, last 20 bytes, 0x-prefixed lowercase hex
fn address_of(key: &VerifyingKey) -> Identity {
    let point = key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    Identity::new(format!("0x{}", hex::encode(&digest[12..])))
}
