//! Transaction signers

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use melos_crypto::{private_key_from_hex, public_key_hex, sha3_256, sign, PrivateKey};
use melos_primitives::{Address, KeyIndex};
use zeroize::Zeroizing;

use crate::SdkError;

/// Signature produced by one account key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSignature {
    /// Signing account
    pub address: Address,
    /// Key index on that account
    pub key_index: KeyIndex,
    /// `r || s` as 128 hex digits
    pub signature: String,
}

/// Something that signs messages on behalf of one account key
#[async_trait]
pub trait Signer: Send + Sync {
    /// Account the key belongs to
    fn address(&self) -> Address;

    /// Index of the key on the account
    fn key_index(&self) -> KeyIndex;

    /// Sign a domain-tagged message
    async fn sign(&self, message: &[u8]) -> Result<CompositeSignature, SdkError>;
}

/// Signer backed by an in-memory P-256 private key.
///
/// Messages are hashed with SHA3-256 before signing.
///
/// Note: Clone is intentionally not implemented to prevent accidental key duplication.
pub struct KeySigner {
    private_key: PrivateKey,
    address: Address,
    key_index: KeyIndex,
}

impl KeySigner {
    /// Wrap an existing key
    pub fn new(address: Address, private_key: PrivateKey, key_index: KeyIndex) -> Self {
        Self {
            private_key,
            address,
            key_index,
        }
    }

    /// Create a signer from a hex-encoded private key
    ///
    /// Accepts both with and without "0x" prefix.
    pub fn from_hex(address: Address, private_key_hex: &str, key_index: KeyIndex) -> Result<Self, SdkError> {
        let private_key = private_key_from_hex(private_key_hex)?;
        Ok(Self::new(address, private_key, key_index))
    }

    /// Public key as registered on the account (128 hex digits)
    pub fn public_key_hex(&self) -> String {
        public_key_hex(self.private_key.verifying_key())
    }

    /// Sign synchronously
    pub fn sign_message(&self, message: &[u8]) -> Result<CompositeSignature, SdkError> {
        let digest = sha3_256(message);
        let signature = sign(&digest, &self.private_key)?;
        Ok(CompositeSignature {
            address: self.address,
            key_index: self.key_index,
            signature: signature.to_hex(),
        })
    }
}

#[async_trait]
impl Signer for KeySigner {
    fn address(&self) -> Address {
        self.address
    }

    fn key_index(&self) -> KeyIndex {
        self.key_index
    }

    async fn sign(&self, message: &[u8]) -> Result<CompositeSignature, SdkError> {
        self.sign_message(message)
    }
}

impl fmt::Debug for KeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySigner")
            .field("address", &self.address)
            .field("key_index", &self.key_index)
            .finish_non_exhaustive()
    }
}

/// Account address, private key and key index supplied for a role.
///
/// Converted into a [`KeySigner`] when an interaction is built; the key
/// text is wiped on drop.
pub struct AccountCredentials {
    /// Account address
    pub address: Address,
    private_key: Zeroizing<String>,
    /// Key index
    pub key_id: KeyIndex,
}

impl AccountCredentials {
    /// Bundle an address, hex private key and key index
    pub fn new(address: Address, private_key_hex: impl Into<String>, key_id: KeyIndex) -> Self {
        Self {
            address,
            private_key: Zeroizing::new(private_key_hex.into()),
            key_id,
        }
    }

    /// Build a signer from the key material
    pub fn to_signer(&self) -> Result<KeySigner, SdkError> {
        KeySigner::from_hex(self.address, &self.private_key, self.key_id)
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("address", &self.address)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// A transaction role: a ready signer or key material to build one from
#[derive(Clone)]
pub enum Role {
    /// Ready signer
    Signer(Arc<dyn Signer>),
    /// Key material, converted on build
    Key(Arc<AccountCredentials>),
}

impl Role {
    /// Account address of the role
    pub fn address(&self) -> Address {
        match self {
            Role::Signer(signer) => signer.address(),
            Role::Key(key) => key.address,
        }
    }

    /// Resolve into a signer
    pub fn into_signer(self) -> Result<Arc<dyn Signer>, SdkError> {
        match self {
            Role::Signer(signer) => Ok(signer),
            Role::Key(key) => Ok(Arc::new(key.to_signer()?)),
        }
    }
}

impl fmt::Debug for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Signer(signer) => f
                .debug_struct("Signer")
                .field("address", &signer.address())
                .field("key_index", &signer.key_index())
                .finish(),
            Role::Key(key) => fmt::Debug::fmt(&**key, f),
        }
    }
}

impl From<KeySigner> for Role {
    fn from(signer: KeySigner) -> Self {
        Role::Signer(Arc::new(signer))
    }
}

impl From<Arc<dyn Signer>> for Role {
    fn from(signer: Arc<dyn Signer>) -> Self {
        Role::Signer(signer)
    }
}

impl From<AccountCredentials> for Role {
    fn from(key: AccountCredentials) -> Self {
        Role::Key(Arc::new(key))
    }
}
