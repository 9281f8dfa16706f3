use primitive_types::U256;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, Secp256k1,
};
use thiserror::Error;

use super::{Address, Hash};

pub use secp256k1::SecretKey;

// Half of the secp256k1 group order, upper bound of `s` for homestead signatures
const SECP256K1_HALF_N: &str = "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("invalid recovery id {0}")]
    RecoveryId(u8),
    #[error("invalid legacy v value {0}")]
    LegacyV(u64),
    #[error("invalid signature values")]
    Values,
    #[error("invalid message hash")]
    Message,
    #[error("public key recovery failed")]
    Recovery,
}

/// Recoverable secp256k1 signature as carried by EVM transactions.
///
/// `recovery_id` is the raw parity (0 or 1), legacy `v` values carry the
/// chain id on top of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvmSignature {
    pub recovery_id: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl EvmSignature {
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.recovery_id;
        bytes
    }

    /// `v` of a legacy transaction: `chain_id * 2 + 35 + parity` when
    /// replay protected, `27 + parity` otherwise
    pub fn legacy_v(&self, chain_id: Option<u64>) -> u64 {
        let parity = self.recovery_id as u64;
        match chain_id {
            Some(chain_id) => chain_id.saturating_mul(2).saturating_add(35 + parity),
            None => 27 + parity,
        }
    }

    /// Split a legacy `v` into the signature parity and the chain id it
    /// protects, if any
    pub fn from_legacy_v(v: u64, r: [u8; 32], s: [u8; 32]) -> Result<(Self, Option<u64>), SignatureError> {
        let (recovery_id, chain_id) = match v {
            27 | 28 => (v - 27, None),
            35.. => ((v - 35) % 2, Some((v - 35) / 2)),
            _ => return Err(SignatureError::LegacyV(v)),
        };

        Ok((
            EvmSignature {
                recovery_id: recovery_id as u8,
                r,
                s,
            },
            chain_id,
        ))
    }

    // r and s must be in range and s must be in the lower half of the curve order
    pub fn validate_values(&self) -> Result<(), SignatureError> {
        let r = U256::from_big_endian(&self.r);
        let s = U256::from_big_endian(&self.s);
        let half_n = U256::from_str_radix(SECP256K1_HALF_N, 16).map_err(|_| SignatureError::Values)?;

        if r.is_zero() || s.is_zero() || s > half_n || self.recovery_id > 1 {
            return Err(SignatureError::Values);
        }
        Ok(())
    }
}

pub fn sign_hash(hash: &Hash, key: &SecretKey) -> Result<EvmSignature, SignatureError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(hash.as_bytes()).map_err(|_| SignatureError::Message)?;
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&message, key)
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    Ok(EvmSignature {
        recovery_id: recovery_id.to_i32() as u8,
        r,
        s,
    })
}

pub fn recover_signer(hash: &Hash, signature: &EvmSignature) -> Result<Address, SignatureError> {
    signature.validate_values()?;

    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(hash.as_bytes()).map_err(|_| SignatureError::Message)?;
    let recovery_id = RecoveryId::from_i32(signature.recovery_id as i32)
        .map_err(|_| SignatureError::RecoveryId(signature.recovery_id))?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);
    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
        .map_err(|_| SignatureError::Values)?;

    let public_key = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|_| SignatureError::Recovery)?;

    Ok(address_of_public_key(&public_key))
}

pub fn address_of_public_key(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&uncompressed[1..]);
    Address::from_public_key_bytes(&bytes)
}

pub fn address_of_secret_key(key: &SecretKey) -> Address {
    let secp = Secp256k1::new();
    address_of_public_key(&PublicKey::from_secret_key(&secp, key))
}
