use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxLegacy};
use alloy_eips::eip2930::{AccessList, AccessListItem};
use alloy_primitives::{Bytes, PrimitiveSignature, TxKind, B256};
use primitive_types::U256;

use super::SignerError;
use crate::{
    coin::u256_to_be_bytes,
    config::{
        INIT_CODE_WORD_GAS, TX_ACCESS_LIST_ADDRESS_GAS, TX_ACCESS_LIST_STORAGE_KEY_GAS, TX_DATA_NON_ZERO_GAS_EIP2028,
        TX_DATA_NON_ZERO_GAS_FRONTIER, TX_DATA_ZERO_GAS, TX_GAS, TX_GAS_CONTRACT_CREATION,
    },
    crypto::{Address, EvmSignature, Hash},
    params::Rules,
};

pub const LEGACY_TX_TYPE: u8 = 0;
pub const ACCESS_LIST_TX_TYPE: u8 = 1;
pub const DYNAMIC_FEE_TX_TYPE: u8 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessTuple {
    pub address: Address,
    pub storage_keys: Vec<Hash>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTx {
    // None for transactions signed without replay protection
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessListTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: Vec<AccessTuple>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicFeeTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_tip_cap: U256,
    pub gas_fee_cap: U256,
    pub gas: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: Vec<AccessTuple>,
}

/// Payload of an EVM transaction, one variant per envelope type
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvmTxData {
    Legacy(LegacyTx),
    AccessList(AccessListTx),
    DynamicFee(DynamicFeeTx),
}

impl EvmTxData {
    pub fn tx_type(&self) -> u8 {
        match self {
            EvmTxData::Legacy(_) => LEGACY_TX_TYPE,
            EvmTxData::AccessList(_) => ACCESS_LIST_TX_TYPE,
            EvmTxData::DynamicFee(_) => DYNAMIC_FEE_TX_TYPE,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            EvmTxData::Legacy(tx) => tx.chain_id,
            EvmTxData::AccessList(tx) => Some(tx.chain_id),
            EvmTxData::DynamicFee(tx) => Some(tx.chain_id),
        }
    }

    pub fn is_protected(&self) -> bool {
        self.chain_id().is_some()
    }

    pub fn nonce(&self) -> u64 {
        match self {
            EvmTxData::Legacy(tx) => tx.nonce,
            EvmTxData::AccessList(tx) => tx.nonce,
            EvmTxData::DynamicFee(tx) => tx.nonce,
        }
    }

    pub fn gas(&self) -> u64 {
        match self {
            EvmTxData::Legacy(tx) => tx.gas,
            EvmTxData::AccessList(tx) => tx.gas,
            EvmTxData::DynamicFee(tx) => tx.gas,
        }
    }

    pub fn to(&self) -> Option<&Address> {
        match self {
            EvmTxData::Legacy(tx) => tx.to.as_ref(),
            EvmTxData::AccessList(tx) => tx.to.as_ref(),
            EvmTxData::DynamicFee(tx) => tx.to.as_ref(),
        }
    }

    pub fn value(&self) -> U256 {
        match self {
            EvmTxData::Legacy(tx) => tx.value,
            EvmTxData::AccessList(tx) => tx.value,
            EvmTxData::DynamicFee(tx) => tx.value,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            EvmTxData::Legacy(tx) => &tx.data,
            EvmTxData::AccessList(tx) => &tx.data,
            EvmTxData::DynamicFee(tx) => &tx.data,
        }
    }

    pub fn access_list(&self) -> &[AccessTuple] {
        match self {
            EvmTxData::Legacy(_) => &[],
            EvmTxData::AccessList(tx) => &tx.access_list,
            EvmTxData::DynamicFee(tx) => &tx.access_list,
        }
    }

    // Declared price per gas: gas price for legacy envelopes, fee cap otherwise
    pub fn gas_price(&self) -> U256 {
        match self {
            EvmTxData::Legacy(tx) => tx.gas_price,
            EvmTxData::AccessList(tx) => tx.gas_price,
            EvmTxData::DynamicFee(tx) => tx.gas_fee_cap,
        }
    }

    pub fn gas_fee_cap(&self) -> U256 {
        self.gas_price()
    }

    pub fn gas_tip_cap(&self) -> U256 {
        match self {
            EvmTxData::DynamicFee(tx) => tx.gas_tip_cap,
            _ => self.gas_price(),
        }
    }

    /// Maximum fee the sender commits to: `gas_price * gas`
    pub fn fee(&self) -> Option<U256> {
        self.gas_price().checked_mul(U256::from(self.gas()))
    }

    /// Maximum amount the sender commits to: `fee + value`
    pub fn cost(&self) -> Option<U256> {
        self.fee()?.checked_add(self.value())
    }

    /// Price per gas actually paid for a block with the given base fee
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        match (self, base_fee) {
            (EvmTxData::DynamicFee(tx), Some(base_fee)) => {
                match tx.gas_tip_cap.checked_add(base_fee) {
                    Some(price) => price.min(tx.gas_fee_cap),
                    None => tx.gas_fee_cap,
                }
            }
            _ => self.gas_price(),
        }
    }

    pub fn effective_fee(&self, base_fee: Option<U256>) -> Option<U256> {
        self.effective_gas_price(base_fee)
            .checked_mul(U256::from(self.gas()))
    }

    pub fn effective_cost(&self, base_fee: Option<U256>) -> Option<U256> {
        self.effective_fee(base_fee)?.checked_add(self.value())
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to().is_none()
    }

    /// Gas charged before any execution happens
    pub fn intrinsic_gas(&self, rules: &Rules) -> Option<u64> {
        let creation = self.is_contract_creation();
        let mut gas = if creation && rules.is_homestead {
            TX_GAS_CONTRACT_CREATION
        } else {
            TX_GAS
        };

        let data = self.data();
        if !data.is_empty() {
            let non_zero = data.iter().filter(|b| **b != 0).count() as u64;
            let zero = data.len() as u64 - non_zero;
            let non_zero_gas = if rules.is_istanbul {
                TX_DATA_NON_ZERO_GAS_EIP2028
            } else {
                TX_DATA_NON_ZERO_GAS_FRONTIER
            };

            gas = gas.checked_add(non_zero.checked_mul(non_zero_gas)?)?;
            gas = gas.checked_add(zero.checked_mul(TX_DATA_ZERO_GAS)?)?;

            if creation && rules.is_shanghai {
                let words = (data.len() as u64 + 31) / 32;
                gas = gas.checked_add(words.checked_mul(INIT_CODE_WORD_GAS)?)?;
            }
        }

        for tuple in self.access_list() {
            gas = gas.checked_add(TX_ACCESS_LIST_ADDRESS_GAS)?;
            gas = gas.checked_add(
                (tuple.storage_keys.len() as u64).checked_mul(TX_ACCESS_LIST_STORAGE_KEY_GAS)?,
            )?;
        }

        Some(gas)
    }

    // Consensus form of the payload, fee fields are 128 bits on the wire
    fn envelope(&self) -> Result<Envelope, SignerError> {
        let envelope = match self {
            EvmTxData::Legacy(tx) => Envelope::Legacy(TxLegacy {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_price: fee_field(&tx.gas_price, "gas price")?,
                gas_limit: tx.gas,
                to: tx_kind(tx.to.as_ref()),
                value: eth_u256(&tx.value),
                input: Bytes::copy_from_slice(&tx.data),
            }),
            EvmTxData::AccessList(tx) => Envelope::AccessList(TxEip2930 {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_price: fee_field(&tx.gas_price, "gas price")?,
                gas_limit: tx.gas,
                to: tx_kind(tx.to.as_ref()),
                value: eth_u256(&tx.value),
                access_list: access_list(&tx.access_list),
                input: Bytes::copy_from_slice(&tx.data),
            }),
            EvmTxData::DynamicFee(tx) => Envelope::DynamicFee(TxEip1559 {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
                gas_limit: tx.gas,
                max_fee_per_gas: fee_field(&tx.gas_fee_cap, "max fee per gas")?,
                max_priority_fee_per_gas: fee_field(&tx.gas_tip_cap, "max priority fee per gas")?,
                to: tx_kind(tx.to.as_ref()),
                value: eth_u256(&tx.value),
                access_list: access_list(&tx.access_list),
                input: Bytes::copy_from_slice(&tx.data),
            }),
        };
        Ok(envelope)
    }

    /// Hash the sender signs: keccak of the RLP payload, EIP-155 encoded
    /// for protected legacy transactions and prefixed by the envelope type
    /// for typed ones.
    pub fn signing_hash(&self) -> Result<Hash, SignerError> {
        Ok(hash_of(self.envelope()?.signature_hash()))
    }
}

enum Envelope {
    Legacy(TxLegacy),
    AccessList(TxEip2930),
    DynamicFee(TxEip1559),
}

impl Envelope {
    fn signature_hash(&self) -> B256 {
        match self {
            Envelope::Legacy(tx) => tx.signature_hash(),
            Envelope::AccessList(tx) => tx.signature_hash(),
            Envelope::DynamicFee(tx) => tx.signature_hash(),
        }
    }

    // Keccak of the signed EIP-2718 encoding
    fn tx_hash(self, signature: PrimitiveSignature) -> B256 {
        match self {
            Envelope::Legacy(tx) => *tx.into_signed(signature).hash(),
            Envelope::AccessList(tx) => *tx.into_signed(signature).hash(),
            Envelope::DynamicFee(tx) => *tx.into_signed(signature).hash(),
        }
    }
}

fn fee_field(value: &U256, name: &'static str) -> Result<u128, SignerError> {
    if value.bits() > 128 {
        return Err(SignerError::FeeOverflow(name));
    }
    Ok(value.low_u128())
}

fn eth_u256(value: &U256) -> alloy_primitives::U256 {
    alloy_primitives::U256::from_be_bytes(u256_to_be_bytes(value))
}

fn eth_address(address: &Address) -> alloy_primitives::Address {
    alloy_primitives::Address::from(*address.as_bytes())
}

fn tx_kind(to: Option<&Address>) -> TxKind {
    to.map_or(TxKind::Create, |to| TxKind::Call(eth_address(to)))
}

fn access_list(tuples: &[AccessTuple]) -> AccessList {
    AccessList(
        tuples
            .iter()
            .map(|tuple| AccessListItem {
                address: eth_address(&tuple.address),
                storage_keys: tuple
                    .storage_keys
                    .iter()
                    .map(|key| B256::from(*key.as_bytes()))
                    .collect(),
            })
            .collect(),
    )
}

fn hash_of(hash: B256) -> Hash {
    Hash::new(hash.0)
}

/// EVM transaction wrapped as a native message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgEthereumTx {
    pub data: EvmTxData,
    pub signature: EvmSignature,
    // Never set on the wire, the sender is recovered from the signature
    pub from: Option<Address>,
}

impl MsgEthereumTx {
    /// Legacy transaction as received on the wire, the chain id is taken
    /// from its `v` value
    pub fn from_legacy_vrs(mut tx: LegacyTx, v: u64, r: [u8; 32], s: [u8; 32]) -> Result<Self, SignerError> {
        let (signature, chain_id) = EvmSignature::from_legacy_v(v, r, s)?;
        tx.chain_id = chain_id;
        Ok(Self {
            data: EvmTxData::Legacy(tx),
            signature,
            from: None,
        })
    }

    /// Ethereum transaction hash
    pub fn hash(&self) -> Result<Hash, SignerError> {
        let signature = PrimitiveSignature::new(
            alloy_primitives::U256::from_be_bytes(self.signature.r),
            alloy_primitives::U256::from_be_bytes(self.signature.s),
            self.signature.recovery_id == 1,
        );
        Ok(hash_of(self.data.envelope()?.tx_hash(signature)))
    }

    /// `v` as carried on the wire: the EIP-155 value for legacy
    /// transactions, the y parity for typed ones
    pub fn v(&self) -> u64 {
        match &self.data {
            EvmTxData::Legacy(tx) => self.signature.legacy_v(tx.chain_id),
            _ => self.signature.recovery_id as u64,
        }
    }
}
