mod evm;
mod msg;
mod signer;

use crate::{
    coin::{Coin, Coins, Dec},
    config::{
        EXTENSION_OPTIONS_ETHEREUM_TX_TYPE_URL, EXTENSION_OPTIONS_WEB3_TX_TYPE_URL,
        EXTENSION_OPTION_DYNAMIC_FEE_TX_TYPE_URL,
    },
    crypto::Address,
    error::CoinError,
};

pub use evm::*;
pub use msg::*;
pub use signer::*;

/// Fee declared by a transaction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fee {
    pub amount: Coins,
    pub gas_limit: u64,
    // Explicit fee payer, defaults to the first signer
    pub payer: Option<Address>,
}

/// Extension options carried by the transaction body.
/// The first option decides which admission chain handles the transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtensionOption {
    // Marks a transaction wrapping a single MsgEthereumTx
    EthereumTx,
    // Native transaction paying an EIP-1559 style tip, None means no tip
    DynamicFeeTx { max_priority_price: Option<Dec> },
    // Native transaction signed through EIP-712 typed data
    Web3Tx {
        typed_data_chain_id: u64,
        fee_payer: Option<Address>,
    },
    Unknown { type_url: String },
}

impl ExtensionOption {
    pub fn type_url(&self) -> &str {
        match self {
            ExtensionOption::EthereumTx => EXTENSION_OPTIONS_ETHEREUM_TX_TYPE_URL,
            ExtensionOption::DynamicFeeTx { .. } => EXTENSION_OPTION_DYNAMIC_FEE_TX_TYPE_URL,
            ExtensionOption::Web3Tx { .. } => EXTENSION_OPTIONS_WEB3_TX_TYPE_URL,
            ExtensionOption::Unknown { type_url } => type_url,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    pub msgs: Vec<Msg>,
    pub fee: Fee,
    pub extension_options: Vec<ExtensionOption>,
    pub memo: String,
}

impl Transaction {
    pub fn new(msgs: Vec<Msg>, fee: Fee) -> Self {
        Self {
            msgs,
            fee,
            extension_options: Vec::new(),
            memo: String::new(),
        }
    }

    /// Wrap a signed EVM message into a transaction whose fee matches the
    /// message, denominated in the extended denom
    pub fn from_evm_msg(msg: MsgEthereumTx, extended_denom: &str) -> Result<Self, CoinError> {
        let fee = msg.data.fee().ok_or(CoinError::Overflow)?;
        let gas_limit = msg.data.gas();
        Ok(Self {
            msgs: vec![Msg::EthereumTx(msg)],
            fee: Fee {
                amount: Coins::from(Coin::new(extended_denom, fee)),
                gas_limit,
                payer: None,
            },
            extension_options: vec![ExtensionOption::EthereumTx],
            memo: String::new(),
        })
    }

    pub fn with_extension_option(mut self, option: ExtensionOption) -> Self {
        self.extension_options.push(option);
        self
    }

    pub fn gas(&self) -> u64 {
        self.fee.gas_limit
    }

    pub fn fee_payer(&self) -> Option<Address> {
        self.fee
            .payer
            .or_else(|| self.msgs.first().and_then(Msg::signer))
    }

    /// Max priority price of the first dynamic fee extension option.
    /// Outer None: no such option, inner None: option without a value
    pub fn max_priority_price(&self) -> Option<Option<Dec>> {
        self.extension_options.iter().find_map(|option| match option {
            ExtensionOption::DynamicFeeTx { max_priority_price } => Some(*max_priority_price),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    #[test]
    fn test_fee_payer() {
        let from = Address::new([1; 20]);
        let payer = Address::new([2; 20]);
        let msg = Msg::Send(MsgSend {
            from_address: from,
            to_address: Address::zero(),
            amount: Coins::empty(),
        });

        let mut tx = Transaction::new(vec![msg], Fee::default());
        assert_eq!(tx.fee_payer(), Some(from));

        tx.fee.payer = Some(payer);
        assert_eq!(tx.fee_payer(), Some(payer));
    }

    #[test]
    fn test_max_priority_price() {
        let tx = Transaction::default();
        assert_eq!(tx.max_priority_price(), None);

        let tx = Transaction::default().with_extension_option(ExtensionOption::DynamicFeeTx {
            max_priority_price: None,
        });
        assert_eq!(tx.max_priority_price(), Some(None));
    }

    #[test]
    fn test_from_evm_msg() {
        let msg = MsgEthereumTx {
            data: EvmTxData::Legacy(LegacyTx {
                chain_id: Some(1),
                nonce: 0,
                gas_price: U256::from(2),
                gas: 50,
                to: None,
                value: U256::zero(),
                data: Vec::new(),
            }),
            signature: crate::crypto::EvmSignature {
                recovery_id: 0,
                r: [1; 32],
                s: [1; 32],
            },
            from: None,
        };

        let tx = Transaction::from_evm_msg(msg, "azena").unwrap();
        assert_eq!(tx.gas(), 50);
        assert_eq!(tx.fee.amount.amount_of("azena"), U256::from(100));
        assert_eq!(tx.extension_options, vec![ExtensionOption::EthereumTx]);
    }
}
