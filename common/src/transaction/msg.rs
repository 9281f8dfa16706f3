use crate::{
    coin::Coins,
    config::{
        MSG_CREATE_VESTING_ACCOUNT_TYPE_URL, MSG_ETHEREUM_TX_TYPE_URL, MSG_EXEC_TYPE_URL,
        MSG_GRANT_TYPE_URL, MSG_SEND_TYPE_URL,
    },
    crypto::Address,
};

use super::MsgEthereumTx;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgSend {
    pub from_address: Address,
    pub to_address: Address,
    pub amount: Coins,
}

/// Executes `msgs` on behalf of their signers using authz grants
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgExec {
    pub grantee: Address,
    pub msgs: Vec<Msg>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authorization {
    // Allows any message of the given type URL
    Generic { msg: String },
    Send { spend_limit: Coins },
}

impl Authorization {
    /// Type URL of the messages the authorization allows
    pub fn msg_type_url(&self) -> &str {
        match self {
            Authorization::Generic { msg } => msg,
            Authorization::Send { .. } => MSG_SEND_TYPE_URL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgGrant {
    pub granter: Address,
    pub grantee: Address,
    pub authorization: Authorization,
    pub expiration: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgCreateVestingAccount {
    pub from_address: Address,
    pub to_address: Address,
    pub amount: Coins,
    pub end_time: u64,
}

/// Any message the admission pipeline does not need to inspect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnyMsg {
    pub type_url: String,
    pub signer: Address,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    EthereumTx(MsgEthereumTx),
    Send(MsgSend),
    Exec(MsgExec),
    Grant(MsgGrant),
    CreateVestingAccount(MsgCreateVestingAccount),
    Other(AnyMsg),
}

impl Msg {
    pub fn type_url(&self) -> &str {
        match self {
            Msg::EthereumTx(_) => MSG_ETHEREUM_TX_TYPE_URL,
            Msg::Send(_) => MSG_SEND_TYPE_URL,
            Msg::Exec(_) => MSG_EXEC_TYPE_URL,
            Msg::Grant(_) => MSG_GRANT_TYPE_URL,
            Msg::CreateVestingAccount(_) => MSG_CREATE_VESTING_ACCOUNT_TYPE_URL,
            Msg::Other(msg) => &msg.type_url,
        }
    }

    // First signer of the message, EVM messages are signed by their recovered sender
    pub fn signer(&self) -> Option<Address> {
        match self {
            Msg::EthereumTx(msg) => msg.from,
            Msg::Send(msg) => Some(msg.from_address),
            Msg::Exec(msg) => Some(msg.grantee),
            Msg::Grant(msg) => Some(msg.granter),
            Msg::CreateVestingAccount(msg) => Some(msg.from_address),
            Msg::Other(msg) => Some(msg.signer),
        }
    }

    pub fn as_ethereum_tx(&self) -> Option<&MsgEthereumTx> {
        match self {
            Msg::EthereumTx(msg) => Some(msg),
            _ => None,
        }
    }
}
