use log::{debug, trace};
use primitive_types::U256;

use super::{
    account::deduct_fees, check_block_gas_limit, check_global_fee, check_mempool_fee,
    check_tx_fee, get_msg_priority, update_cumulative_gas_wanted, AccountKeeper, AnteChain,
    AnteContext, AnteDecorator, AnteError, AnteState, CanTransferDecorator, DecoratorUtils,
    EthAccountVerificationDecorator, Event, EvmKeeper, GasWantedDecorator, BankKeeper,
};
use crate::{
    coin::{Coin, Coins},
    crypto::Address,
    params::Rules,
    transaction::{
        EvmTxData, ExtensionOption, Msg, MsgEthereumTx, SignerError, Transaction,
        DYNAMIC_FEE_TX_TYPE,
    },
};

// Event emitted for every admitted EVM transaction
pub const EVENT_TYPE_ETHEREUM_TX: &str = "ethereum_tx";
pub const ATTRIBUTE_KEY_ETHEREUM_TX_HASH: &str = "ethereumTxHash";
pub const ATTRIBUTE_KEY_TX_INDEX: &str = "txIndex";

// Fee event, shared with the native chain
pub const EVENT_TYPE_TX: &str = "tx";
pub const ATTRIBUTE_KEY_FEE: &str = "fee";
pub const ATTRIBUTE_KEY_FEE_PAYER: &str = "fee_payer";

// The single EVM message of a transaction accepted by the type decorator
pub(super) fn evm_msg<E>(tx: &Transaction) -> Result<&MsgEthereumTx, AnteError<E>> {
    match tx.msgs.as_slice() {
        [Msg::EthereumTx(msg)] => Ok(msg),
        [msg] => Err(AnteError::InvalidTransactionType(format!(
            "invalid message type {}, expected {}",
            msg.type_url(),
            crate::config::MSG_ETHEREUM_TX_TYPE_URL
        ))),
        msgs => Err(AnteError::InvalidTransactionType(format!(
            "expected 1 message, got {}",
            msgs.len()
        ))),
    }
}

pub(super) fn evm_utils<E>(ctx: &AnteContext) -> Result<&DecoratorUtils, AnteError<E>> {
    ctx.evm
        .as_ref()
        .ok_or_else(|| AnteError::Internal("EVM decorator context is not set up".to_string()))
}

fn evm_utils_mut<E>(ctx: &mut AnteContext) -> Result<&mut DecoratorUtils, AnteError<E>> {
    ctx.evm
        .as_mut()
        .ok_or_else(|| AnteError::Internal("EVM decorator context is not set up".to_string()))
}

pub(super) fn evm_sender<E>(utils: &DecoratorUtils) -> Result<Address, AnteError<E>> {
    utils
        .sender
        .ok_or_else(|| AnteError::Internal("sender of the EVM transaction is not recovered".to_string()))
}

/// Fee to deduct for an EVM transaction, in the extended denom.
///
/// In check mode the gas limit must cover the intrinsic gas. With a base
/// fee the fee cap must cover it, and the effective price is charged.
pub fn verify_fee<E>(
    data: &EvmTxData,
    denom: &str,
    base_fee: Option<U256>,
    rules: &Rules,
    is_check_tx: bool,
) -> Result<Coins, AnteError<E>> {
    let gas_limit = data.gas();
    let intrinsic_gas = data.intrinsic_gas(rules).ok_or_else(|| {
        AnteError::OutOfGas(format!(
            "failed to retrieve intrinsic gas, contract creation = {}; homestead = {}, istanbul = {}, shanghai = {}",
            data.is_contract_creation(),
            rules.is_homestead,
            rules.is_istanbul,
            rules.is_shanghai
        ))
    })?;

    if is_check_tx && gas_limit < intrinsic_gas {
        return Err(AnteError::OutOfGas(format!(
            "gas limit too low: {} (gas limit) < {} (intrinsic gas)",
            gas_limit, intrinsic_gas
        )));
    }

    if let Some(base_fee) = base_fee {
        if data.gas_fee_cap() < base_fee {
            return Err(AnteError::InsufficientFee(format!(
                "the tx gasfeecap is lower than the tx baseFee: {} (gasfeecap), {} (basefee)",
                data.gas_fee_cap(),
                base_fee
            )));
        }
    }

    let fee = data
        .effective_fee(base_fee)
        .ok_or_else(|| AnteError::InvalidCoins("fee overflows 256 bits".to_string()))?;
    Ok(Coins::from(Coin::new(denom, fee)))
}

/// Exactly one `MsgEthereumTx` under the EVM extension option
pub struct EthTxTypeDecorator;

impl<S: ?Sized, E> AnteDecorator<S, E> for EthTxTypeDecorator {
    fn name(&self) -> &'static str {
        "eth_tx_type"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        if !matches!(tx.extension_options.as_slice(), [ExtensionOption::EthereumTx]) {
            return Err(AnteError::UnknownExtensionOptions(format!(
                "for eth tx length of ExtensionOptions should be 1, got {}",
                tx.extension_options.len()
            )));
        }

        evm_msg(tx)?;
        Ok(ctx)
    }
}

/// Extracts the values shared by the rest of the chain
pub struct EthSetupContextDecorator;

impl<S, E> AnteDecorator<S, E> for EthSetupContextDecorator
where
    S: EvmKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "eth_setup_context"
    }

    fn ante_handle(
        &self,
        mut ctx: AnteContext,
        state: &mut S,
        _: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let utils = DecoratorUtils::new(&ctx, state)?;
        trace!(
            "EVM context: base fee {:?}, mempool min gas price {}, global min gas price {}",
            utils.base_fee,
            utils.mempool_min_gas_price,
            utils.global_min_gas_price
        );
        ctx.evm = Some(utils);
        Ok(ctx)
    }
}

/// Stateless checks of the message and of the fee declared around it
pub struct EthValidateBasicDecorator;

impl<S: ?Sized, E> AnteDecorator<S, E> for EthValidateBasicDecorator {
    fn name(&self) -> &'static str {
        "eth_validate_basic"
    }

    fn ante_handle(
        &self,
        mut ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let msg = evm_msg(tx)?;
        let data = &msg.data;

        if let Some(from) = msg.from {
            return Err(AnteError::InvalidRequest(format!(
                "sender address is deprecated, should be empty, got {}",
                from
            )));
        }

        if data.gas() == 0 {
            return Err(AnteError::InvalidRequest(
                "gas limit must not be zero".to_string(),
            ));
        }

        if data.gas_tip_cap() > data.gas_fee_cap() {
            return Err(AnteError::InvalidRequest(format!(
                "max priority fee per gas higher than max fee per gas ({} > {})",
                data.gas_tip_cap(),
                data.gas_fee_cap()
            )));
        }

        let extended_denom = ctx.coin_info.extended_denom.clone();
        let utils = evm_utils_mut(&mut ctx)?;
        if data.is_contract_creation() && !utils.evm_params.enable_create {
            return Err(AnteError::CreateDisabled(
                "failed to create new contract".to_string(),
            ));
        }

        if !data.is_contract_creation() && !utils.evm_params.enable_call {
            return Err(AnteError::CallDisabled("failed to call contract".to_string()));
        }

        let fee = data
            .fee()
            .ok_or_else(|| AnteError::InvalidCoins("fee overflows 256 bits".to_string()))?;
        utils.tx_gas_limit = utils.tx_gas_limit.saturating_add(data.gas());
        utils.tx_fee = utils
            .tx_fee
            .checked_add(fee)
            .ok_or_else(|| AnteError::InvalidCoins("fee overflows 256 bits".to_string()))?;

        let tx_fee = Coins::from(Coin::new(extended_denom, utils.tx_fee));
        check_tx_fee(&tx.fee, &tx_fee, utils.tx_gas_limit)?;
        Ok(ctx)
    }
}

/// Node local and chain wide minimum gas prices
pub struct EthMempoolFeeDecorator;

impl<S: ?Sized, E> AnteDecorator<S, E> for EthMempoolFeeDecorator {
    fn name(&self) -> &'static str {
        "eth_mempool_fee"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let data = &evm_msg(tx)?.data;
        let utils = evm_utils(&ctx)?;
        let gas_limit = data.gas();
        let declared_fee = data
            .fee()
            .ok_or_else(|| AnteError::InvalidCoins("fee overflows 256 bits".to_string()))?;

        if ctx.is_check_tx() && !simulate {
            check_mempool_fee(declared_fee, &utils.mempool_min_gas_price, gas_limit)?;
        }

        // Dynamic fee transactions pay the effective price of the current block
        let fee = match utils.base_fee {
            Some(base_fee) if data.tx_type() == DYNAMIC_FEE_TX_TYPE => data
                .effective_fee(Some(base_fee))
                .ok_or_else(|| AnteError::InvalidCoins("fee overflows 256 bits".to_string()))?,
            _ => declared_fee,
        };

        check_global_fee(fee, &utils.global_min_gas_price, gas_limit)?;
        Ok(ctx)
    }
}

/// Recovers the sender with the signer of the current rules
pub struct EthSigVerificationDecorator;

impl<S: ?Sized, E> AnteDecorator<S, E> for EthSigVerificationDecorator {
    fn name(&self) -> &'static str {
        "eth_sig_verification"
    }

    fn ante_handle(
        &self,
        mut ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let msg = evm_msg(tx)?;
        let utils = evm_utils_mut(&mut ctx)?;

        if !utils.evm_params.allow_unprotected_txs && !msg.data.is_protected() {
            return Err(AnteError::NotSupported(
                "rejected unprotected Ethereum transaction. Please EIP155 sign your transaction to protect it against replay-attacks".to_string(),
            ));
        }

        let sender = utils.signer.sender(msg).map_err(|e| match e {
            SignerError::InvalidChainId { .. } => AnteError::InvalidChainId(e.to_string()),
            SignerError::TxTypeNotSupported(_) => AnteError::NotSupported(e.to_string()),
            SignerError::FeeOverflow(_) => AnteError::InvalidRequest(e.to_string()),
            SignerError::Signature(_) => AnteError::InvalidSigner(format!(
                "couldn't retrieve sender address from the ethereum transaction: {}",
                e
            )),
        })?;

        debug!("recovered sender {} for EVM tx with nonce {}", sender, msg.data.nonce());
        utils.sender = Some(sender);
        Ok(ctx)
    }
}

/// The nonce must be the sequence of the sender, which is then incremented
pub struct EthNonceDecorator;

impl<S, E> AnteDecorator<S, E> for EthNonceDecorator
where
    S: AccountKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "eth_nonce"
    }

    fn ante_handle(
        &self,
        ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let msg = evm_msg(tx)?;
        let from = evm_sender(evm_utils(&ctx)?)?;

        let mut account = match state.get_account(&from).map_err(AnteError::State)? {
            Some(account) => account,
            None => state
                .new_account_with_address(&from)
                .map_err(AnteError::State)?,
        };

        let nonce = msg.data.nonce();
        if nonce != account.sequence {
            return Err(AnteError::InvalidSequence(format!(
                "invalid nonce; got {}, expected {}",
                nonce, account.sequence
            )));
        }

        account.sequence = account
            .sequence
            .checked_add(1)
            .ok_or_else(|| AnteError::InvalidSequence("nonce overflow".to_string()))?;
        state.set_account(account).map_err(AnteError::State)?;
        Ok(ctx)
    }
}

/// Charges the fee, then records the priority and the gas wanted
pub struct EthGasConsumeDecorator {
    // 0 means no cap
    pub max_tx_gas_wanted: u64,
}

impl<S, E> AnteDecorator<S, E> for EthGasConsumeDecorator
where
    S: BankKeeper<E> + ?Sized,
{
    fn name(&self) -> &'static str {
        "eth_gas_consume"
    }

    fn ante_handle(
        &self,
        mut ctx: AnteContext,
        state: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let data = &evm_msg(tx)?.data;
        let is_check_tx = ctx.is_check_tx();
        let extended_denom = ctx.coin_info.extended_denom.clone();

        let utils = evm_utils_mut(&mut ctx)?;
        let from = evm_sender(utils)?;
        utils.gas_wanted = update_cumulative_gas_wanted(
            is_check_tx,
            data.gas(),
            self.max_tx_gas_wanted,
            utils.gas_wanted,
        );
        utils.min_priority = get_msg_priority(data, utils.min_priority, utils.base_fee);

        let fees = verify_fee(data, &extended_denom, utils.base_fee, &utils.rules, is_check_tx)?;
        let (gas_wanted, min_priority) = (utils.gas_wanted, utils.min_priority);

        deduct_fees(state, &from, &fees).map_err(|e| match e {
            AnteError::InsufficientFunds(m) => AnteError::InsufficientFunds(format!(
                "failed to deduct transaction costs from user balance: {}",
                m
            )),
            e => e,
        })?;

        ctx.emit(
            Event::new(EVENT_TYPE_TX)
                .with_attribute(ATTRIBUTE_KEY_FEE, fees.to_string())
                .with_attribute(ATTRIBUTE_KEY_FEE_PAYER, from.to_string()),
        );

        check_block_gas_limit(ctx, gas_wanted, min_priority)
    }
}

/// Emits the hash and the block index of the admitted transaction
pub struct EthEmitEventDecorator;

impl<S: ?Sized, E> AnteDecorator<S, E> for EthEmitEventDecorator {
    fn name(&self) -> &'static str {
        "eth_emit_event"
    }

    fn ante_handle(
        &self,
        mut ctx: AnteContext,
        _: &mut S,
        tx: &Transaction,
        _: bool,
    ) -> Result<AnteContext, AnteError<E>> {
        let msg = evm_msg(tx)?;
        let tx_index = evm_utils(&ctx)?.block_tx_index;
        let hash = msg
            .hash()
            .map_err(|e| AnteError::InvalidRequest(e.to_string()))?;

        ctx.emit(
            Event::new(EVENT_TYPE_ETHEREUM_TX)
                .with_attribute(ATTRIBUTE_KEY_ETHEREUM_TX_HASH, hash.to_string())
                .with_attribute(ATTRIBUTE_KEY_TX_INDEX, tx_index.to_string()),
        );
        Ok(ctx)
    }
}

/// Decorators of a transaction carrying an EVM message, in order
pub fn new_evm_ante_chain<S, E>(max_tx_gas_wanted: u64) -> AnteChain<S, E>
where
    S: AnteState<E> + ?Sized,
    E: std::fmt::Display,
{
    AnteChain::new()
        .with(EthTxTypeDecorator)
        .with(EthSetupContextDecorator)
        .with(EthValidateBasicDecorator)
        .with(EthMempoolFeeDecorator)
        .with(EthSigVerificationDecorator)
        .with(EthNonceDecorator)
        .with(EthAccountVerificationDecorator)
        .with(CanTransferDecorator)
        .with(GasWantedDecorator)
        .with(EthGasConsumeDecorator { max_tx_gas_wanted })
        .with(EthEmitEventDecorator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ante::{mock::MockState, ErrorKind, ExecMode},
        coin::{Dec, DecCoins},
        config::{DEFAULT_EXTENDED_DENOM, FEE_COLLECTOR_NAME},
        crypto::{address_of_secret_key, keccak256, SecretKey},
        params::ChainConfig,
        transaction::{DynamicFeeTx, LegacyTx, Signer},
    };
    use std::str::FromStr;

    const CHAIN_ID: u64 = 9000;
    const BASE_FEE: u64 = 1_000_000_000;

    fn key() -> SecretKey {
        SecretKey::from_slice(&[7u8; 32]).unwrap()
    }

    fn chain_config() -> ChainConfig {
        ChainConfig {
            chain_id: CHAIN_ID,
            ..Default::default()
        }
    }

    fn ctx(mode: ExecMode) -> AnteContext {
        AnteContext::new(5, 100, mode)
            .with_chain_config(chain_config())
            .with_block_gas_limit(10_000_000)
    }

    fn state() -> MockState {
        MockState {
            base_fee: Some(Dec::from_u64(BASE_FEE)),
            evm_base_fee: Some(U256::from(BASE_FEE)),
            ..Default::default()
        }
    }

    fn signed(data: EvmTxData) -> Transaction {
        let rules = chain_config().rules(5, 100);
        let msg = Signer::new(&rules).sign(data, &key()).unwrap();
        Transaction::from_evm_msg(msg, DEFAULT_EXTENDED_DENOM).unwrap()
    }

    fn dynamic(nonce: u64, tip: u64, cap: u64, gas: u64, value: u64) -> EvmTxData {
        EvmTxData::DynamicFee(DynamicFeeTx {
            chain_id: CHAIN_ID,
            nonce,
            gas_tip_cap: U256::from(tip),
            gas_fee_cap: U256::from(cap),
            gas,
            to: Some(Address::new([9; 20])),
            value: U256::from(value),
            data: Vec::new(),
            access_list: Vec::new(),
        })
    }

    fn run(
        ctx: AnteContext,
        state: &mut MockState,
        tx: &Transaction,
    ) -> Result<AnteContext, AnteError<String>> {
        new_evm_ante_chain::<MockState, String>(0).run(ctx, state, tx, false)
    }

    #[test]
    fn test_evm_tx_admitted() {
        let mut state = state();
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);

        let tx = signed(dynamic(0, 2_000_000, 2 * BASE_FEE, 21_000, 5));
        let ctx = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap();

        // Effective price is base fee + tip
        let fee = (BASE_FEE + 2_000_000) * 21_000;
        assert_eq!(
            state.balance(&Address::for_module(FEE_COLLECTOR_NAME), DEFAULT_EXTENDED_DENOM),
            fee
        );
        assert_eq!(state.sequence(&sender), 1);
        assert_eq!(state.gas_wanted, 21_000);
        assert_eq!(ctx.priority, 2);
        assert_eq!(ctx.gas_wanted, 21_000);

        let fee_event = ctx.events.iter().find(|e| e.kind == EVENT_TYPE_TX).unwrap();
        assert_eq!(fee_event.attribute(ATTRIBUTE_KEY_FEE), Some(format!("{}azena", fee).as_str()));
        let eth_event = ctx
            .events
            .iter()
            .find(|e| e.kind == EVENT_TYPE_ETHEREUM_TX)
            .unwrap();
        assert_eq!(eth_event.attribute(ATTRIBUTE_KEY_TX_INDEX), Some("0"));
    }

    #[test]
    fn test_wrong_nonce() {
        let mut state = state();
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);

        let tx = signed(dynamic(3, 0, BASE_FEE, 21_000, 0));
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSequence);
        assert_eq!(err.to_string(), "invalid nonce; got 3, expected 0: invalid sequence");
    }

    #[test]
    fn test_insufficient_balance() {
        let mut state = state();
        let tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_contract_sender_rejected() {
        let mut state = state();
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);
        state.code_hashes.insert(sender, keccak256(&[0x60, 0x80]));

        let tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_fee_cap_below_base_fee() {
        let mut state = state();
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);

        let tx = signed(dynamic(0, 0, BASE_FEE - 1, 21_000, 0));
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);
    }

    #[test]
    fn test_missing_base_fee_under_london() {
        let mut state = state();
        state.evm_base_fee = None;
        let tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidBaseFee);
    }

    #[test]
    fn test_mempool_min_gas_price() {
        let mut state = state();
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);
        let prices = DecCoins::from_str(&format!("{}azena", 2 * BASE_FEE)).unwrap();

        let tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        let err = run(ctx(ExecMode::Check).with_min_gas_prices(prices.clone()), &mut state, &tx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);

        // Not enforced in block execution
        run(ctx(ExecMode::Deliver).with_min_gas_prices(prices), &mut state, &tx).unwrap();
    }

    #[test]
    fn test_global_min_gas_price() {
        let mut state = state();
        state.evm_min_gas_price = Dec::from_u64(BASE_FEE + 1);
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);

        // Fee cap above the floor, effective price below it
        let tx = signed(dynamic(0, 0, 2 * BASE_FEE, 21_000, 0));
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFee);
        assert!(err.to_string().starts_with("provided fee < minimum global fee"));
    }

    #[test]
    fn test_unprotected_tx() {
        let mut state = state();
        let data = EvmTxData::Legacy(LegacyTx {
            chain_id: None,
            nonce: 0,
            gas_price: U256::from(BASE_FEE),
            gas: 21_000,
            to: Some(Address::zero()),
            value: U256::zero(),
            data: Vec::new(),
        });
        let err = run(ctx(ExecMode::Deliver), &mut state, &signed(data)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotSupported);
    }

    #[test]
    fn test_wrong_chain_id() {
        let mut state = state();
        let other_chain = ChainConfig {
            chain_id: CHAIN_ID + 1,
            ..Default::default()
        };
        let err = run(
            ctx(ExecMode::Deliver).with_chain_config(other_chain),
            &mut state,
            &signed(dynamic(0, 0, BASE_FEE, 21_000, 0)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidChainId);
    }

    #[test]
    fn test_outer_fee_must_match() {
        let mut state = state();
        let mut tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        tx.fee.amount = Coins::from(Coin::new(DEFAULT_EXTENDED_DENOM, 1u64));
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let mut tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        tx.fee.gas_limit = 1;
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_create_disabled() {
        let mut state = state();
        state.evm_params.enable_create = false;
        let data = EvmTxData::DynamicFee(DynamicFeeTx {
            chain_id: CHAIN_ID,
            nonce: 0,
            gas_tip_cap: U256::zero(),
            gas_fee_cap: U256::from(BASE_FEE),
            gas: 100_000,
            to: None,
            value: U256::zero(),
            data: vec![0x60, 0x00],
            access_list: Vec::new(),
        });
        let err = run(ctx(ExecMode::Deliver), &mut state, &signed(data)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CreateDisabled);

        state.evm_params.enable_call = false;
        let err = run(ctx(ExecMode::Deliver), &mut state, &signed(dynamic(0, 0, BASE_FEE, 21_000, 0)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CallDisabled);
    }

    #[test]
    fn test_intrinsic_gas_in_check_mode() {
        let mut state = state();
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);

        let tx = signed(dynamic(0, 0, BASE_FEE, 20_000, 0));
        let err = run(ctx(ExecMode::Check), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfGas);
    }

    #[test]
    fn test_block_gas_limit() {
        let mut state = state();
        let sender = address_of_secret_key(&key());
        state.set_balance(&sender, DEFAULT_EXTENDED_DENOM, 100_000_000_000_000);

        let tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        let err = run(ctx(ExecMode::Deliver).with_block_gas_limit(20_000), &mut state, &tx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfGas);
    }

    #[test]
    fn test_extension_options_required() {
        let mut state = state();
        let mut tx = signed(dynamic(0, 0, BASE_FEE, 21_000, 0));
        tx.extension_options.push(ExtensionOption::EthereumTx);
        let err = run(ctx(ExecMode::Deliver), &mut state, &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownExtensionOptions);
    }

    #[test]
    fn test_verify_fee() {
        let rules = chain_config().rules(5, 100);
        let data = dynamic(0, 10, 100, 21_000, 0);
        let fees = verify_fee::<String>(&data, "azena", Some(U256::from(50)), &rules, true).unwrap();
        assert_eq!(fees.amount_of("azena"), U256::from(60 * 21_000));

        let fees = verify_fee::<String>(&dynamic(0, 0, 0, 21_000, 0), "azena", None, &rules, true)
            .unwrap();
        assert!(fees.is_empty());
    }
}
