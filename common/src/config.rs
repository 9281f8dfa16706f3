// Chain-wide constants shared by the admission pipeline, the fee market
// and the fractional balance ledger.

// Decimals of the EVM value domain
// Every EVM amount (value, gas price, base fee) is expressed with 18 decimals
pub const EVM_DECIMALS: u8 = 18;

// Default denominations of the reference chain
// The integer denom is tracked by the bank, the extended denom is the
// 18-decimal view exposed to the EVM
pub const DEFAULT_DENOM: &str = "azena";
pub const DEFAULT_EXTENDED_DENOM: &str = "azena";
pub const DEFAULT_DISPLAY_DENOM: &str = "zena";
pub const DEFAULT_DECIMALS: u8 = 18;

// Tip amount that is worth one unit of priority
// Priorities are the per gas tip divided by this value so that
// small tips do not produce huge ordering numbers
pub const DEFAULT_PRIORITY_REDUCTION: u64 = 1_000_000;

// Maximum depth of MsgExec wrappers scanned by the authz limiter
pub const MAX_NESTED_MSGS: usize = 7;

// Module accounts
pub const FEE_COLLECTOR_NAME: &str = "fee_collector";
pub const PRECISEBANK_MODULE_NAME: &str = "precisebank";
pub const MINT_MODULE_NAME: &str = "mint";
pub const FEEMARKET_MODULE_NAME: &str = "feemarket";
pub const EVM_MODULE_NAME: &str = "evm";

// Fee market defaults
// Base fee starts at 1 gwei and may move by at most 1/8 per block
// toward a target of half of the block gas limit
pub const DEFAULT_BASE_FEE: u64 = 1_000_000_000;
pub const DEFAULT_BASE_FEE_CHANGE_DENOMINATOR: u32 = 8;
pub const DEFAULT_ELASTICITY_MULTIPLIER: u32 = 2;
pub const DEFAULT_ENABLE_HEIGHT: i64 = 0;

// Default block gas limit used when consensus does not define one
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 100_000_000;

// Intrinsic gas schedule
pub const TX_GAS: u64 = 21_000;
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
pub const TX_DATA_ZERO_GAS: u64 = 4;
pub const TX_DATA_NON_ZERO_GAS_FRONTIER: u64 = 68;
pub const TX_DATA_NON_ZERO_GAS_EIP2028: u64 = 16;
pub const TX_ACCESS_LIST_ADDRESS_GAS: u64 = 2_400;
pub const TX_ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1_900;
pub const INIT_CODE_WORD_GAS: u64 = 2;

// Type URLs of the messages the pipeline needs to recognize
pub const MSG_ETHEREUM_TX_TYPE_URL: &str = "/cosmos.evm.vm.v1.MsgEthereumTx";
pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const MSG_EXEC_TYPE_URL: &str = "/cosmos.authz.v1beta1.MsgExec";
pub const MSG_GRANT_TYPE_URL: &str = "/cosmos.authz.v1beta1.MsgGrant";
pub const MSG_CREATE_VESTING_ACCOUNT_TYPE_URL: &str =
    "/cosmos.vesting.v1beta1.MsgCreateVestingAccount";

// Extension options used to route a transaction
pub const EXTENSION_OPTIONS_ETHEREUM_TX_TYPE_URL: &str = "/cosmos.evm.vm.v1.ExtensionOptionsEthereumTx";
pub const EXTENSION_OPTION_DYNAMIC_FEE_TX_TYPE_URL: &str =
    "/cosmos.evm.types.v1.ExtensionOptionDynamicFeeTx";
pub const EXTENSION_OPTIONS_WEB3_TX_TYPE_URL: &str = "/cosmos.evm.types.v1.ExtensionOptionsWeb3Tx";

// Messages that can never be granted nor executed through authz
pub const DISABLED_AUTHZ_MSGS: [&str; 2] = [
    MSG_ETHEREUM_TX_TYPE_URL,
    MSG_CREATE_VESTING_ACCOUNT_TYPE_URL,
];
