use strum::{AsRefStr, Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, EnumIter, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    // Misc data with no specific rules
    Common,

    // {address} => {account}
    Account,
    // Integer bank balances
    // {address}{denom} => {amount}
    Balances,
    // {denom} => {total supply}
    Supply,
    // Code hash of contract accounts
    // {address} => {code_hash}
    EvmCode,
    // EVM module parameters
    EvmParams,

    // Fee market parameters and the gas wanted of the previous block
    FeeMarket,

    // Fractional balances of the precisebank ledger
    // {address} => {fractional amount}
    FractionalBalances,
    // Global remainder of the precisebank ledger
    PreciseBank,

    // Cleared at the start of every block
    Transient,
}
