//! Storage key constants shared by the providers

pub(crate) const NEXT_ACCOUNT_NUMBER: &[u8; 4] = b"NACC";

pub(crate) const EVM_PARAMS: &[u8; 4] = b"EVMP";

pub(crate) const FEE_MARKET_PARAMS: &[u8; 4] = b"FMPR";
pub(crate) const BLOCK_GAS_WANTED: &[u8; 4] = b"BGWT";

pub(crate) const TRANSIENT_BLOCK_GAS_WANTED: &[u8; 4] = b"TGWT";

pub(crate) const REMAINDER_AMOUNT: &[u8; 4] = b"RMDR";
