// Allow some clippy lints kept from the node codebase
#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::type_complexity)]

pub mod account;
pub mod ante;
pub mod coin;
pub mod config;
pub mod crypto;
pub mod error;
pub mod params;
pub mod transaction;
