pub mod ante_handler;
pub mod bank;
pub mod error;
pub mod feemarket;
pub mod genesis;
pub mod precisebank;
pub mod state;
pub mod storage;
