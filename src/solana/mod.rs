pub mod balances;
pub mod base58;
pub mod instruction;
pub mod models;
pub mod pairing;
pub mod parser;
pub mod programs;
pub mod rpc;
