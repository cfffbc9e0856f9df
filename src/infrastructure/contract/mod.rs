pub mod abi;
pub mod solvable_client;

pub use abi::ContractCall;
pub use solvable_client::{ContractClient, SolvableClient};
