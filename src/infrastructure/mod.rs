pub mod contract;
pub mod parser;
pub mod provider;
