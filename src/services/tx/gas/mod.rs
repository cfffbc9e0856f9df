pub mod gas_service;
pub mod gas_strategy;
