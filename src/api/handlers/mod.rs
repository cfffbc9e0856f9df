pub mod agents;
pub mod facilitator;
pub mod health;
pub mod x402;
