pub mod nonce_service;
