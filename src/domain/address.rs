//! Wallet address validation

use thiserror::Error;

/// Base58 alphabet (no 0, O, I, l)
const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const MIN_ADDRESS_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 44;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid wallet address: {0}")]
    InvalidFormat(String),
    #[error("Invalid wallet address length: {0} (expected 32-44 characters)")]
    InvalidLength(usize),
    #[error("Wallet address does not decode to a 32-byte public key: {0}")]
    InvalidKey(String),
}

/// Validate a Solana wallet address, returning the trimmed form.
pub fn validate_wallet_address(address: &str) -> Result<String, AddressError> {
    let address = address.trim();

    if address.len() < MIN_ADDRESS_LEN || address.len() > MAX_ADDRESS_LEN {
        return Err(AddressError::InvalidLength(address.len()));
    }

    if !address.chars().all(|c| BASE58_ALPHABET.contains(c)) {
        return Err(AddressError::InvalidFormat(address.to_string()));
    }

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|_| AddressError::InvalidFormat(address.to_string()))?;
    if bytes.len() != 32 {
        return Err(AddressError::InvalidKey(address.to_string()));
    }

    Ok(address.to_string())
}

pub fn is_valid_wallet_address(address: &str) -> bool {
    validate_wallet_address(address).is_ok()
}

/// First 8 characters followed by an ellipsis, for notification texts.
pub fn short_address(address: &str) -> String {
    let prefix: String = address.chars().take(8).collect();
    format!("{}...", prefix)
}
