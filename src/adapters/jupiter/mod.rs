//! Jupiter Adapter
//!
//! Token prices from the Jupiter Price API.

mod price;

pub use price::{JupiterPriceClient, JUPITER_PRICE_API};
