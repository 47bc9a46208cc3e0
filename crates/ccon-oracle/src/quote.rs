//! Balance quotes in wei, ether and USD.

use ccon_core::Wei;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::OracleError;
use crate::price::PriceFeed;

/// Decimal places between wei and ether.
const ETHER_SCALE: u32 = 18;

/// An account balance in display units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceQuote {
    pub wei: Wei,
    /// `wei / 10^18`, exact.
    pub ether: Decimal,
    /// `ether × price`, rounded to cents. `None` when no price was available.
    pub usd: Option<Decimal>,
}

impl BalanceQuote {
    /// Quote `wei`, converting to USD at `price` when given.
    ///
    /// # Errors
    ///
    /// [`OracleError::OutOfRange`] if the balance exceeds what a decimal can
    /// hold (about 7.9 × 10^10 ether).
    pub fn new(wei: Wei, price: Option<Decimal>) -> Result<Self, OracleError> {
        let ether = i128::try_from(wei.as_u128())
            .ok()
            .and_then(|raw| Decimal::try_from_i128_with_scale(raw, ETHER_SCALE).ok())
            .ok_or(OracleError::OutOfRange(wei))?
            .normalize();
        let usd = price
            .and_then(|p| ether.checked_mul(p))
            .map(|usd| usd.round_dp(2));
        Ok(Self { wei, ether, usd })
    }

    /// Quote `wei` at the feed's latest price for `pair`. A feed failure only
    /// drops the USD figure.
    pub async fn fetch(wei: Wei, feed: &dyn PriceFeed, pair: &str) -> Result<Self, OracleError> {
        let price = match feed.latest_price(pair).await {
            Ok(price) => Some(price),
            Err(err) => {
                tracing::warn!(error = %err, pair, "price unavailable; quoting without USD");
                None
            }
        };
        Self::new(wei, price)
    }
}
