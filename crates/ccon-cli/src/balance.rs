//! # Balance Subcommand
//!
//! Quotes an account's balance in wei and ether, and in the quote currency
//! of `CCON_PRICE_PAIR` when the price feed answers.

use anyhow::{Context, Result};
use clap::Args;
use ccon_core::Address;
use ccon_gateway::ContractGateway;
use ccon_oracle::{BalanceQuote, PriceFeed};

/// Arguments for the `ccon balance` subcommand.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// 0x-prefixed account or contract address.
    pub address: String,

    /// Skip the price lookup.
    #[arg(long)]
    pub no_usd: bool,
}

/// Print the balance of `args.address`. A missing or failing price feed
/// only drops the USD line.
pub async fn run_balance(
    args: &BalanceArgs,
    gateway: &dyn ContractGateway,
    feed: Option<&dyn PriceFeed>,
    pair: &str,
) -> Result<u8> {
    let address = Address::new(args.address.as_str()).context("invalid address")?;
    let wei = gateway
        .balance(&address)
        .await
        .with_context(|| format!("failed to read the balance of {address}"))?;

    let quote = match feed {
        Some(feed) if !args.no_usd => BalanceQuote::fetch(wei, feed, pair).await?,
        _ => BalanceQuote::new(wei, None)?,
    };
    print!("{}", format_quote(&address, &quote, pair));
    Ok(0)
}

/// Multi-line rendering of a quote.
pub fn format_quote(address: &Address, quote: &BalanceQuote, pair: &str) -> String {
    let mut out = format!(
        "{address}\n  wei:   {}\n  ether: {}\n",
        quote.wei, quote.ether
    );
    if let Some(usd) = quote.usd {
        out.push_str(&format!("  usd:   {usd:.2} ({pair})\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ccon_core::Wei;
    use ccon_gateway::SimulatedContract;
    use ccon_oracle::OracleError;
    use rust_decimal::Decimal;

    struct FixedPrice(Decimal);

    #[async_trait]
    impl PriceFeed for FixedPrice {
        async fn latest_price(&self, _pair: &str) -> Result<Decimal, OracleError> {
            Ok(self.0)
        }
    }

    #[test]
    fn quote_lines() {
        let address = Address::from_bytes([0xa0; 20]);
        let quote = BalanceQuote::new(Wei::from_ether(2), Some(Decimal::new(150050, 2))).unwrap();
        let out = format_quote(&address, &quote, "ETH-USD");
        assert!(out.contains("wei:   2000000000000000000"));
        assert!(out.contains("ether: 2\n"));
        assert!(out.contains("usd:   3001.00 (ETH-USD)"));
    }

    #[test]
    fn no_price_means_no_usd_line() {
        let address = Address::from_bytes([0xa0; 20]);
        let quote = BalanceQuote::new(Wei(5), None).unwrap();
        assert!(!format_quote(&address, &quote, "ETH-USD").contains("usd"));
    }

    #[tokio::test]
    async fn balance_of_simulated_account() {
        let sim = SimulatedContract::new();
        let account = sim.accounts().await.unwrap()[0].to_string();
        let feed = FixedPrice(Decimal::new(2000, 0));
        let args = BalanceArgs {
            address: account,
            no_usd: false,
        };
        let code = run_balance(&args, &sim, Some(&feed as &dyn PriceFeed), "ETH-USD").await.unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn malformed_address_is_an_error() {
        let sim = SimulatedContract::new();
        let args = BalanceArgs {
            address: "0x12".into(),
            no_usd: true,
        };
        assert!(run_balance(&args, &sim, None, "ETH-USD").await.is_err());
    }
}
