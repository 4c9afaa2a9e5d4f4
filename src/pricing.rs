//! External market-price lookups used to value a collection.

use crate::error::Result;

/// A single market quote. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketQuote {
    pub price: Option<f64>,
    pub currency: Option<String>,
}

impl MarketQuote {
    pub fn new(price: f64, currency: impl Into<String>) -> Self {
        Self {
            price: Some(price),
            currency: Some(currency.into()),
        }
    }
}

/// Source of current market prices, keyed by catalog id and condition.
pub trait PriceSource: Send + Sync {
    fn market_price(&self, catalog_id: &str, condition: &str) -> Result<MarketQuote>;
}

impl<F> PriceSource for F
where
    F: Fn(&str, &str) -> Result<MarketQuote> + Send + Sync,
{
    fn market_price(&self, catalog_id: &str, condition: &str) -> Result<MarketQuote> {
        self(catalog_id, condition)
    }
}
