use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, instrument};

use crate::core::currency::FxSource;
use crate::core::error::ValuationError;
use crate::core::price::MarketDataSource;

const PROVIDER: &str = "Alpha Vantage";

/// Alpha Vantage client for equities, crypto, precious metals and fiat FX.
///
/// Equities use `GLOBAL_QUOTE`, which returns the price in the listing
/// currency (USD for US listings). Everything else goes through
/// `CURRENCY_EXCHANGE_RATE`, with gold as `XAU` and silver as `XAG`.
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ValuationError> {
        let client = Client::builder().user_agent("networth/0.1").build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<AlphaVantageResponse, ValuationError> {
        let mut all = params.to_vec();
        all.push(("apikey", self.api_key.as_str()));
        let url = Url::parse_with_params(&format!("{}/query", self.base_url), &all)
            .map_err(|e| ValuationError::unavailable(PROVIDER, format!("invalid base url: {e}")))?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ValuationError::unavailable(PROVIDER, format!("HTTP {status}")));
        }
        let body: AlphaVantageResponse = response.json().await.map_err(|e| {
            ValuationError::unavailable(PROVIDER, format!("malformed response: {e}"))
        })?;
        debug!(?body, "Received Alpha Vantage response");

        if let Some(note) = body.note.as_ref().or(body.information.as_ref()) {
            return Err(ValuationError::unavailable(PROVIDER, note.clone()));
        }
        Ok(body)
    }

    async fn exchange_rate_for(
        &self,
        from: &str,
        to: &str,
        class: &str,
    ) -> Result<Decimal, ValuationError> {
        let body = self
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", from),
                ("to_currency", to),
            ])
            .await?;
        let unknown = || ValuationError::UnknownSymbol {
            symbol: from.to_string(),
            class: class.to_string(),
        };
        if body.error_message.is_some() {
            return Err(unknown());
        }
        let rate = body
            .exchange_rate
            .and_then(|r| r.rate)
            .ok_or_else(unknown)?;
        parse_positive(&rate, from)
    }
}

#[derive(Deserialize, Debug)]
struct AlphaVantageResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Realtime Currency Exchange Rate")]
    exchange_rate: Option<ExchangeRate>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ExchangeRate {
    #[serde(rename = "5. Exchange Rate")]
    rate: Option<String>,
}

fn parse_positive(raw: &str, symbol: &str) -> Result<Decimal, ValuationError> {
    let value = Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|e| {
            ValuationError::unavailable(PROVIDER, format!("invalid price {raw:?} for {symbol}: {e}"))
        })?;
    if value <= Decimal::ZERO {
        return Err(ValuationError::unavailable(
            PROVIDER,
            format!("non-positive price {value} for {symbol}"),
        ));
    }
    Ok(value)
}

/// Maps commodity names to their ISO 4217 metal codes.
fn metal_code(symbol: &str) -> String {
    match symbol.trim().to_uppercase().as_str() {
        "GOLD" | "XAU" => "XAU".to_string(),
        "SILVER" | "XAG" => "XAG".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl MarketDataSource for AlphaVantageClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(name = "AlphaVantageEquity", skip(self))]
    async fn equity_quote(&self, symbol: &str, currency: &str) -> Result<Decimal, ValuationError> {
        let symbol = symbol.trim().to_uppercase();
        let body = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol.as_str())])
            .await?;
        let unknown = || ValuationError::UnknownSymbol {
            symbol: symbol.clone(),
            class: "equity".to_string(),
        };
        if body.error_message.is_some() {
            return Err(unknown());
        }
        // An unknown ticker comes back as an empty "Global Quote" object.
        let price = body
            .global_quote
            .and_then(|q| q.price)
            .ok_or_else(unknown)?;
        parse_positive(&price, &symbol)
    }

    #[instrument(name = "AlphaVantageCrypto", skip(self))]
    async fn crypto_quote(&self, symbol: &str, currency: &str) -> Result<Decimal, ValuationError> {
        let symbol = symbol.trim().to_uppercase();
        self.exchange_rate_for(&symbol, currency, "crypto").await
    }

    #[instrument(name = "AlphaVantageCommodity", skip(self))]
    async fn commodity_quote(
        &self,
        symbol: &str,
        currency: &str,
    ) -> Result<Decimal, ValuationError> {
        self.exchange_rate_for(&metal_code(symbol), currency, "commodity")
            .await
    }
}

#[async_trait]
impl FxSource for AlphaVantageClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    #[instrument(name = "AlphaVantageFx", skip(self))]
    async fn exchange_rate(&self, from: &str, to: &str) -> Result<Decimal, ValuationError> {
        self.exchange_rate_for(from, to, "currency").await
    }
}
