//! HTTP quote server adapter.
//!
//! Fetches `GET {base_url}/quote?symbol={SYMBOL}` and expects a JSON body
//! `{"quote": <price>}`. The legacy capitalized `Quote` field is accepted too.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::ports::{Quote, QuoteError, QuoteSourcePort};
use crate::domain::shared::{Money, Symbol};

/// Connection settings for the quote server.
#[derive(Debug, Clone)]
pub struct HttpQuoteSourceConfig {
    /// Base URL, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Quote source backed by the upstream quote server.
#[derive(Debug)]
pub struct HttpQuoteSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(alias = "Quote")]
    quote: Decimal,
}

impl HttpQuoteSource {
    /// Build the adapter and its HTTP client.
    pub fn new(config: &HttpQuoteSourceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn unavailable(symbol: &Symbol, message: impl Into<String>) -> QuoteError {
        QuoteError::Unavailable {
            symbol: symbol.clone(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl QuoteSourcePort for HttpQuoteSource {
    async fn get_quote(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        let url = format!("{}/quote", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol.as_str())])
            .send()
            .await
            .map_err(|e| Self::unavailable(symbol, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(QuoteError::SymbolNotFound {
                symbol: symbol.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::unavailable(
                symbol,
                format!("quote server returned {status}: {body}"),
            ));
        }

        let body: QuoteResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(symbol, format!("malformed response: {e}")))?;

        let price = Money::new(body.quote);
        if !price.is_positive() {
            return Err(QuoteError::InvalidPrice {
                symbol: symbol.clone(),
                price,
            });
        }

        tracing::debug!(symbol = %symbol, price = %price, "Fetched quote");
        Ok(Quote::new(symbol.clone(), price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> HttpQuoteSource {
        HttpQuoteSource::new(&HttpQuoteSourceConfig {
            base_url: format!("{}/", server.uri()),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn parses_quote_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .and(query_param("symbol", "ABC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "quote": 123.45
            })))
            .mount(&server)
            .await;

        let quote = source_for(&server)
            .get_quote(&Symbol::new("abc"))
            .await
            .unwrap();
        assert_eq!(quote.symbol, Symbol::new("ABC"));
        assert_eq!(quote.price, Money::new(dec!(123.45)));
    }

    #[tokio::test]
    async fn accepts_legacy_capitalized_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Quote": 50
            })))
            .mount(&server)
            .await;

        let quote = source_for(&server)
            .get_quote(&Symbol::new("XYZ"))
            .await
            .unwrap();
        assert_eq!(quote.price, Money::dollars(50));
    }

    #[tokio::test]
    async fn not_found_maps_to_symbol_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .get_quote(&Symbol::new("NOPE"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            QuoteError::SymbolNotFound {
                symbol: Symbol::new("NOPE")
            }
        );
    }

    #[tokio::test]
    async fn server_error_maps_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .get_quote(&Symbol::new("ABC"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::Unavailable { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn zero_price_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "quote": 0
            })))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .get_quote(&Symbol::new("ABC"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::InvalidPrice { .. }));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .get_quote(&Symbol::new("ABC"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuoteError::Unavailable { .. }));
    }
}
