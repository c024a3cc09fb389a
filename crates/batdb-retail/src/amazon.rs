//! Client for the Amazon Product Advertising API.
//!
//! Wraps `reqwest` with typed response deserialization, per-request rate
//! gating, and backoff retries. Request signing and credential plumbing sit
//! in the deployment proxy, not here; the client carries the partner tag in
//! the request payload the way the API expects.

use std::time::Duration;

use batdb_core::{AppConfig, CatalogModel, RawListing};
use reqwest::{Client, StatusCode, Url};
use serde_json::json;

use crate::error::RetailError;
use crate::rate_limit::{retry_with_backoff, RequestGate};
use crate::types::{
    GetItemsResponse, GetVariationsResponse, Item, ListingMeta, SearchItemsResponse,
};

const DEFAULT_BASE_URL: &str = "https://webservices.amazon.com";
const MARKETPLACE: &str = "www.amazon.com";

/// Resources requested on every call.
const RESOURCES: [&str; 6] = [
    "ItemInfo.Title",
    "ItemInfo.Features",
    "Offers.Listings.Price",
    "Offers.Listings.Availability",
    "Images.Primary.Large",
    "CustomerReviews.StarRating",
];

/// Pagination guard for variation listings.
const MAX_VARIATION_PAGES: u32 = 5;

#[derive(Debug, Clone)]
pub struct AmazonClientConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub partner_tag: Option<String>,
    pub min_request_interval_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

impl AmazonClientConfig {
    #[must_use]
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            timeout_secs: cfg.retail_request_timeout_secs,
            user_agent: cfg.retail_user_agent.clone(),
            partner_tag: cfg.amazon_partner_tag.clone(),
            min_request_interval_ms: cfg.retail_min_request_interval_ms,
            max_retries: cfg.retail_max_retries,
            retry_backoff_base_secs: cfg.retail_retry_backoff_base_secs,
        }
    }
}

/// A keyword query for one catalog model, paired with the confidence that a
/// hit actually is that model. Queries are tried most-specific first.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    pub keywords: String,
    pub confidence: u32,
}

/// Client for the product-catalog API.
///
/// Use [`AmazonClient::new`] for production or
/// [`AmazonClient::with_base_url`] to point at a mock server in tests.
pub struct AmazonClient {
    client: Client,
    base_url: Url,
    partner_tag: Option<String>,
    gate: RequestGate,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl AmazonClient {
    /// Creates a client pointed at the production API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RetailError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &AmazonClientConfig) -> Result<Self, RetailError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RetailError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RetailError::ApiError`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(config: &AmazonClientConfig, base_url: &str) -> Result<Self, RetailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| RetailError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url,
            partner_tag: config.partner_tag.clone(),
            gate: RequestGate::new(Duration::from_millis(config.min_request_interval_ms)),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        })
    }

    /// Fetches current listings for known item identifiers.
    ///
    /// # Errors
    ///
    /// - [`RetailError::ApiError`] if the API rejects the request.
    /// - [`RetailError::Http`] / [`RetailError::UnexpectedStatus`] on
    ///   transport failures.
    /// - [`RetailError::Deserialize`] if the response shape is unexpected.
    pub async fn get_items(&self, asins: &[String]) -> Result<Vec<RawListing>, RetailError> {
        if asins.is_empty() {
            return Ok(vec![]);
        }

        let payload = self.base_payload(json!({ "ItemIds": asins }));
        let body = self.request_json("/paapi5/getitems", &payload).await?;

        let response: GetItemsResponse =
            serde_json::from_value(body).map_err(|e| RetailError::Deserialize {
                context: format!("getItems({})", asins.join(",")),
                source: e,
            })?;
        Self::check_api_errors(&response.errors)?;

        let items = response.items_result.map(|r| r.items).unwrap_or_default();
        Ok(items.into_iter().map(Item::into_listing).collect())
    }

    /// Fetches all variation listings for a seed item, following pagination
    /// and deduplicating by identifier.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`AmazonClient::get_items`].
    pub async fn get_variations(&self, seed_asin: &str) -> Result<Vec<RawListing>, RetailError> {
        let mut listings: Vec<RawListing> = Vec::new();
        let mut page = 1u32;

        loop {
            let mut payload = self.base_payload(json!({ "ASIN": seed_asin }));
            payload["ItemPage"] = json!(page);
            let body = self.request_json("/paapi5/getvariations", &payload).await?;

            let response: GetVariationsResponse =
                serde_json::from_value(body).map_err(|e| RetailError::Deserialize {
                    context: format!("getVariations({seed_asin}) page {page}"),
                    source: e,
                })?;
            Self::check_api_errors(&response.errors)?;

            let Some(result) = response.variations_result else {
                break;
            };
            let page_count = result
                .variation_summary
                .as_ref()
                .and_then(|s| s.page_count)
                .unwrap_or(1);

            for item in result.items {
                let listing = item.into_listing();
                if !listings.iter().any(|l| l.id == listing.id) {
                    listings.push(listing);
                }
            }

            if page >= page_count.min(MAX_VARIATION_PAGES) {
                break;
            }
            page += 1;
        }

        tracing::debug!(seed_asin, count = listings.len(), "variation discovery");
        Ok(listings)
    }

    /// Keyword search, scoped to new items.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`AmazonClient::get_items`].
    pub async fn search_items(&self, keywords: &str) -> Result<Vec<RawListing>, RetailError> {
        let mut payload = self.base_payload(json!({ "Keywords": keywords }));
        payload["SearchIndex"] = json!("SportingGoods");
        payload["ItemCount"] = json!(10);

        let body = self.request_json("/paapi5/searchitems", &payload).await?;

        let response: SearchItemsResponse =
            serde_json::from_value(body).map_err(|e| RetailError::Deserialize {
                context: format!("searchItems({keywords})"),
                source: e,
            })?;
        Self::check_api_errors(&response.errors)?;

        let items = response.search_result.map(|r| r.items).unwrap_or_default();
        Ok(items.into_iter().map(Item::into_listing).collect())
    }

    /// Fetches the enrichment metadata for a single item.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`AmazonClient::get_items`].
    pub async fn get_item_metadata(&self, asin: &str) -> Result<Option<ListingMeta>, RetailError> {
        let payload = self.base_payload(json!({ "ItemIds": [asin] }));
        let body = self.request_json("/paapi5/getitems", &payload).await?;

        let response: GetItemsResponse =
            serde_json::from_value(body).map_err(|e| RetailError::Deserialize {
                context: format!("getItems({asin})"),
                source: e,
            })?;
        Self::check_api_errors(&response.errors)?;

        Ok(response
            .items_result
            .and_then(|r| r.items.into_iter().next())
            .map(|item| item.metadata()))
    }

    /// Keyword queries for a catalog model, most-specific first.
    #[must_use]
    pub fn build_search_terms(model: &CatalogModel) -> Vec<SearchTerm> {
        vec![
            SearchTerm {
                keywords: format!(
                    "{} {} {} {} baseball bat",
                    model.brand, model.series, model.year, model.certification
                ),
                confidence: 100,
            },
            SearchTerm {
                keywords: format!(
                    "{} {} {} baseball bat",
                    model.brand, model.series, model.certification
                ),
                confidence: 85,
            },
            SearchTerm {
                keywords: format!("{} {} baseball bat", model.brand, model.series),
                confidence: 70,
            },
        ]
    }

    fn base_payload(&self, mut payload: serde_json::Value) -> serde_json::Value {
        payload["Resources"] = json!(RESOURCES);
        payload["Marketplace"] = json!(MARKETPLACE);
        payload["PartnerType"] = json!("Associates");
        if let Some(tag) = &self.partner_tag {
            payload["PartnerTag"] = json!(tag);
        }
        payload
    }

    /// POSTs a JSON payload, mapping HTTP statuses onto the error taxonomy,
    /// behind the rate gate and retry loop.
    async fn request_json(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, RetailError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| RetailError::ApiError(format!("invalid request path '{path}': {e}")))?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || async {
            self.gate.wait().await;
            let response = self.client.post(url.clone()).json(payload).send().await?;

            match response.status() {
                StatusCode::NOT_FOUND => {
                    return Err(RetailError::NotFound {
                        url: url.to_string(),
                    });
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(self.backoff_base_secs);
                    return Err(RetailError::RateLimited {
                        domain: url.host_str().unwrap_or("unknown").to_string(),
                        retry_after_secs,
                    });
                }
                status if !status.is_success() => {
                    return Err(RetailError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                _ => {}
            }

            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| RetailError::Deserialize {
                context: url.to_string(),
                source: e,
            })
        })
        .await
    }

    fn check_api_errors(errors: &[crate::types::ApiErrorEntry]) -> Result<(), RetailError> {
        if let Some(first) = errors.first() {
            // "NoResults" style codes come back alongside empty result sets
            // and are not failures.
            let code = first.code.as_deref().unwrap_or_default();
            if code.contains("NoResults") {
                return Ok(());
            }
            return Err(RetailError::ApiError(format!(
                "{code}: {}",
                first.message.as_deref().unwrap_or("unknown error")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batdb_core::Certification;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> AmazonClientConfig {
        AmazonClientConfig {
            timeout_secs: 5,
            user_agent: "batdb-test/0.1".to_string(),
            partner_tag: Some("battest-20".to_string()),
            min_request_interval_ms: 0,
            max_retries: 0,
            retry_backoff_base_secs: 0,
        }
    }

    fn item_json(asin: &str, title: &str) -> serde_json::Value {
        serde_json::json!({
            "ASIN": asin,
            "ItemInfo": { "Title": { "DisplayValue": title } },
            "Offers": {
                "Listings": [{
                    "Price": { "Amount": 199.95 },
                    "Availability": { "Message": "In Stock" }
                }]
            }
        })
    }

    #[tokio::test]
    async fn get_items_flattens_listings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paapi5/getitems"))
            .and(body_partial_json(
                serde_json::json!({ "ItemIds": ["B0AAA"], "PartnerTag": "battest-20" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ItemsResult": { "Items": [item_json("B0AAA", "DeMarini Voodoo BBCOR")] }
            })))
            .mount(&server)
            .await;

        let client = AmazonClient::with_base_url(&test_config(), &server.uri()).unwrap();
        let listings = client.get_items(&["B0AAA".to_string()]).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, "B0AAA");
        assert_eq!(listings[0].price, Some(199.95));
        assert!(listings[0].in_stock);
    }

    #[tokio::test]
    async fn get_items_empty_input_skips_request() {
        let client =
            AmazonClient::with_base_url(&test_config(), "http://127.0.0.1:9").unwrap();
        let listings = client.get_items(&[]).await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn get_variations_follows_pagination_and_dedupes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paapi5/getvariations"))
            .and(body_partial_json(serde_json::json!({ "ItemPage": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "VariationsResult": {
                    "Items": [item_json("B0AAA", "Voodoo 31\""), item_json("B0BBB", "Voodoo 32\"")],
                    "VariationSummary": { "PageCount": 2 }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/paapi5/getvariations"))
            .and(body_partial_json(serde_json::json!({ "ItemPage": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "VariationsResult": {
                    "Items": [item_json("B0BBB", "Voodoo 32\""), item_json("B0CCC", "Voodoo 33\"")],
                    "VariationSummary": { "PageCount": 2 }
                }
            })))
            .mount(&server)
            .await;

        let client = AmazonClient::with_base_url(&test_config(), &server.uri()).unwrap();
        let listings = client.get_variations("B0SEED").await.unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["B0AAA", "B0BBB", "B0CCC"]);
    }

    #[tokio::test]
    async fn api_error_surfaces_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paapi5/searchitems"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Errors": [{ "Code": "InvalidParameterValue", "Message": "bad marketplace" }]
            })))
            .mount(&server)
            .await;

        let client = AmazonClient::with_base_url(&test_config(), &server.uri()).unwrap();
        let err = client.search_items("voodoo").await.unwrap_err();
        assert!(matches!(err, RetailError::ApiError(ref m) if m.contains("InvalidParameterValue")));
    }

    #[tokio::test]
    async fn no_results_error_is_empty_not_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paapi5/searchitems"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Errors": [{ "Code": "NoResultsFound", "Message": "no items" }]
            })))
            .mount(&server)
            .await;

        let client = AmazonClient::with_base_url(&test_config(), &server.uri()).unwrap();
        let listings = client.search_items("obscure bat").await.unwrap();
        assert!(listings.is_empty());
    }

    #[tokio::test]
    async fn rate_limit_status_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/paapi5/getitems"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let client = AmazonClient::with_base_url(&test_config(), &server.uri()).unwrap();
        let err = client.get_items(&["B0AAA".to_string()]).await.unwrap_err();
        assert!(
            matches!(err, RetailError::RateLimited { retry_after_secs: 7, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn search_terms_most_specific_first() {
        let model = CatalogModel {
            brand: "DeMarini".to_string(),
            series: "Voodoo One".to_string(),
            year: 2024,
            certification: Certification::Bbcor,
            material: "Alloy".to_string(),
            construction: "1-Piece".to_string(),
            barrel_size: "2 5/8\"".to_string(),
            amazon_asin: None,
            justbats_url: None,
        };
        let terms = AmazonClient::build_search_terms(&model);
        assert_eq!(terms.len(), 3);
        assert_eq!(
            terms[0].keywords,
            "DeMarini Voodoo One 2024 BBCOR baseball bat"
        );
        assert!(terms[0].confidence > terms[1].confidence);
        assert!(terms[1].confidence > terms[2].confidence);
    }
}
