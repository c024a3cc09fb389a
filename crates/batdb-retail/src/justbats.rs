//! Product-page scraper for the JustBats storefront.
//!
//! Size options live in radio-button widgets with a size label span and an
//! optional per-option price span. Pages for single-size products carry one
//! main price instead, which then applies to every option. Parsing is pure
//! (`parse_product_page` takes the HTML string); the client only fetches.

use std::time::Duration;

use regex::Regex;
use reqwest::{Client, StatusCode};

use crate::error::RetailError;
use crate::rate_limit::{retry_with_backoff, RequestGate};

/// One purchasable size option on a product page.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeOption {
    /// Raw size label, e.g. `32" 29 oz`.
    pub text: String,
    pub price: Option<f64>,
    pub in_stock: bool,
}

/// Everything extracted from one product page.
#[derive(Debug, Clone, Default)]
pub struct ProductPage {
    pub title: Option<String>,
    pub model_number: Option<String>,
    pub swing_weight: Option<String>,
    pub image_url: Option<String>,
    pub discontinued: bool,
    pub options: Vec<SizeOption>,
}

/// Parses a product page into its size options and metadata.
///
/// Used and refurbished condition options are dropped. When the page is
/// marked discontinued every option is reported out of stock regardless of
/// its own state.
#[must_use]
pub fn parse_product_page(html: &str) -> ProductPage {
    let discontinued = html.to_lowercase().contains("discontinued");

    let mut options = extract_size_options(html);
    if let Some(main_price) = extract_main_price(html) {
        for option in &mut options {
            if option.price.is_none() {
                option.price = Some(main_price);
            }
        }
    }
    if discontinued {
        for option in &mut options {
            option.in_stock = false;
        }
    }

    ProductPage {
        title: extract_title(html),
        model_number: extract_model_number(html),
        swing_weight: extract_swing_weight(html),
        image_url: extract_image_url(html),
        discontinued,
        options,
    }
}

fn extract_size_options(html: &str) -> Vec<SizeOption> {
    // Each option is a radio-wrapper block; capture up to the closing tag of
    // the block so the inner spans stay scoped to one option.
    let block_re = Regex::new(
        r#"(?is)<(?:div|label)[^>]*class="[^"]*radio-wrapper[^"]*radio-button[^"]*"[^>]*>(.*?)</(?:div|label)>"#,
    )
    .expect("valid regex");
    let name_re =
        Regex::new(r#"(?is)<span[^>]*class="[^"]*\bname\b[^"]*"[^>]*>(.*?)</span>"#)
            .expect("valid regex");
    let price_re = Regex::new(
        r#"(?is)<span[^>]*class="[^"]*option-price[^"]*"[^>]*>[^<]*?\$?\s*([\d,]+\.?\d*)"#,
    )
    .expect("valid regex");

    let mut options = Vec::new();
    for block in block_re.captures_iter(html) {
        let inner = &block[1];
        let Some(name) = name_re.captures(inner) else {
            continue;
        };
        let text = strip_tags(&name[1]);
        if text.is_empty() {
            continue;
        }
        let lowered = text.to_lowercase();
        if lowered.contains("used") || lowered.contains("refurbished") {
            continue;
        }

        let price = price_re
            .captures(inner)
            .and_then(|c| c[1].replace(',', "").parse::<f64>().ok());
        let in_stock = !inner.to_lowercase().contains("out of stock");

        options.push(SizeOption {
            text,
            price,
            in_stock,
        });
    }
    options
}

fn extract_main_price(html: &str) -> Option<f64> {
    let re = Regex::new(
        r#"(?is)<[^>]*class="[^"]*\b(?:main-price|product-price|price-current)\b[^"]*"[^>]*>[^<]*?\$\s*([\d,]+\.?\d*)"#,
    )
    .expect("valid regex");
    re.captures(html)
        .and_then(|c| c[1].replace(',', "").parse().ok())
}

fn extract_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid regex");
    re.captures(html)
        .map(|c| strip_tags(&c[1]))
        .filter(|t| !t.is_empty())
}

/// Model numbers show up either as the tail of a "Baseball Bat: XYZ" heading
/// segment or in a labeled spec row.
fn extract_model_number(html: &str) -> Option<String> {
    let text = strip_tags(html);

    let labeled = Regex::new(r"(?i)(?:Model|Item\s*#|SKU)\s*:?\s*([A-Za-z0-9-]{3,19})\b")
        .expect("valid regex");
    if let Some(c) = labeled.captures(&text) {
        return Some(c[1].to_string());
    }

    // "... Baseball Bat: WBD2468010" — take what follows the last colon.
    let tail = Regex::new(r"(?i)Baseball\s+Bat:\s*([A-Za-z0-9-]{3,19})\b").expect("valid regex");
    tail.captures(&text).map(|c| c[1].to_string())
}

fn extract_swing_weight(html: &str) -> Option<String> {
    // Spec table row: <th>Swing Weight</th><td>...</td>, value possibly
    // wrapped in a link.
    let re = Regex::new(
        r"(?is)<th[^>]*>\s*Swing\s+Weight\s*:?\s*</th>\s*<td[^>]*>(.*?)</td>",
    )
    .expect("valid regex");
    re.captures(html)
        .map(|c| strip_tags(&c[1]))
        .filter(|v| !v.is_empty())
}

fn extract_image_url(html: &str) -> Option<String> {
    let re = Regex::new(r#"(?i)src="(https?://[^"]*cloudfront[^"]*/images/products/[^"]+)""#)
        .expect("valid regex");
    let found = re
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .find(|url| {
            let lowered = url.to_lowercase();
            !lowered.contains("logo") && !lowered.contains("badge") && !lowered.contains("placeholder")
        });
    found
}

fn strip_tags(fragment: &str) -> String {
    let re = Regex::new(r"<[^>]*>").expect("valid regex");
    let text = re.replace_all(fragment, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
pub struct JustBatsClientConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub min_request_interval_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

impl JustBatsClientConfig {
    #[must_use]
    pub fn from_app_config(cfg: &batdb_core::AppConfig) -> Self {
        Self {
            timeout_secs: cfg.retail_request_timeout_secs,
            user_agent: cfg.retail_user_agent.clone(),
            min_request_interval_ms: cfg.retail_min_request_interval_ms,
            max_retries: cfg.retail_max_retries,
            retry_backoff_base_secs: cfg.retail_retry_backoff_base_secs,
        }
    }
}

/// Fetches product pages with rate gating and retries; parsing stays in
/// [`parse_product_page`].
pub struct JustBatsClient {
    client: Client,
    gate: RequestGate,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl JustBatsClient {
    /// # Errors
    ///
    /// Returns [`RetailError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &JustBatsClientConfig) -> Result<Self, RetailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            gate: RequestGate::new(Duration::from_millis(config.min_request_interval_ms)),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        })
    }

    /// Fetches and parses one product page.
    ///
    /// # Errors
    ///
    /// - [`RetailError::NotFound`] when the page 404s (the URL is likely
    ///   stale and should be flagged).
    /// - [`RetailError::RateLimited`] on 429s.
    /// - [`RetailError::UnexpectedStatus`] / [`RetailError::Http`] otherwise.
    pub async fn fetch_product(&self, url: &str) -> Result<ProductPage, RetailError> {
        let html = retry_with_backoff(self.max_retries, self.backoff_base_secs, || async {
            self.gate.wait().await;
            let response = self.client.get(url).send().await?;

            match response.status() {
                StatusCode::NOT_FOUND | StatusCode::GONE => {
                    return Err(RetailError::NotFound {
                        url: url.to_string(),
                    });
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    return Err(RetailError::RateLimited {
                        domain: "www.justbats.com".to_string(),
                        retry_after_secs: self.backoff_base_secs,
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

            Ok(response.text().await?)
        })
        .await?;

        let page = parse_product_page(&html);
        tracing::debug!(
            url,
            options = page.options.len(),
            discontinued = page.discontinued,
            "parsed product page"
        );
        Ok(page)
    }
}
