//! Response shapes for the product-catalog API.
//!
//! The API nests everything several levels deep (`ItemInfo.Title.
//! DisplayValue` and so on); these types mirror that shape exactly and
//! convert to the source-neutral [`RawListing`] at the crate boundary.

use batdb_core::{ListingAttribute, RawListing};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GetItemsResponse {
    #[serde(rename = "ItemsResult")]
    pub items_result: Option<ItemList>,
    #[serde(rename = "Errors", default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GetVariationsResponse {
    #[serde(rename = "VariationsResult")]
    pub variations_result: Option<VariationsResult>,
    #[serde(rename = "Errors", default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItemsResponse {
    #[serde(rename = "SearchResult")]
    pub search_result: Option<ItemList>,
    #[serde(rename = "Errors", default)]
    pub errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ItemList {
    #[serde(rename = "Items", default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct VariationsResult {
    #[serde(rename = "Items", default)]
    pub items: Vec<Item>,
    #[serde(rename = "VariationSummary")]
    pub variation_summary: Option<VariationSummary>,
}

#[derive(Debug, Deserialize)]
pub struct VariationSummary {
    #[serde(rename = "PageCount")]
    pub page_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(rename = "Code")]
    pub code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Item {
    #[serde(rename = "ASIN")]
    pub asin: String,
    #[serde(rename = "DetailPageURL")]
    pub detail_page_url: Option<String>,
    #[serde(rename = "ItemInfo")]
    pub item_info: Option<ItemInfo>,
    #[serde(rename = "Offers")]
    pub offers: Option<Offers>,
    #[serde(rename = "VariationAttributes", default)]
    pub variation_attributes: Vec<VariationAttribute>,
    #[serde(rename = "Images")]
    pub images: Option<Images>,
    #[serde(rename = "CustomerReviews")]
    pub customer_reviews: Option<CustomerReviews>,
}

#[derive(Debug, Deserialize)]
pub struct ItemInfo {
    #[serde(rename = "Title")]
    pub title: Option<DisplayValue>,
    #[serde(rename = "Features")]
    pub features: Option<DisplayValues>,
}

#[derive(Debug, Deserialize)]
pub struct DisplayValue {
    #[serde(rename = "DisplayValue")]
    pub display_value: String,
}

#[derive(Debug, Deserialize)]
pub struct DisplayValues {
    #[serde(rename = "DisplayValues", default)]
    pub display_values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Offers {
    #[serde(rename = "Listings", default)]
    pub listings: Vec<OfferListing>,
    #[serde(rename = "Summaries", default)]
    pub summaries: Vec<OfferSummary>,
}

#[derive(Debug, Deserialize)]
pub struct OfferListing {
    #[serde(rename = "Price")]
    pub price: Option<Price>,
    #[serde(rename = "Availability")]
    pub availability: Option<Availability>,
}

#[derive(Debug, Deserialize)]
pub struct OfferSummary {
    #[serde(rename = "LowestPrice")]
    pub lowest_price: Option<Price>,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    #[serde(rename = "Amount")]
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Availability {
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "Type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VariationAttribute {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct Images {
    #[serde(rename = "Primary")]
    pub primary: Option<ImageSet>,
}

#[derive(Debug, Deserialize)]
pub struct ImageSet {
    #[serde(rename = "Large")]
    pub large: Option<ImageUrl>,
    #[serde(rename = "Medium")]
    pub medium: Option<ImageUrl>,
}

#[derive(Debug, Deserialize)]
pub struct ImageUrl {
    #[serde(rename = "URL")]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerReviews {
    #[serde(rename = "StarRating")]
    pub star_rating: Option<StarRating>,
    #[serde(rename = "Count")]
    pub count: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct StarRating {
    #[serde(rename = "Value")]
    pub value: Option<f64>,
}

/// Enrichment data carried alongside a listing: ratings and imagery that
/// update the model record but play no part in matching.
#[derive(Debug, Clone, Default)]
pub struct ListingMeta {
    pub rating: Option<f64>,
    pub review_count: Option<i32>,
    pub image_url: Option<String>,
}

impl Item {
    /// Best available price in dollars: the first offer listing, then the
    /// lowest summary price.
    #[must_use]
    pub fn price(&self) -> Option<f64> {
        let offers = self.offers.as_ref()?;
        offers
            .listings
            .first()
            .and_then(|l| l.price.as_ref())
            .and_then(|p| p.amount)
            .or_else(|| {
                offers
                    .summaries
                    .first()
                    .and_then(|s| s.lowest_price.as_ref())
                    .and_then(|p| p.amount)
            })
    }

    /// Stock heuristic over the availability message and type. Absent
    /// availability data means not purchasable.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        let Some(availability) = self
            .offers
            .as_ref()
            .and_then(|o| o.listings.first())
            .and_then(|l| l.availability.as_ref())
        else {
            return false;
        };

        let message = availability
            .message
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        let kind = availability
            .kind
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        !message.contains("out of stock")
            && !message.contains("unavailable")
            && !message.contains("discontinued")
            && kind != "outofstock"
    }

    #[must_use]
    pub fn metadata(&self) -> ListingMeta {
        ListingMeta {
            rating: self
                .customer_reviews
                .as_ref()
                .and_then(|r| r.star_rating.as_ref())
                .and_then(|s| s.value),
            review_count: self.customer_reviews.as_ref().and_then(|r| r.count),
            image_url: self.images.as_ref().and_then(|i| {
                i.primary.as_ref().and_then(|p| {
                    p.large
                        .as_ref()
                        .or(p.medium.as_ref())
                        .map(|u| u.url.clone())
                })
            }),
        }
    }

    /// Flatten into the source-neutral listing shape the matcher consumes.
    #[must_use]
    pub fn into_listing(self) -> RawListing {
        let price = self.price();
        let in_stock = self.in_stock();
        let title = self
            .item_info
            .as_ref()
            .and_then(|i| i.title.as_ref())
            .map(|t| t.display_value.clone())
            .unwrap_or_default();
        let features = self
            .item_info
            .as_ref()
            .and_then(|i| i.features.as_ref())
            .map(|f| f.display_values.clone())
            .unwrap_or_default();
        let variation_attributes = self
            .variation_attributes
            .into_iter()
            .map(|a| ListingAttribute {
                name: a.name,
                value: a.value,
            })
            .collect();

        RawListing {
            id: self.asin,
            title,
            features,
            price,
            in_stock,
            variation_attributes,
            url: self.detail_page_url,
        }
    }
}
