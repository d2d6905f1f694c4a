//! Beer catalog types.
//!
//! These types mirror the json documents exchanged with the beer service,
//! with the paging envelope rebuilt into a consistent, read-only page.

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use uuid::Uuid;

use crate::error::BeerValidationError;

// ---------------------------------------------------------------------------
// Beer
// ---------------------------------------------------------------------------

/// A single beer product.
///
/// `id` and the timestamps are assigned by the service. The builder does not
/// offer setters for them; beers decoded from responses carry them.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Beer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(skip))]
    pub id: Option<Uuid>,

    /// Empty if the service stored the beer without a name.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub beer_name: String,

    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub beer_style: String,

    /// Universal product code, empty if the beer has none.
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[builder(default)]
    pub upc: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    #[builder(default, setter(into, strip_option))]
    pub price: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub quantity_on_hand: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp")]
    #[builder(setter(skip))]
    pub created_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp")]
    #[builder(setter(skip))]
    pub last_updated_date: Option<DateTime<Utc>>,
}

impl Beer {
    pub fn builder() -> BeerBuilder {
        BeerBuilder::default()
    }

    /// Check a beer before it is sent with a create request.
    pub fn validate_for_create(&self) -> Result<(), BeerValidationError> {
        if self.id.is_some() {
            return Err(BeerValidationError::IdAssigned);
        }
        self.validate_required_fields()
    }

    /// Check a beer before it is sent with an update request.
    ///
    /// The id of the updated beer is taken from the request path,
    /// so an id on the beer itself is allowed.
    pub fn validate_for_update(&self) -> Result<(), BeerValidationError> {
        self.validate_required_fields()
    }

    fn validate_required_fields(&self) -> Result<(), BeerValidationError> {
        if self.beer_name.trim().is_empty() {
            return Err(BeerValidationError::BlankName);
        }
        if self.beer_style.trim().is_empty() {
            return Err(BeerValidationError::BlankStyle);
        }
        Ok(())
    }

    /// The request body for create and update requests.
    ///
    /// Fields set by the service are never submitted.
    pub(crate) fn to_submission(&self) -> Beer {
        Beer {
            id: None,
            created_date: None,
            last_updated_date: None,
            ..self.clone()
        }
    }
}

impl BeerBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.beer_name {
            if name.trim().is_empty() {
                return Err(BeerValidationError::BlankName.to_string());
            }
        }
        if let Some(style) = &self.beer_style {
            if style.trim().is_empty() {
                return Err(BeerValidationError::BlankStyle.to_string());
            }
        }
        Ok(())
    }
}

/// (De)serialization of service timestamps.
///
/// The service may send RFC 3339 timestamps or local date-times without an
/// offset. The latter are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => {
                serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            },
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Ok(with_offset.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, LOCAL_DATE_TIME_FORMAT)
            .map(|local| local.and_utc())
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Optional filters and paging for a beer listing.
///
/// Every field left as `None` is omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListBeersQuery {
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
    pub beer_name: Option<String>,
    pub beer_style: Option<String>,
    pub show_inventory_on_hand: Option<bool>,
}

impl ListBeersQuery {
    /// A query for a single page.
    pub fn page(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: Some(page_number),
            page_size: Some(page_size),
            ..Default::default()
        }
    }
}

/// The paging envelope as sent by the service.
///
/// `first`, `last`, `totalPages` and `numberOfElements` are accepted but
/// recomputed from the other fields when building a [BeerPage].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBeerPage {
    #[serde(default)]
    content: Vec<Beer>,
    number: u32,
    size: u32,
    total_elements: u64,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    first: Option<bool>,
    #[serde(default)]
    last: Option<bool>,
    #[serde(default)]
    number_of_elements: Option<u32>,
    #[serde(default)]
    pageable: serde_json::Value,
    #[serde(default)]
    sort: serde_json::Value,
}

/// Error building a [BeerPage] from a paging envelope.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BeerPageError {
    #[error("page size must be at least 1")]
    ZeroPageSize,
    #[error("page holds {content} beers but its size is {size}")]
    Overfull { content: usize, size: u32 },
}

/// One page of a beer listing.
///
/// Pages are only created by decoding a listing response
/// and can not be modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBeerPage", into = "RawBeerPage")]
pub struct BeerPage {
    content: Vec<Beer>,
    number: u32,
    size: u32,
    total_elements: u64,
    pageable: serde_json::Value,
    sort: serde_json::Value,
}

impl TryFrom<RawBeerPage> for BeerPage {
    type Error = BeerPageError;

    fn try_from(raw: RawBeerPage) -> Result<Self, Self::Error> {
        BeerPage::new(raw.content, raw.number, raw.size, raw.total_elements)
            .map(|page| page.with_metadata(raw.pageable, raw.sort))
    }
}

impl From<BeerPage> for RawBeerPage {
    fn from(page: BeerPage) -> Self {
        RawBeerPage {
            total_pages: Some(page.total_pages()),
            first: Some(page.is_first()),
            last: Some(page.is_last()),
            number_of_elements: Some(page.number_of_elements()),
            number: page.number,
            size: page.size,
            total_elements: page.total_elements,
            pageable: page.pageable,
            sort: page.sort,
            content: page.content,
        }
    }
}

impl BeerPage {
    /// Rebuild a page from its content and position.
    ///
    /// If a non-empty page reaches past `total_elements`,
    /// the total is corrected to end with this page.
    pub(crate) fn new(
        content: Vec<Beer>,
        number: u32,
        size: u32,
        total_elements: u64,
    ) -> Result<Self, BeerPageError> {
        if size == 0 {
            return Err(BeerPageError::ZeroPageSize);
        }
        if content.len() > size as usize {
            return Err(BeerPageError::Overfull {
                content: content.len(),
                size,
            });
        }

        let offset = u64::from(number) * u64::from(size);
        let total_elements = if !content.is_empty() && offset + u64::from(size) > total_elements {
            offset + content.len() as u64
        } else {
            total_elements
        };

        Ok(Self {
            content,
            number,
            size,
            total_elements,
            pageable: serde_json::Value::Null,
            sort: serde_json::Value::Null,
        })
    }

    fn with_metadata(self, pageable: serde_json::Value, sort: serde_json::Value) -> Self {
        Self {
            pageable,
            sort,
            ..self
        }
    }

    /// The beers on this page in the order sent by the service.
    pub fn content(&self) -> &[Beer] {
        &self.content
    }

    pub fn into_content(self) -> Vec<Beer> {
        self.content
    }

    /// Zero based index of this page.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Requested page size, not the number of beers on this page.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Number of pages of the whole listing, saturating at [u32::MAX]
    /// since page numbers beyond that can not be requested.
    pub fn total_pages(&self) -> u32 {
        u32::try_from(self.total_elements.div_ceil(u64::from(self.size))).unwrap_or(u32::MAX)
    }

    pub fn number_of_elements(&self) -> u32 {
        self.content.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn has_next(&self) -> bool {
        self.number
            .checked_add(1)
            .is_some_and(|next| next < self.total_pages())
    }

    pub fn next_page_number(&self) -> Option<u32> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u32> {
        self.has_previous().then(|| self.number - 1)
    }

    /// Paging request metadata, passed through uninterpreted.
    pub fn pageable(&self) -> &serde_json::Value {
        &self.pageable
    }

    /// Sort metadata, passed through uninterpreted.
    pub fn sort(&self) -> &serde_json::Value {
        &self.sort
    }
}

impl IntoIterator for BeerPage {
    type IntoIter = std::vec::IntoIter<Beer>;
    type Item = Beer;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Status-only responses
// ---------------------------------------------------------------------------

/// Result of an operation whose response carries no body.
#[derive(Debug, Clone)]
pub struct StatusResponse {
    status: StatusCode,
    headers: HeaderMap,
}

impl StatusResponse {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// A response consisting of a status only,
    /// e.g. to stand in for a failed request.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, HeaderMap::new())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Location` header, set by the service on create.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION)?.to_str().ok()
    }
}
