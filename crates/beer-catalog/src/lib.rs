//! Typed HTTP client for the beer catalog service.
//!
//! This crate provides:
//! - The endpoint paths of the `/api/v1/beer` resource
//! - [Beer] and [BeerPage], the documents exchanged with the service
//! - [CatalogClient], a `reqwest` based implementation of [BeerClient]
//! - Common error handling for catalog operations
//!
//! ## Usage
//!
//! ```ignore
//! use beer_catalog::{BeerClient, BeerClientConfig, CatalogClient, ListBeersQuery};
//!
//! let client = CatalogClient::new(BeerClientConfig::load(None)?)?;
//! let page = client.list_beers(&ListBeersQuery::page(0, 10)).await?;
//! let first = &page.content()[0];
//! let beer = client.get_beer_by_upc(&first.upc).await?;
//! ```

mod client;
mod config;
pub mod endpoints;
mod error;
mod types;

pub use client::{beer_stream, BeerClient, CatalogClient, DEFAULT_PAGE_SIZE};
pub use config::{BeerClientConfig, BEER_CATALOG_ENV_PREFIX};
pub use error::{BeerValidationError, CatalogClientError, ErrorResponse, RecoverStatusExt};
pub use types::{
    Beer,
    BeerBuilder,
    BeerBuilderError,
    BeerPage,
    BeerPageError,
    ListBeersQuery,
    StatusResponse,
};
