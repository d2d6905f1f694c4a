//! Beer catalog client.

use std::fmt::Debug;
use std::future::Future;
use std::num::NonZeroU32;
use std::str::FromStr;

use async_stream::try_stream;
use futures::stream::Stream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{self, HeaderMap};
use reqwest::{Request, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::BeerClientConfig;
use crate::endpoints::{beer_by_id_path, beer_by_upc_path, url_for, BEER_V1_PATH};
use crate::error::{CatalogClientError, ErrorResponse};
use crate::types::{Beer, BeerPage, ListBeersQuery, StatusResponse};

/// Page size used to walk a listing if the query does not set one.
pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(25).unwrap();

/// A client for the beer service.
///
/// Every operation is a single request/response exchange.
/// The client holds no state besides its connection pool
/// and can be shared between tasks.
pub struct CatalogClient {
    client: reqwest::Client,
    config: BeerClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new beer client from configuration.
    pub fn new(config: BeerClientConfig) -> Result<Self, CatalogClientError> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Get the configured base url.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Update the client configuration and recreate the client.
    pub fn update_config(
        &mut self,
        update: impl FnOnce(&mut BeerClientConfig),
    ) -> Result<(), CatalogClientError> {
        let mut modified_config = self.config.clone();
        update(&mut modified_config);
        *self = Self::new(modified_config)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Request construction
    // -----------------------------------------------------------------------

    /// `GET /api/v1/beer/{beer_id}`
    pub fn get_beer_by_id_request(
        &self,
        beer_id: Uuid,
        show_inventory_on_hand: Option<bool>,
    ) -> Result<Request, CatalogClientError> {
        let mut query = Vec::with_capacity(1);
        if let Some(v) = &show_inventory_on_hand {
            query.push(("showInventoryOnHand", v.to_string()));
        }
        self.client
            .get(url_for(self.base_url(), &beer_by_id_path(beer_id)))
            .query(&query)
            .build()
            .map_err(CatalogClientError::InvalidRequest)
    }

    /// `GET /api/v1/beer`
    pub fn list_beers_request(&self, query: &ListBeersQuery) -> Result<Request, CatalogClientError> {
        let mut params = Vec::with_capacity(5);
        if let Some(v) = &query.page_number {
            params.push(("pageNumber", v.to_string()));
        }
        if let Some(v) = &query.page_size {
            params.push(("pageSize", v.to_string()));
        }
        if let Some(v) = &query.beer_name {
            params.push(("beerName", v.to_string()));
        }
        if let Some(v) = &query.beer_style {
            params.push(("beerStyle", v.to_string()));
        }
        // sic, the listing endpoint spells it with a lower case 'h'
        if let Some(v) = &query.show_inventory_on_hand {
            params.push(("showInventoryOnhand", v.to_string()));
        }
        self.client
            .get(url_for(self.base_url(), BEER_V1_PATH))
            .query(&params)
            .build()
            .map_err(CatalogClientError::InvalidRequest)
    }

    /// `POST /api/v1/beer`
    pub fn create_beer_request(&self, beer: &Beer) -> Result<Request, CatalogClientError> {
        beer.validate_for_create()?;
        self.client
            .post(url_for(self.base_url(), BEER_V1_PATH))
            .json(&beer.to_submission())
            .build()
            .map_err(CatalogClientError::InvalidRequest)
    }

    /// `PUT /api/v1/beer/{beer_id}`
    pub fn update_beer_request(
        &self,
        beer_id: Uuid,
        beer: &Beer,
    ) -> Result<Request, CatalogClientError> {
        beer.validate_for_update()?;
        self.client
            .put(url_for(self.base_url(), &beer_by_id_path(beer_id)))
            .json(&beer.to_submission())
            .build()
            .map_err(CatalogClientError::InvalidRequest)
    }

    /// `DELETE /api/v1/beer/{beer_id}`
    pub fn delete_beer_by_id_request(&self, beer_id: Uuid) -> Result<Request, CatalogClientError> {
        self.client
            .delete(url_for(self.base_url(), &beer_by_id_path(beer_id)))
            .build()
            .map_err(CatalogClientError::InvalidRequest)
    }

    /// `GET /api/v1/beerUpc/{upc}`
    pub fn get_beer_by_upc_request(&self, upc: &str) -> Result<Request, CatalogClientError> {
        self.client
            .get(url_for(self.base_url(), &beer_by_upc_path(upc)))
            .build()
            .map_err(CatalogClientError::InvalidRequest)
    }

    // -----------------------------------------------------------------------
    // Response handling
    // -----------------------------------------------------------------------

    async fn execute(&self, request: Request) -> Result<reqwest::Response, CatalogClientError> {
        debug!(method = %request.method(), url = %request.url(), "sending request");
        let response = self
            .client
            .execute(request)
            .await
            .map_err(CatalogClientError::Communication)?;
        debug!(status = %response.status(), "received response");
        Ok(response)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<T, CatalogClientError> {
        let response = self.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }
        let body = response
            .bytes()
            .await
            .map_err(CatalogClientError::Communication)?;
        serde_json::from_slice(&body)
            .map_err(|source| CatalogClientError::InvalidResponsePayload { status, source })
    }

    async fn execute_bodiless(
        &self,
        request: Request,
    ) -> Result<StatusResponse, CatalogClientError> {
        let response = self.execute(request).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(StatusResponse::new(
            response.status(),
            response.headers().clone(),
        ))
    }
}

/// Read the body of a failed response into an error.
///
/// 404 is reported as [CatalogClientError::NotFound],
/// so consumers don't need to inspect the status.
async fn error_from_response(response: reqwest::Response) -> CatalogClientError {
    let status = response.status();
    // The body is informational only, failing to read it must not hide the
    // status.
    let body = response.text().await.ok().filter(|body| !body.is_empty());
    debug!(%status, has_body = body.is_some(), "beer service returned an error");

    let error_response = ErrorResponse::new(status, body);
    if status == StatusCode::NOT_FOUND {
        CatalogClientError::NotFound(error_response)
    } else {
        CatalogClientError::ErrorResponse(error_response)
    }
}

// ---------------------------------------------------------------------------
// BeerClient trait
// ---------------------------------------------------------------------------

/// The complete beer service interface.
#[allow(async_fn_in_trait)]
pub trait BeerClient {
    /// Get a single beer by its id.
    async fn get_beer_by_id(
        &self,
        beer_id: Uuid,
        show_inventory_on_hand: Option<bool>,
    ) -> Result<Beer, CatalogClientError>;

    /// Get one page of beers matching the query.
    async fn list_beers(&self, query: &ListBeersQuery) -> Result<BeerPage, CatalogClientError>;

    /// Create a beer.
    ///
    /// The response carries no body, the id of the new beer is only available
    /// through [StatusResponse::location] or by looking the beer up again.
    async fn create_beer(&self, beer: &Beer) -> Result<StatusResponse, CatalogClientError>;

    /// Replace the beer with the given id.
    ///
    /// Fields left unset on `beer` may be cleared by the service.
    async fn update_beer(
        &self,
        beer_id: Uuid,
        beer: &Beer,
    ) -> Result<StatusResponse, CatalogClientError>;

    /// Delete the beer with the given id.
    async fn delete_beer_by_id(&self, beer_id: Uuid) -> Result<StatusResponse, CatalogClientError>;

    /// Get a single beer by its universal product code.
    async fn get_beer_by_upc(
        &self,
        upc: impl AsRef<str> + Send + Sync,
    ) -> Result<Beer, CatalogClientError>;

    /// Collect beers across pages, starting at the query's page.
    ///
    /// Stops at the last page or once `limit` beers were collected.
    async fn list_all_beers(
        &self,
        query: &ListBeersQuery,
        limit: Option<NonZeroU32>,
    ) -> Result<Vec<Beer>, CatalogClientError> {
        collect_beers(beer_stream(self, query), limit).await
    }
}

impl BeerClient for CatalogClient {
    #[instrument(skip(self))]
    async fn get_beer_by_id(
        &self,
        beer_id: Uuid,
        show_inventory_on_hand: Option<bool>,
    ) -> Result<Beer, CatalogClientError> {
        let request = self.get_beer_by_id_request(beer_id, show_inventory_on_hand)?;
        self.execute_json(request).await
    }

    #[instrument(skip(self))]
    async fn list_beers(&self, query: &ListBeersQuery) -> Result<BeerPage, CatalogClientError> {
        let request = self.list_beers_request(query)?;
        let page: BeerPage = self.execute_json(request).await?;

        debug!(
            n_beers = page.number_of_elements(),
            total = page.total_elements(),
            "received beer page"
        );
        Ok(page)
    }

    #[instrument(skip_all, fields(beer_name = %beer.beer_name))]
    async fn create_beer(&self, beer: &Beer) -> Result<StatusResponse, CatalogClientError> {
        let request = self.create_beer_request(beer)?;
        let response = self.execute_bodiless(request).await?;

        debug!(location = ?response.location(), "successfully created beer");
        Ok(response)
    }

    #[instrument(skip(self, beer))]
    async fn update_beer(
        &self,
        beer_id: Uuid,
        beer: &Beer,
    ) -> Result<StatusResponse, CatalogClientError> {
        let request = self.update_beer_request(beer_id, beer)?;
        self.execute_bodiless(request).await
    }

    #[instrument(skip(self))]
    async fn delete_beer_by_id(&self, beer_id: Uuid) -> Result<StatusResponse, CatalogClientError> {
        let request = self.delete_beer_by_id_request(beer_id)?;
        self.execute_bodiless(request).await
    }

    #[instrument(skip_all, fields(upc = %upc.as_ref()))]
    async fn get_beer_by_upc(
        &self,
        upc: impl AsRef<str> + Send + Sync,
    ) -> Result<Beer, CatalogClientError> {
        let request = self.get_beer_by_upc_request(upc.as_ref())?;
        self.execute_json(request).await
    }
}

// ---------------------------------------------------------------------------
// Depaging
// ---------------------------------------------------------------------------

/// Stream the beers of all pages, starting at the query's page.
pub fn beer_stream<'a, C>(
    client: &'a C,
    query: &'a ListBeersQuery,
) -> impl Stream<Item = Result<Beer, CatalogClientError>> + 'a
where
    C: BeerClient + ?Sized,
{
    let first_page = query.page_number.unwrap_or(0);
    let page_size = query
        .page_size
        .and_then(NonZeroU32::new)
        .unwrap_or(DEFAULT_PAGE_SIZE);

    make_depaging_stream(
        move |page_number, page_size| {
            let query = ListBeersQuery {
                page_number: Some(page_number),
                page_size: Some(page_size),
                ..query.clone()
            };
            async move { client.list_beers(&query).await }
        },
        first_page,
        page_size,
    )
}

/// Create a depaging stream from a page-fetching function.
///
/// Yields the content of each page in order and stops after the last page,
/// a short page, or an empty page.
/// The last page is determined from the requested page number,
/// a page answered for a different number ends the stream without being yielded.
fn make_depaging_stream<E, Fut>(
    fetch_page: impl Fn(u32, u32) -> Fut,
    first_page: u32,
    page_size: NonZeroU32,
) -> impl Stream<Item = Result<Beer, E>>
where
    Fut: Future<Output = Result<BeerPage, E>>,
{
    try_stream! {
        let mut page_number = first_page;

        loop {
            let page = fetch_page(page_number, page_size.get()).await?;

            // the service ignored the requested page number
            if page.number() != page_number {
                debug!(
                    requested = page_number,
                    answered = page.number(),
                    "service answered a different page, stop paging"
                );
                break;
            }

            let items_on_page = page.number_of_elements();
            let reached_total = (u64::from(page_number) + 1) * u64::from(page_size.get())
                >= page.total_elements();

            for beer in page {
                yield beer;
            }

            if reached_total || items_on_page < page_size.get() {
                break;
            }
            let Some(next_page_number) = page_number.checked_add(1) else {
                break;
            };
            page_number = next_page_number;
        }
    }
}

/// Collects a stream of beers, taking at most `limit` items.
async fn collect_beers<E>(
    stream: impl Stream<Item = Result<Beer, E>>,
    limit: Option<NonZeroU32>,
) -> Result<Vec<Beer>, E> {
    let actual_limit = limit.map_or(usize::MAX, |limit| limit.get() as usize);
    stream.take(actual_limit).try_collect::<Vec<_>>().await
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build the HTTP client for the beer service.
fn build_http_client(config: &BeerClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        base_url = %config.base_url,
        extra_headers = config.extra_headers.len(),
        "building beer catalog HTTP client"
    );

    let client_builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
