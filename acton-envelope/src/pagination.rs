//! Page resolution for list responses
//!
//! This module turns the `page` / `page_size` query parameters of a request
//! into a validated [`PageRequest`], and defines [`PageSource`], the
//! capability a data source implements when it can count and window its
//! records without a full pass.
//!
//! # Rules
//!
//! - `page` defaults to 1 and must be an integer of at least 1
//! - `page_size` defaults to [`PaginationConfig::default_page_size`], must be
//!   a positive integer, and is clamped to [`PaginationConfig::max_page_size`]
//! - empty parameters (`?page=`) count as absent
//! - integers too large to represent saturate rather than fail
//! - when [`PaginationConfig::max_records`] is set, pages reaching past that
//!   many records are pulled back to the deepest page allowed
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use acton_envelope::{PageOptions, PageRequest, PaginationConfig};
//!
//! let mut query = HashMap::new();
//! query.insert("page".to_string(), "3".to_string());
//! query.insert("page_size".to_string(), "500".to_string());
//!
//! let request = PageRequest::resolve(&query, &PageOptions::default(), &PaginationConfig::default())
//!     .unwrap();
//! assert_eq!(request.page_number, 3);
//! assert_eq!(request.page_size, 50); // clamped to max_page_size
//! assert_eq!(request.offset(), 100);
//! ```

use std::borrow::Cow;
use std::num::IntErrorKind;
use std::collections::HashMap;

use axum::extract::{FromRequestParts, Query};
use http::request::Parts;
use http::{Request, Uri};
use serde::{Deserialize, Serialize};

use crate::api_error::ApiError;
use crate::error::{Error, Result};
use crate::record::Record;

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Default upper bound on items per page
pub const MAX_PAGE_SIZE: u64 = 50;

/// Query parameter holding the page number
pub const PAGE_PARAM: &str = "page";

/// Query parameter holding the page size
pub const PAGE_SIZE_PARAM: &str = "page_size";

// ============================================================================
// Configuration
// ============================================================================

/// Pagination limits
///
/// Loaded from the `[pagination]` section of the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when the request does not specify one
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Largest page size a request may ask for
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,

    /// Deepest record a client may page to (disabled when unset)
    #[serde(default)]
    pub max_records: Option<u64>,
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u64 {
    MAX_PAGE_SIZE
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_records: None,
        }
    }
}

impl PaginationConfig {
    /// Check that the limits are consistent
    ///
    /// # Example
    ///
    /// ```rust
    /// use acton_envelope::PaginationConfig;
    ///
    /// assert!(PaginationConfig::default().validate().is_ok());
    ///
    /// let broken = PaginationConfig { max_records: Some(20), ..Default::default() };
    /// assert!(broken.validate().is_err()); // max_page_size (50) > max_records
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::InvalidConfig(
                "pagination.default_page_size must be at least 1".to_string(),
            ));
        }
        if self.max_page_size == 0 {
            return Err(Error::InvalidConfig(
                "pagination.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(Error::InvalidConfig(format!(
                "pagination.default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        if let Some(max_records) = self.max_records {
            if max_records > 0 && self.max_page_size > max_records {
                return Err(Error::InvalidConfig(format!(
                    "pagination.max_page_size ({}) exceeds max_records ({})",
                    self.max_page_size, max_records
                )));
            }
        }
        Ok(())
    }
}

/// Values forced by the handler, taking precedence over the request
///
/// Useful for endpoints that must always return the first page (typeahead
/// suggestions) or a fixed page size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Forced page number
    pub page: Option<u64>,
    /// Forced page size; must not exceed the configured maximum
    pub page_size: Option<u64>,
}

impl PageOptions {
    /// Force the page number
    #[must_use]
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Force the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

// ============================================================================
// Request context
// ============================================================================

/// Anything that exposes request query parameters
pub trait RequestContext {
    /// Raw value of the query parameter `name`
    fn query_param(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<C: RequestContext + ?Sized> RequestContext for &C {
    fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).query_param(name)
    }
}

impl RequestContext for HashMap<String, String> {
    fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }
}

/// Unparseable query strings expose no parameters
impl RequestContext for Uri {
    fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(self).ok()?;
        params.remove(name).map(Cow::Owned)
    }
}

impl RequestContext for Parts {
    fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.uri.query_param(name)
    }
}

impl<B> RequestContext for Request<B> {
    fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.uri().query_param(name)
    }
}

/// Pagination query parameters, kept raw until resolution
///
/// Works as an axum extractor; the values are validated by
/// [`PageRequest::resolve`] so that non-integers produce a bad request
/// envelope rather than a plain-text rejection.
///
/// ```rust,ignore
/// async fn list_tasks(
///     State(state): State<AppState>,
///     query: PageQuery,
/// ) -> acton_envelope::Result<Envelope> {
///     state.responses.page(&query, state.tasks.iter(), &state.task_fields)
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    /// Requested page number
    #[serde(default)]
    pub page: Option<String>,
    /// Requested page size
    #[serde(default)]
    pub page_size: Option<String>,
}

impl PageQuery {
    /// Build a query from typed values
    #[must_use]
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self {
            page: page.map(|page| page.to_string()),
            page_size: page_size.map(|size| size.to_string()),
        }
    }
}

impl RequestContext for PageQuery {
    fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            PAGE_PARAM => self.page.as_deref(),
            PAGE_SIZE_PARAM => self.page_size.as_deref(),
            _ => None,
        };
        value.map(Cow::Borrowed)
    }
}

impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Query::<PageQuery>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .map_err(|rejection| {
                ApiError::bad_request()
                    .with_message(format!("Invalid query string: {}", rejection.body_text()))
            })
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page_number: u64,
    /// Items per page, at least 1
    pub page_size: u64,
}

impl PageRequest {
    /// Resolve the page window for a request
    ///
    /// Malformed request parameters fail with a bad request [`ApiError`];
    /// inconsistent forced values fail with [`Error::InvalidConfig`].
    pub fn resolve<C>(context: &C, options: &PageOptions, config: &PaginationConfig) -> Result<Self>
    where
        C: RequestContext + ?Sized,
    {
        let page_size = match options.page_size {
            Some(0) => {
                return Err(Error::InvalidConfig(
                    "forced page_size must be at least 1".to_string(),
                ))
            }
            Some(size) if size > config.max_page_size => {
                return Err(Error::InvalidConfig(format!(
                    "forced page_size ({}) exceeds max_page_size ({})",
                    size, config.max_page_size
                )))
            }
            Some(size) => size,
            None => match parse_param(context, PAGE_SIZE_PARAM)? {
                Some(size) if size <= 0 => {
                    return Err(ApiError::bad_request()
                        .with_message("Query parameter `page_size` must be a positive integer")
                        .into())
                }
                Some(size) => u64::try_from(size)
                    .unwrap_or(u64::MAX)
                    .min(config.max_page_size),
                None => config.default_page_size.min(config.max_page_size),
            },
        };

        let mut page_number = match options.page {
            Some(0) => {
                return Err(Error::InvalidConfig(
                    "forced page must be at least 1".to_string(),
                ))
            }
            Some(page) => page,
            None => match parse_param(context, PAGE_PARAM)? {
                Some(page) if page < 1 => {
                    return Err(ApiError::bad_request()
                        .with_message("Query parameter `page` must be at least 1")
                        .into())
                }
                Some(page) => u64::try_from(page).unwrap_or(u64::MAX),
                None => 1,
            },
        };

        if let Some(max_records) = config.max_records.filter(|max| *max > 0) {
            if page_number.saturating_mul(page_size) > max_records {
                let capped = (max_records / page_size).max(1);
                tracing::debug!(
                    requested = page_number,
                    capped,
                    max_records,
                    "Page exceeds record cap"
                );
                page_number = capped;
            }
        }

        tracing::debug!(page_number, page_size, "Resolved page window");

        Ok(Self {
            page_number,
            page_size,
        })
    }

    /// Number of items skipped before this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page_number.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Maximum number of items on this page
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.page_size
    }
}

/// Parse an optional integer query parameter
///
/// Integers outside the `i64` range saturate to `i64::MAX` or `i64::MIN`.
fn parse_param<C>(context: &C, name: &str) -> Result<Option<i64>>
where
    C: RequestContext + ?Sized,
{
    let Some(raw) = context.query_param(name) else {
        return Ok(None);
    };

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<i64>() {
        Ok(value) => Ok(Some(value)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(Some(i64::MAX)),
            IntErrorKind::NegOverflow => Ok(Some(i64::MIN)),
            _ => Err(ApiError::bad_request()
                .with_message(format!("Query parameter `{}` must be an integer", name))
                .into()),
        },
    }
}

// ============================================================================
// Page sources
// ============================================================================

/// A data source that can count its records and hand out a window of them
///
/// Implement this for sources that know their size up front (a database
/// table with `COUNT(*)`, an in-memory slice) so that
/// [`ResponseBuilder::page_from`](crate::ResponseBuilder::page_from) does
/// not have to walk the whole collection.
pub trait PageSource {
    /// Record type yielded by the source
    type Item: Record;

    /// Iterator over one window of records
    type Window: IntoIterator<Item = Self::Item>;

    /// Total number of records
    fn total_count(&self) -> u64;

    /// Records `offset..offset + limit`, in source order
    fn window(&self, offset: u64, limit: u64) -> Self::Window;
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

impl<'a, R: Record> PageSource for &'a [R] {
    type Item = &'a R;
    type Window = std::iter::Take<std::iter::Skip<std::slice::Iter<'a, R>>>;

    fn total_count(&self) -> u64 {
        self.len() as u64
    }

    fn window(&self, offset: u64, limit: u64) -> Self::Window {
        let records: &'a [R] = *self;
        records.iter().skip(to_usize(offset)).take(to_usize(limit))
    }
}

impl<'a, R: Record> PageSource for &'a Vec<R> {
    type Item = &'a R;
    type Window = std::iter::Take<std::iter::Skip<std::slice::Iter<'a, R>>>;

    fn total_count(&self) -> u64 {
        self.len() as u64
    }

    fn window(&self, offset: u64, limit: u64) -> Self::Window {
        let records: &'a Vec<R> = *self;
        let records = records.as_slice();
        records.iter().skip(to_usize(offset)).take(to_usize(limit))
    }
}
