//! Success envelope construction
//!
//! [`ResponseBuilder`] serializes a single record or a page of records
//! through an explicit [`FieldSpec`]. Build one at startup, keep it in your
//! application state and share it between handlers.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use acton_envelope::{FieldSpec, ResponseBuilder};
//! use serde_json::json;
//!
//! let responses = ResponseBuilder::default();
//! let fields = FieldSpec::new(["id", "name"]).unwrap();
//!
//! let record = json!({"id": 5, "name": "x", "password_hash": "..."});
//! let envelope = responses.ok(&record, &fields).unwrap();
//! assert_eq!(
//!     serde_json::to_value(&envelope).unwrap(),
//!     json!({"status": "ok", "data": {"id": 5, "name": "x"}, "message": null})
//! );
//!
//! let records: Vec<_> = (1..=25).map(|id| json!({"id": id, "name": "n"})).collect();
//! let mut query = HashMap::new();
//! query.insert("page".to_string(), "3".to_string());
//! let envelope = responses.page(&query, &records, &fields).unwrap();
//! assert_eq!(envelope.meta().unwrap().total_pages, 3);
//! assert_eq!(envelope.data().unwrap().as_array().unwrap().len(), 5);
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;
use crate::envelope::{Envelope, PageMeta};
use crate::error::{Result, SerializationError};
use crate::fields::FieldSpec;
use crate::pagination::{PageOptions, PageRequest, PageSource, PaginationConfig, RequestContext};
use crate::record::{to_json, Record};

/// Builds success envelopes
///
/// Immutable once built; cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBuilder {
    config: PaginationConfig,
    options: PageOptions,
}

impl ResponseBuilder {
    /// Create a builder with the given pagination limits
    ///
    /// Fails with [`Error::InvalidConfig`](crate::Error::InvalidConfig) when
    /// the limits are inconsistent.
    pub fn new(config: PaginationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            options: PageOptions::default(),
        })
    }

    /// Create a builder from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.pagination)
    }

    /// Force page values regardless of the request
    ///
    /// The forced values are checked against the limits when a page is
    /// resolved.
    #[must_use]
    pub fn with_page_options(mut self, options: PageOptions) -> Self {
        self.options = options;
        self
    }

    /// Pagination limits in use
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Forced page values in use
    pub fn page_options(&self) -> &PageOptions {
        &self.options
    }

    /// Serialize one record
    ///
    /// `data` holds exactly the whitelisted fields, in whitelist order.
    pub fn ok<R>(&self, record: &R, fields: &FieldSpec) -> Result<Envelope>
    where
        R: Record + ?Sized,
    {
        let data = fields.extract(record)?;
        Ok(Envelope::success(Value::Object(data)))
    }

    /// Serialize arbitrary data without a whitelist
    ///
    /// Meant for plain values (counts, acknowledgements, computed summaries),
    /// not for records.
    pub fn json<T>(&self, data: &T) -> Result<Envelope>
    where
        T: Serialize + ?Sized,
    {
        let data = to_json(data).map_err(SerializationError::InvalidPayload)?;
        Ok(Envelope::success(data))
    }

    /// Serialize one page of an iterable
    ///
    /// The iterable is walked once. Items outside the requested window are
    /// counted but never serialized.
    pub fn page<C, I>(&self, context: &C, records: I, fields: &FieldSpec) -> Result<Envelope>
    where
        C: RequestContext + ?Sized,
        I: IntoIterator,
        I::Item: Record,
    {
        let request = self.resolve(context)?;
        let start = request.offset();
        let end = start.saturating_add(request.limit());

        let mut items = Vec::new();
        let mut total_count: u64 = 0;
        for record in records {
            if (start..end).contains(&total_count) {
                items.push(Value::Object(fields.extract(&record)?));
            }
            total_count += 1;
        }

        Ok(Envelope::page(
            items,
            PageMeta::new(request.page_number, request.page_size, total_count),
        ))
    }

    /// Serialize one page of a [`PageSource`]
    ///
    /// The source supplies the total count and the window, so only the
    /// records on the page are touched.
    pub fn page_from<C, S>(&self, context: &C, source: S, fields: &FieldSpec) -> Result<Envelope>
    where
        C: RequestContext + ?Sized,
        S: PageSource,
    {
        let request = self.resolve(context)?;
        let total_count = source.total_count();

        let items = source
            .window(request.offset(), request.limit())
            .into_iter()
            .take(usize::try_from(request.limit()).unwrap_or(usize::MAX))
            .map(|record| fields.extract(&record).map(Value::Object))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Envelope::page(
            items,
            PageMeta::new(request.page_number, request.page_size, total_count),
        ))
    }

    fn resolve<C>(&self, context: &C) -> Result<PageRequest>
    where
        C: RequestContext + ?Sized,
    {
        PageRequest::resolve(context, &self.options, &self.config)
    }
}
