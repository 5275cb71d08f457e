//! Link-header pagination.
//!
//! Two contracts live here and both are kept on purpose:
//!
//! - [`collect_all`] follows `rel="next"` until the server stops sending
//!   one and concatenates every page (events, repositories).
//! - [`single_page`] returns just the page it was given, with the page
//!   count read from `rel="last"` (gist listing).
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod links;

pub use links::LinkRelations;

use crate::error::{GitHubApiError, Result};
use crate::metrics;
use crate::middleware::{ApiRequest, ApiResponse, Pipeline};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page_number: u32,
    /// Never less than `page_number`.
    pub total_pages: u32,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    /// Convert every item, failing on the first conversion error.
    pub fn try_map<U, F>(self, f: F) -> Result<Page<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        Ok(Page {
            page_number: self.page_number,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect::<Result<Vec<_>>>()?,
        })
    }
}

/// Relations from the response's `Link` header; empty when there is none.
pub fn link_relations(response: &ApiResponse) -> LinkRelations {
    response
        .header("link")
        .map(LinkRelations::parse)
        .unwrap_or_default()
}

/// Items of every page, starting with `first` and following `next` links
/// through `pipeline`.
///
/// `first` must already be known to be successful. A follow-up page that
/// fails aborts the whole listing with `RequestFailure`.
pub async fn collect_all(pipeline: &Pipeline, first: ApiResponse) -> Result<Vec<Value>> {
    let mut next = link_relations(&first).next();
    let mut items = page_items(&first)?;

    while let Some(url) = next {
        debug!("Following next page: {}", url);
        let response = pipeline.send(ApiRequest::get(url)).await?;
        if !response.is_success() {
            metrics::record_page_followed(false);
            return Err(GitHubApiError::RequestFailure(response.message()));
        }
        metrics::record_page_followed(true);

        items.extend(page_items(&response)?);
        next = link_relations(&response).next();
    }

    Ok(items)
}

/// The items of `response` as page `page_number` of a listing.
pub fn single_page(response: &ApiResponse, page_number: u32) -> Result<Page<Value>> {
    let total_pages = link_relations(response)
        .last_page()
        .unwrap_or(page_number)
        .max(page_number);

    Ok(Page {
        page_number,
        total_pages,
        items: page_items(response)?,
    })
}

fn page_items(response: &ApiResponse) -> Result<Vec<Value>> {
    match response.json() {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(GitHubApiError::UnexpectedResponse(format!(
            "expected a JSON array, got {}",
            json_kind(other)
        ))),
        None => Err(GitHubApiError::UnexpectedResponse(format!(
            "expected a JSON array, got a non-JSON body with status {}",
            response.status
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
