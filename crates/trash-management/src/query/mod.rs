//! # Query Builder
//!
//! Pure functions turning a [`RequestPayload`] into the [`CallDescriptor`] the
//! backend expects. Nothing here touches the bus or holds state.
//!
//! ```rust
//! use serde_json::json;
//! use trash_management::model::RequestPayload;
//! use trash_management::query::build_list_query;
//!
//! let request = RequestPayload::from_payload(&json!({
//!     "page": 2,
//!     "pageSize": 20,
//!     "dataFilters": [{ "name": "archiveDate", "value": "2024-01-01|" }]
//! }));
//! let call = build_list_query(&request, "workspace://SpacesStore");
//!
//! assert_eq!(call.query_parameter("startIndex"), Some("20"));
//! assert_eq!(call.query_parameter("archiveDateFrom"), Some("2024-01-01"));
//! assert_eq!(call.query_parameter("archiveDateTo"), None);
//! assert_eq!(call.query_parameter("baseStore"), Some("workspace://SpacesStore"));
//! ```

use serde_json::json;
use tracing::{debug, trace};

use crate::model::{
    ArchiveDateRange, CallDescriptor, FilterName, QueryParameters, RequestPayload, SelectedItem,
};
use crate::service::ServiceError;

pub const ARCHIVED_ITEMS_ENDPOINT: &str = "api/better-trash-management/archivedItems";
pub const BULK_DELETE_ENDPOINT: &str = "api/better-trash-management/archivedItems/bulkDelete";

/// Listing of archived items matching the request's filters.
pub fn build_list_query(request: &RequestPayload, default_store: &str) -> CallDescriptor {
    let mut params = paging(request);

    if let Some(operator) = &request.default_operator {
        params.set("defaultOperator", operator.as_str());
    }
    if let Some(template) = &request.default_query_template {
        params.set("defaultQueryTemplate", template.as_str());
    }

    let mut base_store_supplied = false;
    // Repeated names overwrite earlier values: the last occurrence wins.
    for filter in request.data_filters() {
        let Some(descriptor) = filter.recognize() else {
            trace!(name = %filter.name, "Dropping unsupported filter");
            continue;
        };
        match descriptor.name {
            FilterName::ArchiveDate => {
                let range = ArchiveDateRange::parse(&descriptor.value);
                if let Err(e) = range.validate(true) {
                    debug!(value = %descriptor.value, error = %e, "Archive date range sent as given");
                }
                if let Some(from) = range.from() {
                    params.set("archiveDateFrom", from);
                }
                if let Some(to) = range.to() {
                    params.set("archiveDateTo", to);
                }
            }
            name => {
                base_store_supplied |= name == FilterName::BaseStore;
                params.set(name.as_str(), descriptor.value);
            }
        }
    }

    if !base_store_supplied {
        params.set(FilterName::BaseStore.as_str(), default_store);
    }

    CallDescriptor::get(ARCHIVED_ITEMS_ENDPOINT, params)
}

/// Children of one archived node. Requires `nodeRef`.
pub fn build_browse_query(request: &RequestPayload) -> Result<CallDescriptor, ServiceError> {
    let node_ref = request.node_ref.as_deref().ok_or_else(|| {
        ServiceError::Validation("nodeRef is required to browse archived items".to_string())
    })?;
    let endpoint = format!(
        "{ARCHIVED_ITEMS_ENDPOINT}/{}/children",
        encode_node_ref_path(node_ref)
    );
    Ok(CallDescriptor::get(endpoint, paging(request)))
}

/// Flattens `selectedItems` (or `nodes`) into identifiers, keeping input order.
pub fn collect_node_refs(request: &RequestPayload) -> Vec<String> {
    request
        .selection()
        .iter()
        .filter_map(SelectedItem::node_ref)
        .map(str::to_string)
        .collect()
}

/// Purge of every selected archived node in a single call.
///
/// Fails with [`ServiceError::EmptySet`] when nothing usable was selected; no
/// call may be issued in that case.
pub fn build_bulk_delete(request: &RequestPayload) -> Result<CallDescriptor, ServiceError> {
    let nodes = collect_node_refs(request);
    if nodes.is_empty() {
        return Err(ServiceError::EmptySet);
    }
    Ok(CallDescriptor::post(BULK_DELETE_ENDPOINT, json!({ "nodes": nodes })))
}

/// `workspace://SpacesStore/abc` becomes `workspace/SpacesStore/abc`.
///
/// Runs of slashes (with an optional leading colon) collapse to one slash, and
/// every segment is percent-encoded like `encodeURI` would, keeping [`PATH_SAFE`]
/// characters as they are.
pub fn encode_node_ref_path(node_ref: &str) -> String {
    let mut collapsed = String::with_capacity(node_ref.len());
    let mut chars = node_ref.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek() == Some(&'/') => {}
            '/' => {
                while chars.peek() == Some(&'/') {
                    chars.next();
                }
                collapsed.push('/');
            }
            other => collapsed.push(other),
        }
    }
    collapsed
        .split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Reserved characters `encodeURI` leaves alone. `?` and `#` are still escaped
/// since they would end the path.
pub const PATH_SAFE: &[char] = &[':', '@', ';', ',', '=', '+', '$', '&', '!', '*', '\'', '(', ')'];

fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for piece in segment.split_inclusive(PATH_SAFE) {
        match piece.char_indices().last() {
            Some((at, c)) if PATH_SAFE.contains(&c) => {
                encoded.push_str(&urlencoding::encode(&piece[..at]));
                encoded.push(c);
            }
            _ => encoded.push_str(&urlencoding::encode(piece)),
        }
    }
    encoded
}

fn paging(request: &RequestPayload) -> QueryParameters {
    let mut params = QueryParameters::default();
    if let Some(page_size) = request.page_size {
        params.set("pageSize", page_size.to_string());
    }
    if let Some(page) = request.page {
        params.set("page", page.to_string());
    }
    if let (Some(page), Some(page_size)) = (request.page, request.page_size) {
        let start_index = (page - 1).saturating_mul(page_size);
        params.set("startIndex", start_index.to_string());
    }
    params
}
