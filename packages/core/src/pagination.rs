//! Limit/offset pagination and collection navigation links.
//!
//! | Link | Offset | Emitted when |
//! |------|--------|--------------|
//! | `self` | current | always |
//! | `first` | 0 | no parent scope |
//! | `prev` | `max(offset - limit, 0)` | no parent scope, offset > 0 |
//! | `next` | `offset + limit` | no parent scope, `offset + limit < total` |
//! | `last` | `max(total - limit, 0)` | no parent scope |
//!
//! Every link repeats the caller's query parameters (except `total`) with
//! the computed `offset`, keys sorted and percent-encoded.

use std::collections::BTreeMap;

use serde_json::json;

use crate::envelope::WireDocument;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 20;

const LIMIT: &str = "limit";
const OFFSET: &str = "offset";
const TOTAL: &str = "total";

/// Parsed list parameters. Unparsable numbers are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub total: Option<i64>,
    /// Every other query parameter, carried into generated links.
    pub passthrough: BTreeMap<String, String>,
}

impl PageParams {
    pub fn from_query(query: &BTreeMap<String, String>) -> Self {
        let number = |key: &str| query.get(key).and_then(|v| v.trim().parse::<i64>().ok());
        Self {
            limit: number(LIMIT),
            offset: number(OFFSET),
            total: number(TOTAL),
            passthrough: query
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), LIMIT | OFFSET | TOTAL))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(i64::try_from(total).unwrap_or(i64::MAX));
        self
    }

    /// The bounded page this request asks for.
    pub fn page(&self) -> Page {
        Page {
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
            total: self.total.unwrap_or(0).max(0),
        }
    }
}

/// Effective, bounded page values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

impl Page {
    /// Index range into a backing list of `len` items.
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(len);
        let end = start
            .saturating_add(usize::try_from(self.limit).unwrap_or(0))
            .min(len);
        start..end
    }
}

/// Store `meta.total` and navigation links on `doc`.
pub fn apply_pagination(doc: &mut WireDocument, params: &PageParams) -> Page {
    let page = params.page();
    doc.meta.insert(TOTAL.into(), json!(page.total));

    let root = doc.collection_url();
    let link = |offset: i64| page_url(&root, params, page.limit, offset);

    doc.links.self_link = Some(link(page.offset));
    if doc.parent.is_none() {
        doc.links.first = Some(link(0));
        if page.offset > 0 {
            doc.links.prev = Some(link(page.offset.saturating_sub(page.limit).max(0)));
        }
        let next = page.offset.saturating_add(page.limit);
        if next < page.total {
            doc.links.next = Some(link(next));
        }
        doc.links.last = Some(link((page.total - page.limit).max(0)));
    }
    page
}

// --- helpers -----------------------------------------------------------------

fn page_url(root: &str, params: &PageParams, limit: i64, offset: i64) -> String {
    let mut query = params.passthrough.clone();
    query.insert(OFFSET.into(), offset.to_string());
    // The effective limit is only echoed back when the client chose one.
    if params.limit.is_some() {
        query.insert(LIMIT.into(), limit.to_string());
    }
    let encoded: Vec<String> = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{root}?{}", encoded.join("&"))
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ParentRef;
    use crate::value::EntityId;

    fn doc() -> WireDocument {
        WireDocument {
            base_url: "https://api.example.com/v1".into(),
            collection_path: "recalls".into(),
            ..WireDocument::default()
        }
    }

    fn params(pairs: &[(&str, &str)]) -> PageParams {
        let query = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PageParams::from_query(&query)
    }

    #[test]
    fn oversized_limit_is_capped_and_next_omitted() {
        let mut d = doc();
        let page = apply_pagination(&mut d, &params(&[("limit", "50"), ("offset", "40"), ("total", "45")]));
        assert_eq!(page, Page { limit: 20, offset: 40, total: 45 });
        assert_eq!(d.meta["total"], json!(45));
        let base = "https://api.example.com/v1/recalls";
        assert_eq!(d.links.self_link.as_deref(), Some(&*format!("{base}?limit=20&offset=40")));
        assert_eq!(d.links.first.as_deref(), Some(&*format!("{base}?limit=20&offset=0")));
        assert_eq!(d.links.prev.as_deref(), Some(&*format!("{base}?limit=20&offset=20")));
        assert_eq!(d.links.next, None);
        assert_eq!(d.links.last.as_deref(), Some(&*format!("{base}?limit=20&offset=25")));
    }

    #[test]
    fn defaults_and_floors() {
        assert_eq!(params(&[]).page(), Page { limit: DEFAULT_PAGE_SIZE, offset: 0, total: 0 });
        assert_eq!(
            params(&[("limit", "0"), ("offset", "-5"), ("total", "-1")]).page(),
            Page { limit: 1, offset: 0, total: 0 }
        );
        assert_eq!(params(&[("limit", "lots"), ("offset", "x")]).page().limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn empty_collection_has_last_at_zero_and_no_next() {
        let mut d = doc();
        apply_pagination(&mut d, &params(&[]));
        assert_eq!(d.links.last.as_deref(), Some("https://api.example.com/v1/recalls?offset=0"));
        assert_eq!(d.links.next, None);
        assert_eq!(d.links.prev, None);
    }

    #[test]
    fn passthrough_params_are_sorted_encoded_and_total_stripped() {
        let mut d = doc();
        let p = params(&[("q", "fire hazard"), ("category", "toys&games"), ("total", "30")]);
        apply_pagination(&mut d, &p);
        assert_eq!(
            d.links.next.as_deref(),
            Some("https://api.example.com/v1/recalls?category=toys%26games&offset=10&q=fire%20hazard")
        );
        assert!(!d.links.self_link.unwrap().contains("total"));
    }

    #[test]
    fn parent_scope_gets_only_self() {
        let mut d = doc();
        d.collection_path = "products".into();
        d.parent = Some(ParentRef::new("recalls", EntityId::new("r1")));
        apply_pagination(&mut d, &params(&[("offset", "10"), ("total", "40")]));
        assert_eq!(
            d.links.self_link.as_deref(),
            Some("https://api.example.com/v1/recalls/r1/products?offset=10")
        );
        assert!(d.links.first.is_none() && d.links.prev.is_none());
        assert!(d.links.next.is_none() && d.links.last.is_none());
    }

    #[test]
    fn huge_offset_does_not_overflow() {
        let mut d = doc();
        let max = i64::MAX.to_string();
        let page = apply_pagination(&mut d, &params(&[("offset", &max), ("total", "3")]));
        assert_eq!(page.offset, i64::MAX);
        assert_eq!(d.links.next, None);
        assert_eq!(
            d.links.prev.as_deref(),
            Some(&*format!("https://api.example.com/v1/recalls?offset={}", i64::MAX - 10))
        );
        assert_eq!(page.window(3), 3..3);
    }

    #[test]
    fn window_clips_to_backing_list() {
        let page = Page { limit: 10, offset: 5, total: 12 };
        assert_eq!(page.window(12), 5..12);
        assert_eq!(Page { limit: 10, offset: 30, total: 12 }.window(12), 12..12);
    }

    #[test]
    fn with_total_overrides_query_total() {
        let p = params(&[("total", "3")]).with_total(42);
        assert_eq!(p.page().total, 42);
    }
}
