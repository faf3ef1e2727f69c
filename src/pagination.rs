use axum::http::{HeaderMap, Uri, header};
use serde::{Deserialize, Serialize};

/// Pagination query parameters
///
/// Kept as raw strings: a malformed value disables paging instead of failing the
/// request.
#[derive(Debug, Default, Deserialize)]
pub struct LimitOffset {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Paginated response wrapper
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// A list endpoint's body: a page when `?limit=` was given, the bare list otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page(Page<T>),
    All(Vec<T>),
}

impl<T> Listing<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        match self {
            Listing::Page(page) => Listing::Page(Page {
                count: page.count,
                next: page.next,
                previous: page.previous,
                results: page.results.into_iter().map(f).collect(),
            }),
            Listing::All(items) => Listing::All(items.into_iter().map(f).collect()),
        }
    }
}

impl LimitOffset {
    fn limit(&self, max: usize) -> Option<usize> {
        self.limit
            .as_deref()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(max))
    }

    fn offset(&self) -> usize {
        self.offset
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    pub fn paginate<T>(&self, items: Vec<T>, max: usize, link: &PageLink) -> Listing<T> {
        let Some(limit) = self.limit(max) else {
            return Listing::All(items);
        };
        let offset = self.offset();
        let count = items.len();

        let end = offset.saturating_add(limit);
        let next = (end < count).then(|| link.to(limit, Some(end)));
        let previous = (offset > 0).then(|| {
            if offset <= limit {
                link.to(limit, None)
            } else {
                link.to(limit, Some(offset - limit))
            }
        });

        Listing::Page(Page {
            count,
            next,
            previous,
            results: items.into_iter().skip(offset).take(limit).collect(),
        })
    }
}

/// Builds `next`/`previous` URLs from the request that produced the page.
#[derive(Debug, Clone)]
pub struct PageLink {
    base: String,
    extra_query: Vec<String>,
}

impl PageLink {
    pub fn from_request(headers: &HeaderMap, uri: &Uri) -> Self {
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok());
        let base = match host {
            Some(host) => format!("http://{}{}", host, uri.path()),
            None => uri.path().to_string(),
        };

        let extra_query = uri
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| {
                let key = pair.split('=').next().unwrap_or_default();
                key != "limit" && key != "offset"
            })
            .map(str::to_string)
            .collect();

        Self { base, extra_query }
    }

    fn to(&self, limit: usize, offset: Option<usize>) -> String {
        let mut query = vec![format!("limit={limit}")];
        if let Some(offset) = offset {
            query.push(format!("offset={offset}"));
        }
        query.extend(self.extra_query.iter().cloned());
        format!("{}?{}", self.base, query.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>, offset: Option<&str>) -> LimitOffset {
        LimitOffset {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
        }
    }

    fn link() -> PageLink {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "api.test".parse().unwrap());
        PageLink::from_request(&headers, &"/v1/posts/?limit=2&offset=2&q=x".parse().unwrap())
    }

    fn page<T: std::fmt::Debug>(listing: Listing<T>) -> Page<T> {
        match listing {
            Listing::Page(page) => page,
            Listing::All(items) => panic!("expected a page, got {items:?}"),
        }
    }

    #[test]
    fn without_limit_everything_is_returned() {
        let items: Vec<u32> = (0..5).collect();
        for query in [params(None, Some("2")), params(Some("0"), None), params(Some("x"), None)] {
            assert!(matches!(query.paginate(items.clone(), 100, &link()), Listing::All(all) if all.len() == 5));
        }
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = page(params(Some("2"), Some("2")).paginate((0..5).collect::<Vec<u32>>(), 100, &link()));

        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![2, 3]);
        assert_eq!(page.next.as_deref(), Some("http://api.test/v1/posts/?limit=2&offset=4&q=x"));
        assert_eq!(page.previous.as_deref(), Some("http://api.test/v1/posts/?limit=2&q=x"));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = page(params(Some("2"), Some("4")).paginate((0..5).collect::<Vec<u32>>(), 100, &link()));

        assert_eq!(page.results, vec![4]);
        assert!(page.next.is_none());
        assert_eq!(page.previous.as_deref(), Some("http://api.test/v1/posts/?limit=2&offset=2&q=x"));
    }

    #[test]
    fn limit_is_clamped() {
        let page = page(params(Some("50"), None).paginate((0..20).collect::<Vec<u32>>(), 10, &link()));
        assert_eq!(page.results.len(), 10);
        assert!(page.previous.is_none());
        assert!(page.next.is_some());
    }

    #[test]
    fn offset_past_the_end_is_empty() {
        let page = page(params(Some("2"), Some("10")).paginate((0..3).collect::<Vec<u32>>(), 100, &link()));
        assert!(page.results.is_empty());
        assert_eq!(page.count, 3);
    }

    #[test]
    fn largest_offset_does_not_overflow() {
        let max = usize::MAX.to_string();
        let page = page(params(Some("2"), Some(&max)).paginate((0..3).collect::<Vec<u32>>(), 100, &link()));

        assert!(page.results.is_empty());
        assert!(page.next.is_none());
        let previous = page.previous.unwrap_or_default();
        assert!(previous.contains(&format!("offset={}", usize::MAX - 2)));
    }
}
