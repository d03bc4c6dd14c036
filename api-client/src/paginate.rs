use std::collections::VecDeque;
use std::fmt;

use futures::{future::BoxFuture, FutureExt};
use http::{HeaderMap, StatusCode, Uri};
use thiserror::Error;

use crate::error::BoxError;
use crate::request::try_clone_request;
use crate::uri::UriExtension as _;

/// A page of results could not be fetched or decoded.
#[derive(Debug, Error)]
#[error("Pagination error: {message}")]
pub struct PaginationError {
    status: Option<StatusCode>,
    message: String,
}

impl PaginationError {
    /// The HTTP status of the failed page, if the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

/// Information about the position of a page within a paginated listing.
pub trait PaginationInfo {
    /// Get the total number of pages
    fn pages(&self) -> Option<usize>;

    /// Get the current page number
    fn page(&self) -> Option<usize>;

    /// Create a request for the next page of results
    fn next(
        &self,
        req: http::Request<hyperdriver::Body>,
    ) -> Option<http::Request<hyperdriver::Body>>;
}

/// A single decoded page from a paginated API.
pub trait Paginator: PaginationInfo + Sized {
    /// The type of item that the paginator will return
    type Item;

    /// Decode a page from the response headers and body.
    fn decode(headers: &HeaderMap, body: &[u8]) -> Result<Self, BoxError>;

    /// Take all items from this page
    fn items(&mut self) -> Vec<Self::Item>;
}

/// Relations parsed from an RFC 8288 `Link` header.
///
/// GitHub advertises further pages this way:
/// `<https://api.github.com/organizations/1/repos?page=2>; rel="next", <…>; rel="last"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    /// The `rel="next"` target.
    pub next: Option<Uri>,
    /// The `rel="prev"` target.
    pub prev: Option<Uri>,
    /// The `rel="first"` target.
    pub first: Option<Uri>,
    /// The `rel="last"` target.
    pub last: Option<Uri>,
}

impl Links {
    /// Parse every `Link` header in a header map.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut links = Links::default();
        for value in headers.get_all(http::header::LINK) {
            match value.to_str() {
                Ok(value) => links.extend(value),
                Err(_) => tracing::warn!("Ignoring non-ascii Link header"),
            }
        }
        links
    }

    /// Parse a single `Link` header value.
    pub fn parse(value: &str) -> Self {
        let mut links = Links::default();
        links.extend(value);
        links
    }

    fn extend(&mut self, value: &str) {
        for entry in value.split(',') {
            let mut params = entry.split(';').map(str::trim);

            let Some(link) = params
                .next()
                .and_then(|t| t.strip_prefix('<'))
                .and_then(|t| t.strip_suffix('>'))
            else {
                continue;
            };

            let Ok(uri) = link.parse::<Uri>() else {
                tracing::warn!(%link, "Ignoring unparsable Link target");
                continue;
            };

            for param in params {
                let Some(rel) = param.strip_prefix("rel=") else {
                    continue;
                };

                for rel in rel.trim_matches('"').split_whitespace() {
                    let slot = match rel {
                        "next" => &mut self.next,
                        "prev" => &mut self.prev,
                        "first" => &mut self.first,
                        "last" => &mut self.last,
                        _ => continue,
                    };
                    *slot = Some(uri.clone());
                }
            }
        }
    }
}

fn page_number(uri: &Uri) -> Option<usize> {
    uri.query_value("page")?.parse().ok()
}

/// A page of a JSON array response, where navigation lives in the `Link` header.
#[derive(Debug, Clone)]
pub struct LinkPaginated<T> {
    items: Vec<T>,
    links: Links,
}

impl<T> LinkPaginated<T> {
    /// Create a page from items and its links.
    pub fn new(items: Vec<T>, links: Links) -> Self {
        Self { items, links }
    }

    /// The links advertised alongside this page.
    pub fn links(&self) -> &Links {
        &self.links
    }
}

impl<T> PaginationInfo for LinkPaginated<T> {
    fn pages(&self) -> Option<usize> {
        match &self.links.last {
            Some(last) => page_number(last),
            // On the last page, GitHub omits rel="last".
            None => self.page(),
        }
    }

    fn page(&self) -> Option<usize> {
        if let Some(next) = &self.links.next {
            return page_number(next).map(|n| n.saturating_sub(1));
        }
        self.links
            .prev
            .as_ref()
            .and_then(page_number)
            .map(|n| n + 1)
    }

    fn next(
        &self,
        mut req: http::Request<hyperdriver::Body>,
    ) -> Option<http::Request<hyperdriver::Body>> {
        let next = self.links.next.clone()?;
        *req.uri_mut() = next;
        Some(req)
    }
}

impl<T> Paginator for LinkPaginated<T>
where
    T: serde::de::DeserializeOwned,
{
    type Item = T;

    fn decode(headers: &HeaderMap, body: &[u8]) -> Result<Self, BoxError> {
        let items: Vec<T> = serde_json::from_slice(body)?;
        Ok(Self::new(items, Links::from_headers(headers)))
    }

    fn items(&mut self) -> Vec<Self::Item> {
        std::mem::take(&mut self.items)
    }
}

type NextPageFuture<P> = BoxFuture<'static, Result<Option<P>, BoxError>>;

enum PaginatedStreamState<T, P> {
    Query,
    Buffered(VecDeque<T>),
    Requesting(NextPageFuture<P>),
    Done,
}

/// A stream of items collected from a paginated API listing.
///
/// Pages are fetched lazily and strictly one at a time: the next page is only
/// requested once every item of the current page has been consumed.
#[pin_project::pin_project]
pub struct Paginated<A, T, P> {
    client: crate::ApiClient<A>,
    request: Option<http::Request<hyperdriver::Body>>,
    state: PaginatedStreamState<T, P>,
}

impl<A: fmt::Debug, T, P> fmt::Debug for Paginated<A, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginated")
            .field("client", &self.client)
            .field("request", &self.request)
            .finish()
    }
}

impl<A, T, P> Paginated<A, T, P> {
    /// Create a new paginated stream from an API client and the first request
    pub fn new(client: crate::ApiClient<A>, request: http::Request<hyperdriver::Body>) -> Self {
        Self {
            client,
            request: Some(request),
            state: PaginatedStreamState::Query,
        }
    }
}

impl<A, T, P> futures::Stream for Paginated<A, T, P>
where
    A: crate::Authentication + Send + Sync + 'static,
    T: Send + 'static,
    P: Paginator<Item = T> + Send + 'static,
{
    type Item = Result<T, BoxError>;

    fn poll_next(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        let this = self.project();
        match this.state {
            PaginatedStreamState::Query => {
                let Some(request) = this.request.as_ref() else {
                    tracing::trace!("No more pages to request, stream is done");
                    *this.state = PaginatedStreamState::Done;
                    return std::task::Poll::Ready(None);
                };

                let Some(request) = try_clone_request(request) else {
                    tracing::error!("Unable to clone the page request");
                    *this.state = PaginatedStreamState::Done;
                    return std::task::Poll::Ready(None);
                };

                tracing::trace!("Requesting page: {:?}", request.uri());

                let client = this.client.clone();
                let next_future: NextPageFuture<P> = Box::pin(async move {
                    let response = client.execute(request).await?;
                    let status = response.status();

                    if !status.is_success() {
                        let text = response.text().await?;
                        return Err(Box::new(PaginationError {
                            status: Some(status),
                            message: format!("{}: {}", status, text),
                        }) as BoxError);
                    }

                    let headers = response.headers().clone();
                    let body = response.bytes().await?;
                    Ok(Some(P::decode(&headers, &body)?))
                });

                *this.state = PaginatedStreamState::Requesting(next_future);
                cx.waker().wake_by_ref();
                std::task::Poll::Pending
            }
            PaginatedStreamState::Buffered(ref mut items) => {
                if let Some(item) = items.pop_front() {
                    std::task::Poll::Ready(Some(Ok(item)))
                } else {
                    tracing::trace!("Buffer is empty, requesting next page");
                    *this.state = PaginatedStreamState::Query;
                    cx.waker().wake_by_ref();
                    std::task::Poll::Pending
                }
            }
            PaginatedStreamState::Requesting(ref mut future) => match future.poll_unpin(cx) {
                std::task::Poll::Ready(Ok(Some(mut paginator))) => {
                    tracing::trace!(
                        "Paginated request on page {} of {}",
                        paginator.page().unwrap_or(0),
                        paginator.pages().unwrap_or(0)
                    );

                    *this.state = PaginatedStreamState::Buffered(VecDeque::from(paginator.items()));
                    if let Some(request) = this.request.take() {
                        *this.request = paginator.next(request);
                    }
                    cx.waker().wake_by_ref();
                    std::task::Poll::Pending
                }
                std::task::Poll::Ready(Ok(None)) => {
                    *this.state = PaginatedStreamState::Done;
                    std::task::Poll::Ready(None)
                }
                std::task::Poll::Ready(Err(error)) => {
                    *this.state = PaginatedStreamState::Done;
                    std::task::Poll::Ready(Some(Err(error)))
                }
                std::task::Poll::Pending => std::task::Poll::Pending,
            },
            PaginatedStreamState::Done => std::task::Poll::Ready(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_github_link_header() {
        let links = Links::parse(
            r#"<https://api.github.com/organizations/9/repos?per_page=10&page=2>; rel="next", <https://api.github.com/organizations/9/repos?per_page=10&page=3>; rel="last""#,
        );

        assert_eq!(
            links.next.unwrap().to_string(),
            "https://api.github.com/organizations/9/repos?per_page=10&page=2"
        );
        assert_eq!(
            links.last.unwrap().to_string(),
            "https://api.github.com/organizations/9/repos?per_page=10&page=3"
        );
        assert!(links.prev.is_none());
        assert!(links.first.is_none());
    }

    #[test]
    fn parse_ignores_garbage() {
        let links = Links::parse(r#"nonsense, <https://x.test/?page=2>; foo="bar""#);
        assert_eq!(links, Links::default());
    }

    #[test]
    fn page_numbers_from_links() {
        let page: LinkPaginated<u8> = LinkPaginated::new(
            vec![],
            Links::parse(
                r#"<https://x.test/r?page=1>; rel="prev", <https://x.test/r?page=3>; rel="next", <https://x.test/r?page=5>; rel="last""#,
            ),
        );
        assert_eq!(page.page(), Some(2));
        assert_eq!(page.pages(), Some(5));

        let last: LinkPaginated<u8> = LinkPaginated::new(
            vec![],
            Links::parse(r#"<https://x.test/r?page=4>; rel="prev""#),
        );
        assert_eq!(last.page(), Some(5));
        assert_eq!(last.pages(), Some(5));
    }

    #[test]
    fn next_rewrites_request_uri() {
        let page: LinkPaginated<u8> = LinkPaginated::new(
            vec![1, 2],
            Links::parse(r#"<https://x.test/r?page=2>; rel="next""#),
        );
        let req = http::Request::get("https://x.test/r")
            .header("x-keep", "yes")
            .body(hyperdriver::Body::empty())
            .unwrap();

        let next = page.next(req).unwrap();
        assert_eq!(next.uri().to_string(), "https://x.test/r?page=2");
        assert_eq!(next.headers()["x-keep"], "yes");

        let done: LinkPaginated<u8> = LinkPaginated::new(vec![], Links::default());
        let req = http::Request::get("https://x.test/r")
            .body(hyperdriver::Body::empty())
            .unwrap();
        assert!(done.next(req).is_none());
    }

    #[test]
    fn decode_reads_body_and_links() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::LINK,
            r#"<https://x.test/r?page=2>; rel="next""#.parse().unwrap(),
        );

        let mut page = LinkPaginated::<u32>::decode(&headers, b"[1, 2, 3]").unwrap();
        assert_eq!(page.items(), vec![1, 2, 3]);
        assert!(page.items().is_empty());
        assert!(page.links().next.is_some());
    }
}
