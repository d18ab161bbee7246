use crate::error::{Result, ScanError};
use crate::result::PageVisit;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};
use url::Url;

/// Fallback page discovery when a site has no usable sitemap.
///
/// Breadth-first, same-origin, strictly sequential: one request in flight at
/// a time, sharing the serialized capture resource model of the rest of the
/// system. The visited set is keyed by normalized URL (fragment stripped,
/// trailing slash trimmed).
pub struct Crawler {
    client: Client,
    max_depth: usize,
    page_budget: usize,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Sitelens/0.1 (https://github.com/trapdoorsec/sitelens)")
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            max_depth: 3,
            page_budget: 150,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_page_budget(mut self, budget: usize) -> Self {
        self.page_budget = budget;
        self
    }

    pub async fn crawl(&self, start_url: &str) -> Result<Vec<PageVisit>> {
        info!("Starting crawl of {} (budget {} pages)", start_url, self.page_budget);

        let base = Url::parse(start_url)
            .map_err(|e| ScanError::InvalidUrl(format!("Invalid URL: {}", e)))?;

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        let mut visits: Vec<PageVisit> = Vec::new();

        visited.insert(normalize_url(start_url));
        queue.push_back((start_url.to_string(), 0));

        while let Some((url, depth)) = queue.pop_front() {
            if visits.len() >= self.page_budget {
                debug!("page budget reached, stopping crawl");
                break;
            }
            if depth >= self.max_depth {
                continue;
            }

            match self.fetch_and_parse(&url, &base).await {
                Ok(visit) => {
                    for link in &visit.links_found {
                        let key = normalize_url(link);
                        if visited.insert(key) {
                            queue.push_back((link.clone(), depth + 1));
                        }
                    }
                    visits.push(visit);
                }
                Err(e) => {
                    warn!("Crawl error for {}: {}", url, e);
                }
            }
        }

        info!("Crawl complete. Visited {} pages", visits.len());
        Ok(visits)
    }

    async fn fetch_and_parse(&self, url: &str, base: &Url) -> Result<PageVisit> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut visit = PageVisit::new(url.to_string());
        visit.status_code = status_code;
        visit.content_type = content_type.clone();

        let is_html = content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        if is_html {
            let body = response.text().await?;
            visit.links_found = extract_links(&body, url, base);
        }

        Ok(visit)
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// Same-origin links from an HTML document, resolved against `current_url`.
fn extract_links(html: &str, current_url: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").unwrap();

    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(current_url, href)
            && is_same_origin(&absolute_url, base)
        {
            links.push(absolute_url);
        }
    }
    links
}

fn resolve_url(base: &str, href: &str) -> Option<String> {
    // Skip empty, javascript:, mailto:, tel:, etc.
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    resolved.set_fragment(None);

    Some(resolved.to_string())
}

fn is_same_origin(url: &str, base: &Url) -> bool {
    Url::parse(url)
        .map(|u| u.origin() == base.origin())
        .unwrap_or(false)
}

/// Visited-set key: fragment stripped, trailing slash trimmed (except for
/// the bare root path).
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            let mut normalized = parsed.to_string();
            if parsed.path() != "/" && normalized.ends_with('/') {
                normalized.pop();
            }
            normalized
        }
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn html_page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string().into_bytes(), "text/html")
    }

    #[test]
    fn normalize_strips_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/a/#section"),
            "https://example.com/a"
        );
        assert_eq!(normalize_url("https://example.com/a/"), "https://example.com/a");
        assert_eq!(normalize_url("https://example.com/"), "https://example.com/");
        assert_eq!(normalize_url("not a url"), "not a url");
    }

    #[tokio::test]
    async fn crawl_discovers_same_origin_links() {
        let server = MockServer::start().await;

        let root_html = format!(
            r#"<html><body>
                <a href="{0}/page1">Page 1</a>
                <a href="/page2#frag">Page 2</a>
                <a href="https://other.test/away">Away</a>
                <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_page(&root_html))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page1"))
            .respond_with(html_page("<html><body>P1</body></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page2"))
            .respond_with(html_page("<html><body>P2</body></html>"))
            .mount(&server)
            .await;

        let crawler = Crawler::new().with_max_depth(2);
        let visits = crawler.crawl(&server.uri()).await.unwrap();

        assert_eq!(visits.len(), 3);
        let urls: Vec<&str> = visits.iter().map(|v| v.url.as_str()).collect();
        assert!(urls.iter().any(|u| u.ends_with("/page1")));
        assert!(urls.iter().any(|u| u.ends_with("/page2")));
        assert!(!urls.iter().any(|u| u.contains("other.test")));
    }

    #[tokio::test]
    async fn crawl_respects_depth_limit() {
        let server = MockServer::start().await;

        let root = format!(r#"<html><body><a href="{}/a">a</a></body></html>"#, server.uri());
        let a = format!(r#"<html><body><a href="{}/a/b">b</a></body></html>"#, server.uri());
        let b = format!(r#"<html><body><a href="{}/a/b/c">c</a></body></html>"#, server.uri());

        Mock::given(method("GET")).and(path("/")).respond_with(html_page(&root)).mount(&server).await;
        Mock::given(method("GET")).and(path("/a")).respond_with(html_page(&a)).mount(&server).await;
        Mock::given(method("GET")).and(path("/a/b")).respond_with(html_page(&b)).mount(&server).await;
        Mock::given(method("GET"))
            .and(path("/a/b/c"))
            .respond_with(html_page("<html><body>leaf</body></html>"))
            .mount(&server)
            .await;

        let crawler = Crawler::new().with_max_depth(2);
        let visits = crawler.crawl(&server.uri()).await.unwrap();

        // depth 0 (root) and depth 1 (/a) are fetched; /a/b sits at the
        // depth limit and is only enqueued.
        let urls: Vec<&str> = visits.iter().map(|v| v.url.as_str()).collect();
        assert!(urls.iter().any(|u| u.ends_with("/a")));
        assert!(!urls.iter().any(|u| u.ends_with("/a/b/c")));
    }

    #[tokio::test]
    async fn crawl_respects_page_budget() {
        let server = MockServer::start().await;

        let mut root_html = String::from("<html><body>");
        for i in 1..=10 {
            root_html.push_str(&format!(r#"<a href="{}/page{}">p{}</a>"#, server.uri(), i, i));
        }
        root_html.push_str("</body></html>");

        Mock::given(method("GET")).and(path("/")).respond_with(html_page(&root_html)).mount(&server).await;
        for i in 1..=10 {
            Mock::given(method("GET"))
                .and(path(format!("/page{}", i)))
                .respond_with(html_page("<html><body>Page</body></html>"))
                .mount(&server)
                .await;
        }

        let crawler = Crawler::new().with_max_depth(3).with_page_budget(4);
        let visits = crawler.crawl(&server.uri()).await.unwrap();
        assert_eq!(visits.len(), 4);
    }
}
