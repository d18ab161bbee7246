use crate::error::{Result, ScanError};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};
use url::Url;

/// Upper bound on sitemap documents fetched per discovery, nested indexes
/// included.
pub const MAX_SITEMAP_FETCHES: usize = 16;

/// One `<url>` entry from a sitemap document.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
}

/// A parsed sitemap document: either an index of nested sitemaps or a page
/// list.
#[derive(Debug, PartialEq)]
pub enum SitemapContents {
    Index(Vec<String>),
    Pages(Vec<SitemapEntry>),
}

/// Discover the site's page URLs from its sitemap(s).
///
/// Candidate sitemap locations come from `robots.txt` `Sitemap:` lines with
/// `<origin>/sitemap.xml` as the fallback probe. Nested index files are
/// followed transitively up to [`MAX_SITEMAP_FETCHES`] documents. Page URLs
/// outside the base origin are dropped. Fails when no page URL can be
/// discovered at all, which callers treat as "fall back to crawling".
pub async fn discover_site_urls(client: &Client, base: &Url) -> Result<Vec<String>> {
    let mut queue: VecDeque<String> = sitemap_candidates(client, base).await.into();
    let mut seen_maps: HashSet<String> = queue.iter().cloned().collect();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut urls: Vec<String> = Vec::new();
    let mut fetched = 0usize;

    while let Some(sitemap_url) = queue.pop_front() {
        if fetched >= MAX_SITEMAP_FETCHES {
            warn!("sitemap fetch cap reached, ignoring remaining index entries");
            break;
        }
        fetched += 1;

        let Some(body) = fetch_text(client, &sitemap_url).await else {
            continue;
        };

        match parse_sitemap(body.as_bytes()) {
            Ok(SitemapContents::Index(nested)) => {
                debug!("{} is a sitemap index with {} entries", sitemap_url, nested.len());
                for loc in nested {
                    if seen_maps.insert(loc.clone()) {
                        queue.push_back(loc);
                    }
                }
            }
            Ok(SitemapContents::Pages(entries)) => {
                debug!("{} lists {} pages", sitemap_url, entries.len());
                for entry in entries {
                    if !same_origin(&entry.loc, base) {
                        continue;
                    }
                    if seen_urls.insert(entry.loc.clone()) {
                        urls.push(entry.loc);
                    }
                }
            }
            Err(e) => {
                warn!("failed to parse sitemap {}: {}", sitemap_url, e);
            }
        }
    }

    if urls.is_empty() {
        Err(ScanError::Sitemap(format!(
            "no sitemap URLs discovered for {base}"
        )))
    } else {
        Ok(urls)
    }
}

/// Sitemap locations to try, in probe order: robots.txt pointers first, the
/// conventional `/sitemap.xml` path last.
async fn sitemap_candidates(client: &Client, base: &Url) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Ok(robots_url) = base.join("/robots.txt")
        && let Some(body) = fetch_text(client, robots_url.as_str()).await
    {
        for line in body.lines() {
            let line = line.trim();
            if let Some(prefix) = line.get(..8)
                && prefix.eq_ignore_ascii_case("sitemap:")
                && let Some(loc) = line.get(8..)
            {
                let loc = loc.trim();
                if !loc.is_empty() && !candidates.contains(&loc.to_string()) {
                    candidates.push(loc.to_string());
                }
            }
        }
    }

    if let Ok(default) = base.join("/sitemap.xml") {
        let default = default.to_string();
        if !candidates.contains(&default) {
            candidates.push(default);
        }
    }

    candidates
}

async fn fetch_text(client: &Client, url: &str) -> Option<String> {
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => response.text().await.ok(),
        Ok(response) => {
            debug!("{} answered {}", url, response.status());
            None
        }
        Err(e) => {
            debug!("fetching {} failed: {}", url, e);
            None
        }
    }
}

fn same_origin(url: &str, base: &Url) -> bool {
    Url::parse(url)
        .map(|u| u.origin() == base.origin())
        .unwrap_or(false)
}

/// Parse sitemap XML bytes into either an index or a page list.
///
/// Only `<loc>` and `<lastmod>` are read; other sitemap-protocol fields are
/// skipped. The document kind is decided by the root element
/// (`<sitemapindex>` vs `<urlset>`).
pub fn parse_sitemap(xml: &[u8]) -> Result<SitemapContents> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut is_index = false;
    let mut saw_root = false;
    let mut in_loc = false;
    let mut in_lastmod = false;
    let mut loc = String::new();
    let mut lastmod = String::new();

    let mut nested: Vec<String> = Vec::new();
    let mut entries: Vec<SitemapEntry> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" => {
                    is_index = true;
                    saw_root = true;
                }
                b"urlset" => {
                    saw_root = true;
                }
                b"url" | b"sitemap" => {
                    loc.clear();
                    lastmod.clear();
                }
                b"loc" => in_loc = true,
                b"lastmod" => in_lastmod = true,
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_loc || in_lastmod {
                    let text = t
                        .unescape()
                        .map_err(|e| ScanError::Sitemap(e.to_string()))?;
                    if in_loc {
                        loc.push_str(text.trim());
                    } else {
                        lastmod.push_str(text.trim());
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"loc" => in_loc = false,
                b"lastmod" => in_lastmod = false,
                b"url" => {
                    if !loc.is_empty() {
                        entries.push(SitemapEntry {
                            loc: loc.clone(),
                            lastmod: (!lastmod.is_empty()).then(|| lastmod.clone()),
                        });
                    }
                }
                b"sitemap" => {
                    if !loc.is_empty() {
                        nested.push(loc.clone());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ScanError::Sitemap(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ScanError::Sitemap("not a sitemap document".to_string()));
    }

    if is_index {
        Ok(SitemapContents::Index(nested))
    } else {
        Ok(SitemapContents::Pages(entries))
    }
}
