use crate::model::{ParsedUrlInfo, ROOT_PATH};
use url::Url;

/// Classify one URL relative to the site origin: depth, segments and branch
/// (first path segment, or the root sentinel). Unparseable and foreign-origin
/// URLs yield `None`; callers filter, they never error. No side effects.
pub fn parse_url_info(url: &str, base: &Url) -> Option<ParsedUrlInfo> {
    let parsed = Url::parse(url).ok()?;
    if parsed.origin() != base.origin() {
        return None;
    }

    let segments: Vec<String> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let depth = segments.len();
    let branch = segments
        .first()
        .cloned()
        .unwrap_or_else(|| ROOT_PATH.to_string());
    let path = if segments.is_empty() {
        ROOT_PATH.to_string()
    } else {
        format!("/{}/", segments.join("/"))
    };

    Some(ParsedUrlInfo {
        url: url.to_string(),
        path,
        depth,
        branch,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn classifies_root() {
        let info = parse_url_info("https://example.com/", &base()).unwrap();
        assert_eq!(info.depth, 0);
        assert_eq!(info.branch, "/");
        assert_eq!(info.path, "/");
        assert!(info.segments.is_empty());
    }

    #[test]
    fn classifies_nested_path() {
        let info = parse_url_info("https://example.com/docs/api/v2", &base()).unwrap();
        assert_eq!(info.depth, 3);
        assert_eq!(info.branch, "docs");
        assert_eq!(info.path, "/docs/api/v2/");
        assert_eq!(info.segments, vec!["docs", "api", "v2"]);
    }

    #[test]
    fn trailing_slash_does_not_change_depth() {
        let a = parse_url_info("https://example.com/docs", &base()).unwrap();
        let b = parse_url_info("https://example.com/docs/", &base()).unwrap();
        assert_eq!(a.depth, b.depth);
        assert_eq!(a.path, b.path);
    }

    #[test]
    fn drops_unparseable_and_foreign() {
        assert!(parse_url_info("not a url", &base()).is_none());
        assert!(parse_url_info("https://other.test/x", &base()).is_none());
    }
}
