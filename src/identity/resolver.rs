use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::ProblemIdentifier;
use crate::page::{first_non_empty, PageContent, TITLE_SELECTORS};

/// Length of the URL token appended to a title-based identifier.
const TITLE_TOKEN_LEN: usize = 20;

/// Used when even the URL encodes to nothing.
const EMPTY_PAGE_TOKEN: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformPattern {
    pub name: String,
    /// Regex with one capture group holding the problem slug.
    pub pattern: String,
}

impl PlatformPattern {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new("leetcode", r"leetcode\.com/problems/([^/]+)"),
            Self::new("hackerrank", r"hackerrank\.com/challenges/([^/]+)"),
            Self::new("codeforces", r"codeforces\.com/problemset/problem/([^/]+)"),
        ]
    }
}

struct PlatformMatcher {
    name: String,
    regex: Regex,
}

/// Derives a stable [`ProblemIdentifier`] for the page being viewed.
///
/// Resolution order:
/// 1. Platform URL patterns, first match wins, slug used verbatim
/// 2. Stripped page title joined with a short URL token
/// 3. The URL token alone
///
/// Two unmatched pages whose stripped titles and token prefixes coincide
/// share an identifier.
pub struct IdentifierResolver {
    matchers: Vec<PlatformMatcher>,
}

impl IdentifierResolver {
    pub fn from_patterns(patterns: &[PlatformPattern]) -> Result<Self> {
        let matchers = patterns
            .iter()
            .map(|p| {
                let regex = Regex::new(&p.pattern)
                    .with_context(|| format!("Invalid pattern for platform {}", p.name))?;
                Ok(PlatformMatcher {
                    name: p.name.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { matchers })
    }

    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.matchers.iter().map(|m| m.name.as_str())
    }

    pub fn resolve(&self, page_url: &str, page: &dyn PageContent) -> ProblemIdentifier {
        if let Some(slug) = self.match_platform(page_url) {
            return ProblemIdentifier::new(slug);
        }

        let token = url_token(page_url);
        match first_non_empty(page, TITLE_SELECTORS) {
            Some(title) => {
                let short: String = token.chars().take(TITLE_TOKEN_LEN).collect();
                ProblemIdentifier::new(format!("{}_{}", strip_non_alphanumeric(&title), short))
            }
            None => {
                tracing::debug!("No title on page; identifying {} by URL token", page_url);
                ProblemIdentifier::new(token)
            }
        }
    }

    fn match_platform(&self, page_url: &str) -> Option<String> {
        self.matchers.iter().find_map(|m| {
            m.regex
                .captures(page_url)
                .and_then(|c| c.get(1))
                .map(|slug| {
                    tracing::trace!("URL matched platform {}", m.name);
                    slug.as_str().to_string()
                })
                .filter(|slug| !slug.is_empty())
        })
    }
}

impl Default for IdentifierResolver {
    fn default() -> Self {
        let matchers = PlatformPattern::builtin()
            .into_iter()
            .filter_map(|p| match Regex::new(&p.pattern) {
                Ok(regex) => Some(PlatformMatcher { name: p.name, regex }),
                Err(e) => {
                    tracing::error!("Skipping platform {}: {}", p.name, e);
                    None
                }
            })
            .collect();
        Self { matchers }
    }
}

/// Opaque token for `origin + path`: base64 with `+`, `/` and `=` removed.
pub fn url_token(page_url: &str) -> String {
    let normalized = match Url::parse(page_url) {
        Ok(url) => format!("{}{}", url.origin().ascii_serialization(), url.path()),
        Err(_) => page_url.to_string(),
    };

    let token: String = STANDARD
        .encode(normalized.as_bytes())
        .chars()
        .filter(|c| !matches!(c, '+' | '/' | '='))
        .collect();

    if token.is_empty() {
        EMPTY_PAGE_TOKEN.to_string()
    } else {
        token
    }
}

fn strip_non_alphanumeric(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageSnapshot;

    fn resolve(url: &str, page: &PageSnapshot) -> String {
        IdentifierResolver::default().resolve(url, page).to_string()
    }

    #[test]
    fn leetcode_url_resolves_to_slug() {
        let url = "https://leetcode.com/problems/two-sum/";
        assert_eq!(resolve(url, &PageSnapshot::new(url)), "two-sum");
    }

    #[test]
    fn leetcode_subpage_resolves_to_same_slug() {
        let url = "https://leetcode.com/problems/two-sum/description/?envType=daily";
        assert_eq!(resolve(url, &PageSnapshot::new(url)), "two-sum");
    }

    #[test]
    fn hackerrank_and_codeforces_slugs() {
        let hr = "https://www.hackerrank.com/challenges/simple-array-sum/problem";
        assert_eq!(resolve(hr, &PageSnapshot::new(hr)), "simple-array-sum");

        let cf = "https://codeforces.com/problemset/problem/1850/A";
        assert_eq!(resolve(cf, &PageSnapshot::new(cf)), "1850");
    }

    #[test]
    fn platform_match_ignores_page_title() {
        let url = "https://leetcode.com/problems/two-sum/";
        let page = PageSnapshot::new(url).with_element("h1", "Something Else");
        assert_eq!(resolve(url, &page), "two-sum");
    }

    #[test]
    fn unmatched_url_with_title_builds_composite() {
        let url = "https://example.com/practice/42?tab=editor#top";
        let page = PageSnapshot::new(url).with_element("h1", "Longest Path (Hard)!");

        let id = resolve(url, &page);
        let token = url_token(url);
        assert_eq!(id, format!("LongestPathHard_{}", &token[..20]));
    }

    #[test]
    fn unmatched_url_without_title_uses_full_token() {
        let url = "https://example.com/practice/42";
        assert_eq!(resolve(url, &PageSnapshot::new(url)), url_token(url));
    }

    #[test]
    fn url_token_drops_query_and_fragment() {
        assert_eq!(
            url_token("https://example.com/a/b?x=1#frag"),
            url_token("https://example.com/a/b")
        );
    }

    #[test]
    fn url_token_has_no_padding_or_symbols() {
        let token = url_token("https://example.com/a");
        assert!(!token.is_empty());
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn empty_url_still_resolves() {
        assert_eq!(resolve("", &PageSnapshot::new("")), EMPTY_PAGE_TOKEN);
    }

    #[test]
    fn from_patterns_rejects_invalid_regex() {
        let result = IdentifierResolver::from_patterns(&[PlatformPattern::new("bad", "(")]);
        assert!(result.is_err());
    }

    #[test]
    fn custom_pattern_is_honoured_in_order() {
        let mut patterns = vec![PlatformPattern::new("atcoder", r"atcoder\.jp/contests/[^/]+/tasks/([^/]+)")];
        patterns.extend(PlatformPattern::builtin());
        let resolver = IdentifierResolver::from_patterns(&patterns).unwrap();

        let url = "https://atcoder.jp/contests/abc300/tasks/abc300_a";
        assert_eq!(resolver.resolve(url, &PageSnapshot::new(url)).as_str(), "abc300_a");
        assert_eq!(resolver.platforms().next(), Some("atcoder"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::page::PageSnapshot;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn leetcode_slug_is_returned_verbatim(slug in "[a-z0-9][a-z0-9-]{0,40}") {
            let url = format!("https://leetcode.com/problems/{slug}/");
            let resolver = IdentifierResolver::default();
            let page = PageSnapshot::new(url.clone());

            let first = resolver.resolve(&url, &page);
            let second = resolver.resolve(&url, &page);
            prop_assert_eq!(first.as_str(), slug.as_str());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn arbitrary_input_never_yields_empty_identifier(
            url in ".{0,80}",
            title in proptest::option::of(".{0,40}")
        ) {
            let mut page = PageSnapshot::new(url.clone());
            if let Some(title) = title {
                page = page.with_element("h1", title);
            }

            let id = IdentifierResolver::default().resolve(&url, &page);
            prop_assert!(!id.as_str().is_empty());
        }
    }
}
