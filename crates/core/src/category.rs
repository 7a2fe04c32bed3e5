//! Category pool cache for Wikipedia vital-article listings.
//!
//! Each [`Category`] maps to one curated "vital articles" listing page. The
//! first pick for a category scrapes that page once and caches every article
//! link it finds for the lifetime of the process; later picks draw uniformly
//! at random from the cached pool without touching the network.
//!
//! The cache is a process-wide `RwLock` map. Two requests racing to populate
//! the same empty category may both scrape; the last successful write wins,
//! which is acceptable because the pool is read-mostly data with no
//! correctness requirement on which successful scrape is retained. A
//! non-empty pool is never refetched, and a failed or empty scrape caches
//! nothing so the next pick retries.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use scraper::{Html, Selector};

use crate::fetch::{FetchConfig, fetch_url};
use crate::{Result, VitalisError};

/// Absolute origin prepended to relative article links.
pub const WIKI_ORIGIN: &str = "https://en.wikipedia.org";

/// Path prefix shared by every article page.
pub const ARTICLE_PATH_PREFIX: &str = "/wiki/";

/// The fixed set of topical categories served by this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Physics,
    Technology,
    Economics,
}

impl Category {
    /// All known categories, in presentation order.
    pub const ALL: [Category; 3] = [Category::Physics, Category::Technology, Category::Economics];

    /// The vital-articles listing page scraped to build this category's pool.
    pub fn listing_url(self) -> &'static str {
        match self {
            Category::Physics => "https://en.wikipedia.org/wiki/Wikipedia:Vital_articles/Level/4/Physical_sciences",
            Category::Technology => "https://en.wikipedia.org/wiki/Wikipedia:Vital_articles/Level/4/Technology",
            Category::Economics => {
                "https://en.wikipedia.org/wiki/Wikipedia:Vital_articles/Level/4/Society_and_social_sciences"
            }
        }
    }

    /// The caller-facing key for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Physics => "physics",
            Category::Technology => "technology",
            Category::Economics => "economics",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = VitalisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "physics" => Ok(Category::Physics),
            "technology" => Ok(Category::Technology),
            "economics" => Ok(Category::Economics),
            _ => Err(VitalisError::UnknownCategory(s.to_string())),
        }
    }
}

static CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("#mw-content-text").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Process-wide pool cache, category -> relative article links.
static POOLS: Lazy<RwLock<HashMap<Category, Vec<String>>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Picks one random vital article for a category and returns its absolute URL.
///
/// The first call for a category scrapes its listing page and caches the
/// link pool; subsequent calls pick from the cache without any network
/// traffic. Transport errors, non-2xx statuses, and listing pages without
/// usable article links all leave the cache untouched.
pub async fn pick_random_article(category: Category, config: &FetchConfig) -> Result<String> {
    if let Some(link) = pick_cached(category) {
        return Ok(format!("{WIKI_ORIGIN}{link}"));
    }

    tracing::debug!(%category, "pool cache miss, scraping listing page");
    let html = fetch_url(category.listing_url(), config).await?;
    let links = scrape_article_links(&html);

    let Some(picked) = links.choose(&mut rand::thread_rng()).cloned() else {
        return Err(VitalisError::EmptyPool(category));
    };

    tracing::info!(%category, count = links.len(), "category pool populated");
    cache_pool(category, links);

    Ok(format!("{WIKI_ORIGIN}{picked}"))
}

/// Collects every article link from a listing page's main content region.
///
/// Keeps hyperlinks that start with the article path prefix, contain no
/// namespace separator, and do not point at the site's main page. This
/// filters out category, file, talk, and template links.
pub fn scrape_article_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let Some(content) = document.select(&CONTENT_SELECTOR).next() else {
        return Vec::new();
    };

    content
        .select(&LINK_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| is_article_link(href))
        .map(str::to_string)
        .collect()
}

fn is_article_link(href: &str) -> bool {
    href.starts_with(ARTICLE_PATH_PREFIX) && !href.contains(':') && !href.contains("Main_Page")
}

fn pick_cached(category: Category) -> Option<String> {
    let pools = POOLS.read().ok()?;
    pools
        .get(&category)
        .and_then(|links| links.choose(&mut rand::thread_rng()))
        .cloned()
}

fn cache_pool(category: Category, links: Vec<String>) {
    // Last write wins if two requests raced to populate the same category.
    if let Ok(mut pools) = POOLS.write() {
        pools.insert(category, links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_HTML: &str = r##"
        <html><body>
        <div id="mw-content-text">
            <a href="/wiki/Atom">Atom</a>
            <a href="/wiki/Energy">Energy</a>
            <a href="/wiki/Category:Physics">Category</a>
            <a href="/wiki/File:Atom.svg">File</a>
            <a href="/wiki/Wikipedia:Vital_articles">Project page</a>
            <a href="/wiki/Main_Page">Main page</a>
            <a href="https://example.com/wiki/External">External</a>
            <a href="#cite_note-1">Footnote</a>
        </div>
        </body></html>
    "##;

    #[test]
    fn test_scrape_article_links_filters_namespaces() {
        let links = scrape_article_links(LISTING_HTML);
        assert_eq!(links, vec!["/wiki/Atom".to_string(), "/wiki/Energy".to_string()]);
    }

    #[test]
    fn test_scrape_article_links_requires_content_region() {
        let links = scrape_article_links("<html><body><a href=\"/wiki/Atom\">Atom</a></body></html>");
        assert!(links.is_empty());
    }

    #[test]
    fn test_is_article_link() {
        assert!(is_article_link("/wiki/Quantum_mechanics"));
        assert!(!is_article_link("/wiki/Talk:Quantum_mechanics"));
        assert!(!is_article_link("/wiki/Main_Page"));
        assert!(!is_article_link("/w/index.php?title=Atom"));
    }

    #[test]
    fn test_category_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_unknown_category() {
        let err = "astrology".parse::<Category>().unwrap_err();
        assert!(matches!(err, VitalisError::UnknownCategory(_)));
    }

    #[test]
    fn test_listing_urls_are_absolute() {
        for category in Category::ALL {
            assert!(category.listing_url().starts_with(WIKI_ORIGIN));
        }
    }

    #[test]
    fn test_pool_cache_last_write_wins() {
        // Uses one category end to end so parallel tests never share state.
        let first = vec!["/wiki/Money".to_string()];
        let second = vec!["/wiki/Trade".to_string(), "/wiki/Bank".to_string()];

        cache_pool(Category::Economics, first);
        assert_eq!(pick_cached(Category::Economics), Some("/wiki/Money".to_string()));

        cache_pool(Category::Economics, second.clone());
        let picked = pick_cached(Category::Economics).unwrap();
        assert!(second.contains(&picked));
    }
}
