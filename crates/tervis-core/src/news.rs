//! Health news extraction and fallback content.
//!
//! Pages are parsed with `scraper` and queried with CSS selectors: article
//! links contain `/news/`, and each article page is expected to carry either
//! an `<h1>` or Open Graph tags. When nothing usable comes back the caller
//! serves [`fallback_articles`] instead.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use url::Url;

use crate::models::NewsArticle;
use crate::text::truncate_chars;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 80;
const SOURCE_DESCRIPTION_MAX_CHARS: usize = 150;

const DEFAULT_IMAGE: &str =
    "https://images.pexels.com/photos/4173239/pexels-photo-4173239.jpeg?auto=compress&cs=tinysrgb&w=600";
const DEFAULT_DESCRIPTION: &str = "Read the latest health news from HealthNews Today";
const DEFAULT_TITLE: &str = "Health News";

const ARTICLE_LINK: &str = r#"a[href*="/news/"]"#;

/// A CSS selector and the attribute to read from its match. `None` reads the
/// element's text instead.
type Lookup = (&'static str, Option<&'static str>);

const TITLE_LOOKUPS: &[Lookup] = &[("h1", None), (r#"meta[property="og:title"]"#, Some("content"))];
const DESCRIPTION_LOOKUPS: &[Lookup] = &[
    (r#"meta[property="og:description"]"#, Some("content")),
    (r#"meta[name="description"]"#, Some("content")),
];
const IMAGE_LOOKUPS: &[Lookup] = &[
    (r#"meta[property="og:image"]"#, Some("content")),
    ("img[src]", Some("src")),
];

/// Article fields as found on the page, before translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub link: String,
    pub title: String,
    pub description: String,
    pub image: String,
}

/// Collects unique absolute `/news/` links from a front page, in page order.
pub fn extract_article_links(html: &str, base: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse(ARTICLE_LINK) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut links: Vec<String> = Vec::new();
    for href in document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
    {
        let Ok(absolute) = base.join(href.trim()) else {
            continue;
        };
        let absolute = absolute.to_string();
        if !links.contains(&absolute) {
            links.push(absolute);
        }
    }
    links
}

/// First non-blank value across the lookups, with whitespace collapsed.
/// Entities are already decoded by the parser.
fn first_value(document: &Html, lookups: &[Lookup]) -> Option<String> {
    lookups.iter().find_map(|&(css, attr)| {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).find_map(|element| {
            let raw = match attr {
                Some(attr) => element.value().attr(attr)?.to_string(),
                None => element.text().collect::<String>(),
            };
            let value = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            (!value.is_empty()).then_some(value)
        })
    })
}

/// Builds a title from the URL slug: `/news/new-heart-study` → "New Heart Study".
pub fn title_from_slug(link: &str) -> Option<String> {
    let slug = link.split("/news/").nth(1)?.trim_matches('/');
    if slug.is_empty() {
        return None;
    }
    let title = slug
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Some(title)
}

/// Extracts title, description and image from an article page.
pub fn extract_article(html: &str, link: &str, base: &Url) -> ArticleDraft {
    let document = Html::parse_document(html);

    let title = first_value(&document, TITLE_LOOKUPS)
        .or_else(|| title_from_slug(link))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let description = first_value(&document, DESCRIPTION_LOOKUPS)
        .map(|d| d.chars().take(SOURCE_DESCRIPTION_MAX_CHARS).collect())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let image = first_value(&document, IMAGE_LOOKUPS)
        .and_then(|src| base.join(&src).ok().map(|u| u.to_string()))
        .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

    ArticleDraft {
        link: link.to_string(),
        title,
        description,
        image,
    }
}

/// Turns a (possibly translated) draft into the card served to clients.
pub fn finalize(draft: ArticleDraft, published: DateTime<Utc>) -> NewsArticle {
    NewsArticle {
        title: truncate_chars(&draft.title, TITLE_MAX_CHARS),
        link: draft.link,
        pub_date: published,
        description: truncate_chars(&draft.description, DESCRIPTION_MAX_CHARS),
        image: draft.image,
    }
}

/// Keeps scraped articles, or substitutes the fallback list when there are none.
pub fn or_fallback(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    if articles.is_empty() {
        fallback_articles(Utc::now())
    } else {
        articles
    }
}

/// Fixed cards served when the news source is unavailable.
pub fn fallback_articles(now: DateTime<Utc>) -> Vec<NewsArticle> {
    const FRONT_PAGE: &str = "https://healthnews.today/";
    let entries: [(&str, &str, &str, &str); 10] = [
        (
            "Hawaii Deploys Lab-Bred Mosquitoes to Save Endangered Native Birds",
            "https://healthnews.today/news/hawaii-deploys-lab-bred-mosquitoes-to-save-endangered-native-birds",
            "Scientists release mosquitoes to combat avian malaria threatening native bird species...",
            "https://images.pexels.com/photos/4173239/pexels-photo-4173239.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Latest Advances in Medical Research",
            FRONT_PAGE,
            "Revolutionary discoveries in health science and medicine...",
            "https://images.pexels.com/photos/4101143/pexels-photo-4101143.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Mental Health Awareness Initiatives",
            FRONT_PAGE,
            "New programs focus on breaking stigmas and improving access...",
            "https://images.pexels.com/photos/4101143/pexels-photo-4101143.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Nutrition Science Breakthroughs",
            FRONT_PAGE,
            "Research reveals new insights about healthy eating patterns...",
            "https://images.pexels.com/photos/1640777/pexels-photo-1640777.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Telemedicine Expansion Continues",
            FRONT_PAGE,
            "Virtual care options increase access to healthcare services...",
            "https://images.pexels.com/photos/4386466/pexels-photo-4386466.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Exercise Benefits for Heart Health",
            FRONT_PAGE,
            "Regular physical activity reduces risk of cardiovascular disease...",
            "https://images.pexels.com/photos/4498606/pexels-photo-4498606.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Cancer Early Detection Methods",
            FRONT_PAGE,
            "New screening technologies improve early diagnosis rates...",
            "https://images.pexels.com/photos/3825517/pexels-photo-3825517.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Gut Health and Immunity Connection",
            FRONT_PAGE,
            "Microbiome research shows impact on immune system function...",
            "https://images.pexels.com/photos/1640770/pexels-photo-1640770.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Sleep Quality Improvement Strategies",
            FRONT_PAGE,
            "Expert tips for better sleep and overall health outcomes...",
            "https://images.pexels.com/photos/3771069/pexels-photo-3771069.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
        (
            "Chronic Disease Prevention Focus",
            FRONT_PAGE,
            "Lifestyle changes reduce risk of chronic health conditions...",
            "https://images.pexels.com/photos/4498365/pexels-photo-4498365.jpeg?auto=compress&cs=tinysrgb&w=600",
        ),
    ];

    entries
        .into_iter()
        .map(|(title, link, description, image)| NewsArticle {
            title: title.to_string(),
            link: link.to_string(),
            pub_date: now,
            description: description.to_string(),
            image: image.to_string(),
        })
        .collect()
}
