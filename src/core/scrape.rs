//! HTML extraction for the news source.
//!
//! Pure functions over a downloaded page: no I/O happens here so the rules
//! can be exercised against fixtures.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::config::ScraperSettings;
use crate::models::ScrapedItem;

/// Width of `news_articles.title`
pub const MAX_TITLE_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Compiled selectors and limits used to pull items out of a page
#[derive(Debug)]
pub struct ScrapeRules {
    card_selectors: Vec<Selector>,
    image_selector: Option<Selector>,
    title: Selector,
    description: Selector,
    link: Selector,
    any_image: Selector,
    date: Selector,
    max_items: usize,
    min_title_chars: usize,
}

impl ScrapeRules {
    pub fn from_settings(settings: &ScraperSettings) -> Result<Self, ScrapeError> {
        let card_selectors = settings
            .card_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        let image_selector = Some(settings.image_selector.trim())
            .filter(|s| !s.is_empty())
            .map(parse_selector)
            .transpose()?;

        Ok(Self {
            card_selectors,
            image_selector,
            title: parse_selector("h2, h3, a")?,
            description: parse_selector("p")?,
            link: parse_selector("a[href]")?,
            any_image: parse_selector("img")?,
            date: parse_selector("time, .date")?,
            max_items: settings.max_items,
            min_title_chars: settings.min_title_chars,
        })
    }

    /// Extract up to `max_items` items from `html`.
    ///
    /// Card selectors are tried in order and the first one matching anything wins.
    pub fn extract(&self, html: &str, base_url: &Url) -> Vec<ScrapedItem> {
        let document = Html::parse_document(html);

        let Some(cards) = self.card_selectors.iter().find_map(|selector| {
            let cards: Vec<ElementRef> = document.select(selector).collect();
            (!cards.is_empty()).then_some(cards)
        }) else {
            return Vec::new();
        };

        cards
            .into_iter()
            .filter_map(|card| self.parse_card(card, base_url))
            .take(self.max_items)
            .collect()
    }

    fn parse_card(&self, card: ElementRef, base_url: &Url) -> Option<ScrapedItem> {
        let title = first_heading_text(card, &self.title)?;
        if title.is_empty() || title.chars().count() < self.min_title_chars {
            return None;
        }
        let title: String = title.chars().take(MAX_TITLE_CHARS).collect();

        let description = card
            .select(&self.description)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let source_url = card
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_url(base_url, href));

        let image_url = self
            .image_selector
            .as_ref()
            .and_then(|selector| card.select(selector).next())
            .or_else(|| card.select(&self.any_image).next())
            .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
            .and_then(|src| resolve_url(base_url, src));

        let published_date = card.select(&self.date).next().and_then(|el| {
            parse_ru_date(&element_text(el)).or_else(|| {
                el.value()
                    .attr("datetime")
                    .and_then(|dt| dt.get(..10))
                    .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            })
        });

        Some(ScrapedItem {
            title,
            description,
            source_url,
            image_url,
            published_date,
        })
    }
}

/// Title comes from the first `h2`, then `h3`, then `a` inside the card
fn first_heading_text(card: ElementRef, selector: &Selector) -> Option<String> {
    let candidates: Vec<ElementRef> = card.select(selector).collect();
    ["h2", "h3", "a"].iter().find_map(|tag| {
        candidates
            .iter()
            .find(|el| el.value().name() == *tag)
            .map(|el| element_text(*el))
            .filter(|text| !text.is_empty())
    })
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_selector(s: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(s).map_err(|e| ScrapeError::InvalidSelector {
        selector: s.to_string(),
        message: format!("{e:?}"),
    })
}

/// Resolve `raw` against the page URL; empty and non-http links yield `None`
pub fn resolve_url(base_url: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let resolved = base_url.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Parse a `dd.mm.YYYY` date, ignoring surrounding text
pub fn parse_ru_date(text: &str) -> Option<NaiveDate> {
    text.split_whitespace()
        .find_map(|word| NaiveDate::parse_from_str(word.trim_matches(|c: char| !c.is_ascii_digit()), "%d.%m.%Y").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScrapeRules {
        ScrapeRules::from_settings(&ScraperSettings::default()).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://sberanalytics.ru/products").unwrap()
    }

    #[test]
    fn test_extracts_product_cards() {
        let html = r#"
            <ul>
              <li class="section-card-product__list">
                <a href="/products/sales"><h2> СберАналитика   Продажи </h2></a>
                <p>Аналитика продаж для бизнеса</p>
                <img class="other" src="/img/bg.png">
                <img class="section-card-product__img-product" src="/img/sales.png">
                <span class="date">05.03.2026</span>
              </li>
              <li class="section-card-product__list">
                <h3>Без ссылки</h3>
              </li>
            </ul>
        "#;

        let items = rules().extract(html, &base());
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title, "СберАналитика Продажи");
        assert_eq!(first.description, "Аналитика продаж для бизнеса");
        assert_eq!(first.source_url.as_deref(), Some("https://sberanalytics.ru/products/sales"));
        assert_eq!(first.image_url.as_deref(), Some("https://sberanalytics.ru/img/sales.png"));
        assert_eq!(first.published_date, NaiveDate::from_ymd_opt(2026, 3, 5));

        assert_eq!(items[1].title, "Без ссылки");
        assert_eq!(items[1].source_url, None);
        assert_eq!(items[1].description, "");
    }

    #[test]
    fn test_falls_back_to_later_card_selectors() {
        let html = r#"
            <article><h3>Первая</h3><a href="https://other.example/a">читать</a></article>
            <div class="news-item"><h2>Не должна попасть</h2></div>
        "#;

        let items = rules().extract(html, &base());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Первая");
        assert_eq!(items[0].source_url.as_deref(), Some("https://other.example/a"));
    }

    #[test]
    fn test_respects_max_items_and_min_title() {
        let mut settings = ScraperSettings::default();
        settings.max_items = 2;
        settings.min_title_chars = 5;
        let rules = ScrapeRules::from_settings(&settings).unwrap();

        let html = r#"
            <article><h2>Кор</h2></article>
            <article><h2>Первая новость</h2></article>
            <article><h2>Вторая новость</h2></article>
            <article><h2>Третья новость</h2></article>
        "#;

        let titles: Vec<String> = rules.extract(html, &base()).into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["Первая новость", "Вторая новость"]);
    }

    #[test]
    fn test_no_cards() {
        assert!(rules().extract("<html><body><p>пусто</p></body></html>", &base()).is_empty());
    }

    #[test]
    fn test_parse_ru_date() {
        assert_eq!(parse_ru_date("Опубликовано 16.10.2026"), NaiveDate::from_ymd_opt(2026, 10, 16));
        assert_eq!(parse_ru_date("31.02.2026"), None);
        assert_eq!(parse_ru_date("вчера"), None);
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url(&base(), "").as_deref(), None);
        assert_eq!(resolve_url(&base(), "javascript:void(0)"), None);
        assert_eq!(
            resolve_url(&base(), "sales").as_deref(),
            Some("https://sberanalytics.ru/sales")
        );
    }

    #[test]
    fn test_invalid_selector() {
        let mut settings = ScraperSettings::default();
        settings.card_selectors = vec!["[[invalid".to_string()];
        assert!(matches!(
            ScrapeRules::from_settings(&settings),
            Err(ScrapeError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_long_headings_fit_the_title_column() {
        let heading = "Отчёт ".repeat(150);
        let html = format!(
            r#"<li class="section-card-product__list"><a href="/r"><h2>{heading}</h2></a></li>"#
        );

        let items = rules().extract(&html, &base());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.chars().count(), MAX_TITLE_CHARS);
        assert!(items[0].title.starts_with("Отчёт Отчёт"));
    }
}
