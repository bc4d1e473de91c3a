// Criterion benchmarks for Kupets API

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kupets_api::config::ScraperSettings;
use kupets_api::core::{escape_html, telegram_post, vk_post, ScrapeRules};
use kupets_api::models::{NewsArticle, NewsStatus};
use url::Url;

fn product_page(cards: usize) -> String {
    let mut html = String::from("<html><body><ul>");
    for i in 0..cards {
        html.push_str(&format!(
            r#"<li class="section-card-product__list">
                 <a href="/products/{i}"><h2>Продукт {i}</h2></a>
                 <p>Описание продукта номер {i} для малого и среднего бизнеса</p>
                 <img class="section-card-product__img-product" src="/img/{i}.png">
                 <span class="date">0{d}.10.2026</span>
               </li>"#,
            i = i,
            d = i % 9 + 1
        ));
    }
    html.push_str("</ul></body></html>");
    html
}

fn article(content: &str) -> NewsArticle {
    NewsArticle {
        id: 1,
        title: "Кредит для бизнеса <до 5 млн>".to_string(),
        description: None,
        content: content.to_string(),
        badge: None,
        source_url: Some("https://sberanalytics.ru/products?utm=1&ref=kupets".to_string()),
        image_url: Some("https://sberanalytics.ru/img/1.png".to_string()),
        status: NewsStatus::Ready,
        published_date: None,
        telegram_message_id: None,
        vk_post_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn bench_scrape(c: &mut Criterion) {
    let settings = ScraperSettings {
        max_items: usize::MAX,
        ..ScraperSettings::default()
    };
    let rules = ScrapeRules::from_settings(&settings).unwrap();
    let base = Url::parse("https://sberanalytics.ru/products").unwrap();

    let mut group = c.benchmark_group("scrape_extract");
    for cards in [10, 100, 500].iter() {
        let html = product_page(*cards);
        group.bench_with_input(BenchmarkId::from_parameter(cards), &html, |b, html| {
            b.iter(|| rules.extract(black_box(html), black_box(&base)))
        });
    }
    group.finish();
}

fn bench_format(c: &mut Criterion) {
    let short = article("Новый продукт для предпринимателей & партнёров.");
    let long = article(&"Очень длинный текст новости с <разметкой> & спецсимволами. ".repeat(200));

    c.bench_function("telegram_post_short", |b| b.iter(|| telegram_post(black_box(&short))));
    c.bench_function("telegram_post_truncated", |b| b.iter(|| telegram_post(black_box(&long))));
    c.bench_function("vk_post_truncated", |b| b.iter(|| vk_post(black_box(&long))));
    c.bench_function("escape_html", |b| b.iter(|| escape_html(black_box(&long.content))));
}

criterion_group!(benches, bench_scrape, bench_format);
criterion_main!(benches);
