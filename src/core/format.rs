//! Channel post formatting.

use crate::models::NewsArticle;

/// Telegram limit for photo captions
pub const TELEGRAM_CAPTION_LIMIT: usize = 1024;
/// Telegram limit for text messages
pub const TELEGRAM_TEXT_LIMIT: usize = 4096;
/// VK wall post limit
pub const VK_TEXT_LIMIT: usize = 16384;

const TITLE_LIMIT: usize = 300;
const MORE_LABEL: &str = "Подробнее";
const ELLIPSIS: char = '…';

/// A ready-to-send Telegram post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramPost {
    /// HTML text, used as the caption when `photo_url` is set
    pub text: String,
    pub photo_url: Option<String>,
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut escaped, c);
    }
    escaped
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}

/// Escape `text` so the result is at most `limit` chars, ending in `…` when cut.
///
/// Entities are never split.
fn escape_truncated(text: &str, limit: usize) -> String {
    if limit == 0 {
        return String::new();
    }
    let full = escape_html(text);
    if full.chars().count() <= limit {
        return full;
    }

    let mut out = String::new();
    let mut used = 0;
    let mut buf = String::new();
    for c in text.chars() {
        buf.clear();
        push_escaped(&mut buf, c);
        let width = buf.chars().count();
        if used + width > limit - 1 {
            break;
        }
        out.push_str(&buf);
        used += width;
    }
    out.push(ELLIPSIS);
    out
}

/// Cut `text` to `limit` chars, ending in `…` when cut
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(limit - 1).collect();
    out.push(ELLIPSIS);
    out
}

fn body_of(article: &NewsArticle) -> &str {
    let content = article.content.trim();
    if !content.is_empty() {
        return content;
    }
    article.description.as_deref().map(str::trim).unwrap_or("")
}

fn link_of(article: &NewsArticle) -> Option<&str> {
    article.source_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
}

/// HTML post with a bold title, the body and a "more" link.
///
/// Uses a photo caption when the article has an image, so the whole text is
/// kept within the caption limit; otherwise within the message limit.
pub fn telegram_post(article: &NewsArticle) -> TelegramPost {
    let photo_url = article
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    let limit = if photo_url.is_some() {
        TELEGRAM_CAPTION_LIMIT
    } else {
        TELEGRAM_TEXT_LIMIT
    };

    let head = format!("<b>{}</b>", escape_truncated(article.title.trim(), TITLE_LIMIT));
    let mut tail = link_of(article)
        .map(|url| format!("\n\n🔗 <a href=\"{}\">{}</a>", escape_html(url), MORE_LABEL))
        .unwrap_or_default();
    if head.chars().count() + tail.chars().count() > limit {
        tail.clear();
    }

    let separator = "\n\n";
    let budget = limit
        .saturating_sub(head.chars().count() + tail.chars().count() + separator.chars().count());
    let body = escape_truncated(body_of(article), budget);

    let text = if body.is_empty() {
        format!("{head}{tail}")
    } else {
        format!("{head}{separator}{body}{tail}")
    };

    TelegramPost { text, photo_url }
}

/// Plain-text post for the VK wall
pub fn vk_post(article: &NewsArticle) -> String {
    let title = article.title.trim();
    let tail = link_of(article)
        .map(|url| format!("\n\n🔗 {}: {}", MORE_LABEL, url))
        .unwrap_or_default();

    let budget = VK_TEXT_LIMIT.saturating_sub(title.chars().count() + tail.chars().count() + 2);
    let body = truncate_chars(body_of(article), budget);

    if body.is_empty() {
        truncate_chars(&format!("{title}{tail}"), VK_TEXT_LIMIT)
    } else {
        truncate_chars(&format!("{title}\n\n{body}{tail}"), VK_TEXT_LIMIT)
    }
}
