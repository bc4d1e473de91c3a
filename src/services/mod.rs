// Service exports
pub mod ai;
pub mod auth;
pub mod cache;
pub mod fetcher;
pub mod icons;
pub mod postgres;
pub mod telegram;
pub mod vk;

pub use ai::{AiClient, AiError};
pub use auth::{AuthError, Claims, TokenIssuer};
pub use cache::{CacheError, CacheKey, CatalogCache};
pub use fetcher::{FetchError, PageFetcher};
pub use icons::{IconError, IconStore};
pub use postgres::{BannerCounter, NewUser, PostgresClient, PostgresError, UserCredentials};
pub use telegram::{TelegramClient, TelegramError};
pub use vk::{VkClient, VkError};
