// Core pipeline exports
pub mod agent_log;
pub mod format;
pub mod password;
pub mod pipeline;
pub mod scheduler;
pub mod scrape;

pub use agent_log::{AgentLog, LogEntry, LogLevel};
pub use format::{escape_html, telegram_post, vk_post, TelegramPost};
pub use pipeline::{
    AutoReport, NewsPipeline, NewsStore, PipelineError, PipelineRunner, ProcessReport,
    PublishReport, ScrapeReport, StepOutcome,
};
pub use scheduler::{AutoScheduler, ScheduleConfig, ScheduleStatus};
pub use scrape::{ScrapeError, ScrapeRules};
