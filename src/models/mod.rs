// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ActionCount, Ad, AdCategory, Banner, BannerPosition, NewsArticle, NewsStats, NewsStatus,
    OfferViews, Order, OrderStatus, PartnerOffer, ScrapedItem, Service, ServicePopularity,
    ServiceViews, User, UserAction, UserActivitySummary, UserProfileSummary, UserReport,
};
pub use requests::{
    ActionsQuery, AdPayload, AdminCreateUserRequest, AdminLoginRequest, AdminNewsQuery, AdsQuery,
    BannerPayload, BannersQuery, CreateOrderRequest, IconUploadRequest, LogActionRequest,
    LoginRequest, NewsListQuery, NewsPayload, OffersQuery, OrdersQuery, PartnerOfferPayload,
    RegisterRequest, ScheduleUpdateRequest, ServicePayload, UpdateOrderStatusRequest,
    UpdateUserRequest,
};
pub use responses::{
    ActionLoggedResponse, AdminTokenResponse, AdminUserCreatedResponse, CreatedResponse,
    DeleteResponse, ErrorResponse, HealthResponse, IconUploadResponse, NewsListResponse, NewsPage,
    OrderCreatedResponse, PublishResponse, SuccessResponse, TelegramChannel,
    TelegramChannelsResponse, UserSessionResponse,
};
