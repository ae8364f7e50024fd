//! HTTP API handlers for wkrec-se

pub mod article;
pub mod caption;
pub mod description;
pub mod health;
pub mod params;

pub use article::article_routes;
pub use caption::caption_routes;
pub use description::description_routes;
pub use health::health_routes;
