pub mod http_client;
pub mod rate_limiter;

pub use http_client::ReqwestHttp;
pub use rate_limiter::{Limits, RateLimiter};
