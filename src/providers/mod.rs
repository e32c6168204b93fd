pub mod api;
pub mod caching;
pub mod util;

pub use api::ApiClient;
pub use caching::CachingCurrencyService;
