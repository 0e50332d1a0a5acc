pub mod api;
pub mod auth;
pub mod fetcher;
pub mod generation;
pub mod post_url;


pub use api::{parse_post_listing, parse_user_avatar, RedditPostData, RedditUserAbout};
pub use auth::{AccessToken, TokenCache, TokenProvider, TokenProviderConfig};
pub use fetcher::{FetchStrategy, PostFetcher};
pub use generation::{GenerationTicket, RequestGeneration};
pub use post_url::{extract_post_id, json_api_path, normalize_post_url};
