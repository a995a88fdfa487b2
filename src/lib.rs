pub mod config;
pub mod cooldown;
pub mod demo_feed;
pub mod http_client;
pub mod paging;
pub mod persist;
pub mod player_fetch;
pub mod provider;
pub mod roster;
pub mod scroll;
pub mod session;
pub mod state;
