//! Platform timeline access.
//!
//! [`TimelineClient`] implements [`crate::PostSource`] against the web
//! GraphQL API, [`parser`] turns the raw responses into pages.

mod client;
pub mod parser;

#[cfg(test)]
mod client_tests;

pub use client::{
    TimelineClient, TimelineClientConfig, DEFAULT_COOKIE_DOMAINS, USER_BY_SCREEN_NAME,
    USER_TWEETS, WEB_BEARER_TOKEN,
};
