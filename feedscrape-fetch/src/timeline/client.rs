//! Timeline client using browser session cookies.
//!
//! Talks to the platform's web API with the same headers a logged-in
//! browser sends: the public web bearer token, the session cookies and
//! the `ct0` CSRF token echoed in `x-csrf-token`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use feedscrape_core::{CoreError, Cursor, Page, DEFAULT_API_BASE};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::parser::{self, VerifiedAccount};
use crate::error::{FetchError, HttpError, SessionError};
use crate::host::{HttpClient, ResponseExt, Session};
use crate::source::{Credentials, PostSource};

// ============================================================================
// Constants
// ============================================================================

/// Domains whose cookies are sent to the API.
pub const DEFAULT_COOKIE_DOMAINS: [&str; 2] = ["x.com", "twitter.com"];

/// Bearer token of the public web client.
pub const WEB_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

/// Account verification endpoint, relative to the API base.
const VERIFY_CREDENTIALS: &str = "1.1/account/verify_credentials.json";

/// GraphQL operation resolving a handle to a user id.
pub const USER_BY_SCREEN_NAME: &str = "xmU6X_CKVnQ5lSrCbAmJsg/UserByScreenName";

/// GraphQL operation returning a user's timeline.
pub const USER_TWEETS: &str = "V7H0Ap3_Hh2FyS75OCDO3Q/UserTweets";

// ============================================================================
// Configuration
// ============================================================================

/// Settings for [`TimelineClient`].
#[derive(Debug, Clone)]
pub struct TimelineClientConfig {
    /// Base URL of the web API.
    pub api_base: String,
    /// Bearer token sent with every request.
    pub bearer_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Only cookies of these domains (and their subdomains) are sent.
    pub cookie_domains: Vec<String>,
}

impl Default for TimelineClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bearer_token: WEB_BEARER_TOKEN.to_string(),
            timeout: Duration::from_secs(crate::host::http::DEFAULT_TIMEOUT_SECS),
            cookie_domains: DEFAULT_COOKIE_DOMAINS.iter().map(ToString::to_string).collect(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// [`PostSource`] backed by the platform's web API.
#[derive(Debug)]
pub struct TimelineClient {
    http: HttpClient,
    api_base: Url,
    headers: HeaderMap,
    user_ids: Mutex<HashMap<String, String>>,
}

impl TimelineClient {
    /// Creates a client that authenticates with `session`.
    ///
    /// Requests are only allowed to the host of `config.api_base`, and only
    /// cookies of `config.cookie_domains` are taken from the session.
    pub fn new(config: TimelineClientConfig, session: &Session) -> Result<Self, FetchError> {
        let mut api_base = Url::parse(&config.api_base)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {e}", config.api_base)))?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        let host = api_base
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl(format!("{}: no host", config.api_base)))?
            .to_string();

        let http = HttpClient::with_timeout(config.timeout)?.with_allowed_domains(vec![host]);
        let headers = build_headers(&config.bearer_token, &session.for_domains(&config.cookie_domains))?;

        Ok(Self {
            http,
            api_base,
            headers,
            user_ids: Mutex::new(HashMap::new()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.api_base
            .join(path)
            .map_err(|e| HttpError::InvalidUrl(e.to_string()).into())
    }

    fn graphql_url(&self, operation: &str, variables: &Value) -> Result<Url, FetchError> {
        let mut url = self.endpoint(&format!("graphql/{operation}"))?;
        url.query_pairs_mut()
            .append_pair("variables", &variables.to_string())
            .append_pair("features", &features().to_string());
        Ok(url)
    }

    /// Sends a GET and maps the platform's status codes to errors.
    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get_with_headers(url.as_str(), self.headers.clone()).await?;

        let rate = response.rate_limit();
        debug!(
            limit = ?rate.limit,
            remaining = ?rate.remaining,
            reset = ?rate.reset,
            "Rate limit status"
        );

        if response.is_rate_limited() {
            let retry_after = rate.secs_until_reset().or_else(|| response.retry_after_secs());
            return Err(FetchError::RateLimited { retry_after });
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::AuthenticationFailed(format!(
                "session rejected ({status}), export fresh cookies"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, len = body.len(), "API request failed");
            return Err(FetchError::InvalidResponse(format!("Unexpected status code: {status}")));
        }

        let body = response.bytes().await?;
        debug!(len = body.len(), "Received API response");
        Ok(body.to_vec())
    }

    /// Resolves a handle to the platform's numeric user id.
    #[instrument(skip(self))]
    async fn user_id(&self, handle: &str) -> Result<String, FetchError> {
        let key = handle.to_ascii_lowercase();
        if let Some(id) = self.user_ids.lock().await.get(&key) {
            return Ok(id.clone());
        }

        let variables = json!({
            "screen_name": handle,
            "withSafetyModeUserFields": true,
        });
        let body = self.get_bytes(self.graphql_url(USER_BY_SCREEN_NAME, &variables)?).await?;

        let id = parser::parse_user_id(&body)?
            .ok_or_else(|| FetchError::UserNotFound(handle.to_string()))?;

        debug!(user_id = %id, "Resolved handle");
        self.user_ids.lock().await.insert(key, id.clone());
        Ok(id)
    }
}

#[async_trait]
impl PostSource for TimelineClient {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<(), FetchError> {
        if !self.headers.contains_key(COOKIE) {
            return Err(FetchError::AuthenticationFailed(
                "session has no valid auth_token cookie (missing or expired)".to_string(),
            ));
        }
        if credentials.password.is_some() {
            debug!("Password ignored, the session cookies authenticate the client");
        }

        let body = self.get_bytes(self.endpoint(VERIFY_CREDENTIALS)?).await?;
        let account: VerifiedAccount = serde_json::from_slice(&body)?;

        if !credentials.username.is_empty()
            && !account.screen_name.eq_ignore_ascii_case(&credentials.username)
        {
            return Err(FetchError::AuthenticationFailed(format!(
                "session belongs to @{}, not @{}",
                account.screen_name, credentials.username
            )));
        }

        info!(account = %account.screen_name, "Logged in");
        Ok(())
    }

    #[instrument(skip(self, cursor))]
    async fn fetch_page(
        &self,
        handle: &str,
        page_size: u32,
        cursor: Cursor,
    ) -> Result<Page, FetchError> {
        let user_id = self.user_id(handle).await?;

        let mut variables = json!({
            "userId": user_id,
            "count": page_size,
            "includePromotedContent": false,
            "withQuickPromoteEligibilityTweetFields": false,
            "withVoice": true,
            "withV2Timeline": true,
        });
        if !cursor.is_end() {
            variables["cursor"] = Value::String(cursor.as_str().to_string());
        }

        let body = self.get_bytes(self.graphql_url(USER_TWEETS, &variables)?).await?;
        let mut page = parser::parse_timeline(&body)?;

        if !cursor.is_end() && page.next_cursor == cursor {
            debug!("Bottom cursor repeated, end of timeline");
            page.next_cursor = Cursor::start();
        }
        Ok(page)
    }
}

fn build_headers(bearer_token: &str, session: &Session) -> Result<HeaderMap, FetchError> {
    let invalid = |what: &str| {
        FetchError::Session(SessionError::InvalidCookie(CoreError::InvalidData(format!(
            "{what} contains characters not allowed in a header"
        ))))
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {bearer_token}")).map_err(|_| invalid("bearer token"))?,
    );
    headers.insert("x-twitter-active-user", HeaderValue::from_static("yes"));
    headers.insert("x-twitter-client-language", HeaderValue::from_static("en"));

    if session.has_auth_token() {
        let cookie = session.cookie_header();
        let mut value = HeaderValue::from_str(&cookie).map_err(|_| invalid("session cookie"))?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
        headers.insert("x-twitter-auth-type", HeaderValue::from_static("OAuth2Session"));
    }

    if let Some(token) = session.csrf_token() {
        let mut value = HeaderValue::from_str(token).map_err(|_| invalid("ct0 cookie"))?;
        value.set_sensitive(true);
        headers.insert("x-csrf-token", value);
    }

    Ok(headers)
}

/// Feature switches the GraphQL endpoints require.
fn features() -> Value {
    json!({
        "rweb_tipjar_consumption_enabled": true,
        "responsive_web_graphql_exclude_directive_enabled": true,
        "verified_phone_label_enabled": false,
        "creator_subscriptions_tweet_preview_api_enabled": true,
        "responsive_web_graphql_timeline_navigation_enabled": true,
        "responsive_web_graphql_skip_user_profile_image_extensions_enabled": false,
        "communities_web_enable_tweet_community_results_fetch": true,
        "c9s_tweet_anatomy_moderator_badge_enabled": true,
        "tweetypie_unmention_optimization_enabled": true,
        "responsive_web_edit_tweet_api_enabled": true,
        "graphql_is_translatable_rweb_tweet_is_translatable_enabled": true,
        "view_counts_everywhere_api_enabled": true,
        "longform_notetweets_consumption_enabled": true,
        "responsive_web_twitter_article_tweet_consumption_enabled": true,
        "tweet_awards_web_tipping_enabled": false,
        "freedom_of_speech_not_reach_fetch_enabled": true,
        "standardized_nudges_misinfo": true,
        "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled": true,
        "rweb_video_timestamps_enabled": true,
        "longform_notetweets_rich_text_read_enabled": true,
        "longform_notetweets_inline_media_enabled": true,
        "responsive_web_enhance_cards_enabled": false,
        "hidden_profile_likes_enabled": true,
        "highlights_tweets_tab_ui_enabled": true,
        "subscriptions_verification_info_is_identity_verified_enabled": true,
        "subscriptions_verification_info_verified_since_enabled": true,
    })
}
