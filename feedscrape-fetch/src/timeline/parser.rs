//! Timeline response parsing.
//!
//! The GraphQL timeline nests every post several levels deep:
//!
//! ```text
//! data.user.result.timeline_v2.timeline.instructions[]
//!   .entries[]  entryId "tweet-…"         → content.itemContent.tweet_results.result
//!               entryId "profile-conv…"   → content.items[].item.itemContent.tweet_results.result
//!               entryId "cursor-bottom-…" → content.value
//! ```
//!
//! Every level is optional in practice, so all fields are `Option` and
//! unknown entries are ignored rather than failing the page.

use chrono::{DateTime, Utc};
use feedscrape_core::{Cursor, Page, PostRecord};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::FetchError;

/// `created_at` format, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<UserData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UserData {
    user: Option<UserResults>,
}

#[derive(Debug, Deserialize)]
struct UserResults {
    result: Option<UserResult>,
}

#[derive(Debug, Deserialize)]
struct UserResult {
    #[serde(rename = "__typename")]
    typename: Option<String>,
    rest_id: Option<String>,
    legacy: Option<UserLegacy>,
    core: Option<UserLegacy>,
    timeline_v2: Option<TimelineHolder>,
    timeline: Option<TimelineHolder>,
}

impl UserResult {
    fn screen_name(&self) -> Option<&str> {
        self.core
            .as_ref()
            .and_then(|c| c.screen_name.as_deref())
            .or_else(|| self.legacy.as_ref().and_then(|l| l.screen_name.as_deref()))
    }
}

#[derive(Debug, Deserialize)]
struct UserLegacy {
    screen_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TimelineHolder {
    timeline: Option<Timeline>,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
struct Instruction {
    #[serde(default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    entry_id: String,
    content: EntryContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryContent {
    cursor_type: Option<String>,
    value: Option<String>,
    item_content: Option<ItemContent>,
    #[serde(default)]
    items: Vec<ModuleItem>,
}

#[derive(Debug, Deserialize)]
struct ModuleItem {
    item: ModuleItemBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleItemBody {
    item_content: Option<ItemContent>,
}

#[derive(Debug, Deserialize)]
struct ItemContent {
    tweet_results: Option<TweetResults>,
}

#[derive(Debug, Deserialize)]
struct TweetResults {
    result: Option<TweetResult>,
}

#[derive(Debug, Deserialize)]
struct TweetResult {
    rest_id: Option<String>,
    core: Option<TweetCore>,
    legacy: Option<TweetLegacy>,
    views: Option<Views>,
    note_tweet: Option<NoteTweet>,
    /// Set on `TweetWithVisibilityResults` wrappers.
    tweet: Option<Box<TweetResult>>,
}

#[derive(Debug, Deserialize)]
struct TweetCore {
    user_results: Option<UserResults>,
}

#[derive(Debug, Deserialize)]
struct TweetLegacy {
    #[serde(default)]
    full_text: String,
    created_at: Option<String>,
    #[serde(default)]
    favorite_count: u64,
    #[serde(default)]
    retweet_count: u64,
    in_reply_to_status_id_str: Option<String>,
    retweeted_status_result: Option<serde_json::Value>,
    id_str: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Views {
    count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoteTweet {
    note_tweet_results: Option<NoteTweetResults>,
}

#[derive(Debug, Deserialize)]
struct NoteTweetResults {
    result: Option<NoteTweetResult>,
}

#[derive(Debug, Deserialize)]
struct NoteTweetResult {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifiedAccount {
    pub screen_name: String,
}

// ============================================================================
// Parsing
// ============================================================================

/// Extracts the numeric user id from a `UserByScreenName` response.
///
/// Returns `Ok(None)` when the account does not exist or is unavailable.
pub fn parse_user_id(bytes: &[u8]) -> Result<Option<String>, FetchError> {
    let response: GraphqlResponse = serde_json::from_slice(bytes)?;

    let user = response
        .data
        .and_then(|d| d.user)
        .and_then(|u| u.result);

    match user {
        Some(user) if user.typename.as_deref() != Some("UserUnavailable") => Ok(user.rest_id),
        Some(_) => Ok(None),
        None if response.errors.is_empty() => Ok(None),
        None => Err(graphql_error(&response.errors)),
    }
}

/// Parses one `UserTweets` response into a page.
///
/// The next cursor is the timeline's bottom cursor. A page without any post
/// entries yields an empty cursor, since the platform keeps handing out
/// bottom cursors past the end of a timeline. Entries that cannot be turned
/// into records (deleted or withheld posts) still count as post entries.
pub fn parse_timeline(bytes: &[u8]) -> Result<Page, FetchError> {
    let response: GraphqlResponse = serde_json::from_slice(bytes)?;

    let Some(user) = response.data.and_then(|d| d.user).and_then(|u| u.result) else {
        if response.errors.is_empty() {
            return Err(FetchError::InvalidResponse("timeline response has no user".into()));
        }
        return Err(graphql_error(&response.errors));
    };

    let timeline = user
        .timeline_v2
        .or(user.timeline)
        .and_then(|h| h.timeline)
        .ok_or_else(|| FetchError::InvalidResponse("timeline response has no timeline".into()))?;

    let mut posts = Vec::new();
    let mut post_entries = 0usize;
    let mut bottom_cursor = None;

    for entry in timeline.instructions.into_iter().flat_map(|i| i.entries) {
        let content = entry.content;

        if entry.entry_id.starts_with("cursor-bottom") || content.cursor_type.as_deref() == Some("Bottom") {
            bottom_cursor = content.value;
            continue;
        }
        if entry.entry_id.starts_with("promoted") {
            trace!(entry = %entry.entry_id, "Skipping promoted entry");
            continue;
        }

        let items = content
            .item_content
            .iter()
            .chain(content.items.iter().filter_map(|m| m.item.item_content.as_ref()));

        for item in items {
            let Some(results) = item.tweet_results.as_ref() else {
                continue;
            };
            post_entries += 1;
            let Some(tweet) = results.result.as_ref() else {
                debug!(entry = %entry.entry_id, "Skipping entry without post data");
                continue;
            };
            match to_record(tweet) {
                Some(post) => posts.push(post),
                None => debug!(entry = %entry.entry_id, "Skipping entry without post data"),
            }
        }
    }

    let next_cursor = match bottom_cursor {
        Some(cursor) if post_entries > 0 => Cursor::from(cursor),
        _ => Cursor::start(),
    };

    Ok(Page::new(posts, next_cursor))
}

fn to_record(tweet: &TweetResult) -> Option<PostRecord> {
    if let Some(inner) = &tweet.tweet {
        return to_record(inner);
    }

    let legacy = tweet.legacy.as_ref()?;
    let id = tweet.rest_id.clone().or_else(|| legacy.id_str.clone())?;

    let handle = tweet
        .core
        .as_ref()
        .and_then(|c| c.user_results.as_ref())
        .and_then(|u| u.result.as_ref())
        .and_then(UserResult::screen_name)
        .unwrap_or_default()
        .to_string();

    let timestamp = legacy
        .created_at
        .as_deref()
        .and_then(parse_created_at)
        .unwrap_or_default();

    let text = tweet
        .note_tweet
        .as_ref()
        .and_then(|n| n.note_tweet_results.as_ref())
        .and_then(|r| r.result.as_ref())
        .and_then(|r| r.text.as_deref())
        .unwrap_or(legacy.full_text.as_str());

    Some(PostRecord {
        timestamp,
        text: unescape_entities(text),
        likes: legacy.favorite_count,
        reposts: legacy.retweet_count,
        views: tweet
            .views
            .as_ref()
            .and_then(|v| v.count.as_deref())
            .and_then(|c| c.parse().ok())
            .unwrap_or(0),
        handle,
        is_repost: legacy.retweeted_status_result.is_some(),
        is_reply: legacy
            .in_reply_to_status_id_str
            .as_deref()
            .is_some_and(|s| !s.is_empty()),
        id,
    })
}

/// Parses the platform's `created_at` timestamp.
pub fn parse_created_at(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Undoes the HTML escaping the platform applies to post text.
fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn graphql_error(errors: &[GraphqlError]) -> FetchError {
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    FetchError::InvalidResponse(message)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    pub(crate) fn tweet_entry(id: &str, text: &str, likes: u64, screen_name: &str) -> Value {
        json!({
            "entryId": format!("tweet-{id}"),
            "content": {
                "entryType": "TimelineTimelineItem",
                "itemContent": {
                    "itemType": "TimelineTweet",
                    "tweet_results": {
                        "result": {
                            "__typename": "Tweet",
                            "rest_id": id,
                            "core": {"user_results": {"result": {
                                "__typename": "User",
                                "legacy": {"screen_name": screen_name}
                            }}},
                            "views": {"count": "1234", "state": "EnabledWithCount"},
                            "legacy": {
                                "full_text": text,
                                "created_at": "Fri Mar 01 12:30:00 +0000 2024",
                                "favorite_count": likes,
                                "retweet_count": 2,
                                "id_str": id
                            }
                        }
                    }
                }
            }
        })
    }

    pub(crate) fn cursor_entry(value: &str) -> Value {
        json!({
            "entryId": format!("cursor-bottom-{value}"),
            "content": {
                "entryType": "TimelineTimelineCursor",
                "value": value,
                "cursorType": "Bottom"
            }
        })
    }

    pub(crate) fn timeline_body(entries: Vec<Value>) -> Value {
        json!({
            "data": {"user": {"result": {
                "__typename": "User",
                "timeline_v2": {"timeline": {"instructions": [
                    {"type": "TimelineClearCache"},
                    {"type": "TimelineAddEntries", "entries": entries}
                ]}}
            }}}
        })
    }

    fn parse(body: &Value) -> Page {
        parse_timeline(body.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_timeline_page() {
        let body = timeline_body(vec![
            tweet_entry("1", "first &amp; best", 5, "someone"),
            tweet_entry("2", "second", 7, "someone"),
            json!({"entryId": "cursor-top-abc", "content": {"value": "abc", "cursorType": "Top"}}),
            cursor_entry("c2"),
        ]);

        let page = parse(&body);
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.next_cursor, Cursor::from("c2"));

        let first = &page.posts[0];
        assert_eq!(first.id, "1");
        assert_eq!(first.text, "first & best");
        assert_eq!(first.likes, 5);
        assert_eq!(first.reposts, 2);
        assert_eq!(first.views, 1234);
        assert_eq!(first.handle, "someone");
        assert_eq!(first.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());
        assert!(!first.is_repost);
        assert!(!first.is_reply);
    }

    #[test]
    fn test_empty_page_ends_timeline() {
        let page = parse(&timeline_body(vec![cursor_entry("past-the-end")]));
        assert!(page.posts.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn test_withheld_posts_keep_cursor() {
        let tombstone = json!({
            "entryId": "tweet-9",
            "content": {"itemContent": {"tweet_results": {"result": {
                "__typename": "TweetTombstone",
                "tombstone": {"text": {"text": "This post is unavailable."}}
            }}}}
        });

        let page = parse(&timeline_body(vec![tombstone, cursor_entry("next-page")]));
        assert!(page.posts.is_empty());
        assert_eq!(page.next_cursor, Cursor::from("next-page"));
        assert!(!page.is_last());
    }

    #[test]
    fn test_reply_and_repost_flags() {
        let mut reply = tweet_entry("3", "reply", 0, "someone");
        reply["content"]["itemContent"]["tweet_results"]["result"]["legacy"]["in_reply_to_status_id_str"] =
            json!("1");
        let mut repost = tweet_entry("4", "RT @other: hi", 0, "someone");
        repost["content"]["itemContent"]["tweet_results"]["result"]["legacy"]["retweeted_status_result"] =
            json!({"result": {}});

        let page = parse(&timeline_body(vec![reply, repost]));
        assert!(page.posts[0].is_reply);
        assert!(!page.posts[0].is_repost);
        assert!(page.posts[1].is_repost);
        assert!(!page.posts[1].is_reply);
    }

    #[test]
    fn test_visibility_wrapper_and_note_tweet() {
        let mut entry = tweet_entry("5", "truncated…", 1, "someone");
        let mut inner = entry["content"]["itemContent"]["tweet_results"]["result"].take();
        inner["note_tweet"] = json!({"note_tweet_results": {"result": {"text": "the full long text"}}});
        entry["content"]["itemContent"]["tweet_results"]["result"] =
            json!({"__typename": "TweetWithVisibilityResults", "tweet": inner});

        let page = parse(&timeline_body(vec![entry]));
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].id, "5");
        assert_eq!(page.posts[0].text, "the full long text");
    }

    #[test]
    fn test_conversation_module_and_promoted_entries() {
        let thread = tweet_entry("7", "in thread", 0, "someone");
        let module = json!({
            "entryId": "profile-conversation-1",
            "content": {"items": [
                {"item": {"itemContent": thread["content"]["itemContent"].clone()}}
            ]}
        });
        let mut promoted = tweet_entry("8", "ad", 0, "brand");
        promoted["entryId"] = json!("promoted-tweet-8");

        let page = parse(&timeline_body(vec![module, promoted]));
        let ids: Vec<_> = page.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["7"]);
    }

    #[test]
    fn test_missing_views_default_to_zero() {
        let mut entry = tweet_entry("9", "old post", 0, "someone");
        entry["content"]["itemContent"]["tweet_results"]["result"]["views"] = json!({"state": "Enabled"});
        assert_eq!(parse(&timeline_body(vec![entry])).posts[0].views, 0);
    }

    #[test]
    fn test_graphql_errors_are_reported() {
        let body = json!({"errors": [{"message": "Rate limit exceeded"}]});
        let err = parse_timeline(body.to_string().as_bytes()).unwrap_err();
        match err {
            FetchError::InvalidResponse(msg) => assert_eq!(msg, "Rate limit exceeded"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_user_id() {
        let body = json!({"data": {"user": {"result": {"__typename": "User", "rest_id": "44196397"}}}});
        assert_eq!(
            parse_user_id(body.to_string().as_bytes()).unwrap(),
            Some("44196397".to_string())
        );

        let missing = json!({"data": {}});
        assert_eq!(parse_user_id(missing.to_string().as_bytes()).unwrap(), None);

        let unavailable = json!({"data": {"user": {"result": {"__typename": "UserUnavailable"}}}});
        assert_eq!(parse_user_id(unavailable.to_string().as_bytes()).unwrap(), None);
    }

    #[test]
    fn test_parse_created_at() {
        let parsed = parse_created_at("Wed Oct 10 20:19:24 +0000 2018").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap());
        assert!(parse_created_at("2018-10-10").is_none());
    }
}
