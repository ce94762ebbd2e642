//! The persisted application document
//!
//! All durable state lives in one structured document with named
//! collections. The whole document is read and written as a unit; the
//! field names below match the JSON layout on disk, so a data file
//! produced by an older deployment (possibly missing newer collections)
//! still loads thanks to `#[serde(default)]`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// `password` holds the salted PBKDF2 form (`saltHex$derivedHex`) and is
/// only ever serialized into the document itself, never into an API
/// response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub admin: bool,
}

/// A server-side session row created at login.
///
/// `token` is the opaque refresh handle, `access` the signed bearer
/// token that was issued alongside it. Access tokens are self-contained
/// and expire on their own; there is no revocation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub access: String,
    pub user_id: u64,
    pub created_at: DateTime<Utc>,
}

/// A memorial record.
///
/// This is the canonical schema for the overlapping `records` and
/// `memorials` endpoint generations: one collection, `name` plus `note`.
/// `owner` is absent for records created without authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memorial {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<u64>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A user post, subject to the visibility rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mentions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Media attached to a memorial: either an uploaded file stored on disk
/// or a reference to an externally hosted URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: u64,
    pub memorial_id: u64,
    #[serde(default)]
    pub external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A chat message. `sender_id` is present when the sender was
/// authenticated; `user` is the display name supplied with the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<u64>,
    pub message: String,
    pub room: String,
    pub created_at: DateTime<Utc>,
}

/// An active live stream, keyed by user id in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEntry {
    pub stream_key: String,
    pub started_at: DateTime<Utc>,
}

/// A directed block edge. Enforcement is bidirectional: either
/// direction hides content and suppresses chat delivery both ways.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub by_user_id: u64,
    pub blocked_user_id: u64,
    pub created_at: DateTime<Utc>,
}

/// A moderation report filed against a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: u64,
    pub reporter_id: u64,
    pub target_user_id: u64,
    pub categories: Vec<String>,
    #[serde(default)]
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

/// A pending follow request, consumed on approval or denial.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub id: u64,
    pub from: u64,
    pub to: u64,
    pub created_at: DateTime<Utc>,
}

/// An approved, standing follower edge: `follower_id` follows `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follower {
    pub user_id: u64,
    pub follower_id: u64,
}

/// The whole application state as persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub memorials: Vec<Memorial>,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub live: BTreeMap<u64, LiveEntry>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub follow_requests: Vec<FollowRequest>,
    #[serde(default)]
    pub followers: Vec<Follower>,
    #[serde(default)]
    pub media: Vec<Media>,
}

/// Next identifier for a collection: `max(existing) + 1`, or 1 when the
/// collection is empty. Ids within a collection are strictly increasing
/// only while entries with the maximum id are never removed and
/// re-added, which matches how the endpoints use it.
pub fn next_id<T>(items: &[T], id: impl Fn(&T) -> u64) -> u64 {
    items.iter().map(id).max().unwrap_or(0) + 1
}

impl Document {
    pub fn find_user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_user_mut(&mut self, id: u64) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn find_memorial(&self, id: u64) -> Option<&Memorial> {
        self.memorials.iter().find(|m| m.id == id)
    }

    pub fn find_memorial_mut(&mut self, id: u64) -> Option<&mut Memorial> {
        self.memorials.iter_mut().find(|m| m.id == id)
    }

    pub fn memorial_media(&self, memorial_id: u64) -> Vec<&Media> {
        self.media
            .iter()
            .filter(|m| m.memorial_id == memorial_id)
            .collect()
    }

    /// True when a block edge exists in either direction between the
    /// two users.
    pub fn blocked_between(&self, a: u64, b: u64) -> bool {
        self.blocks.iter().any(|bl| {
            (bl.by_user_id == a && bl.blocked_user_id == b)
                || (bl.by_user_id == b && bl.blocked_user_id == a)
        })
    }

    /// True when `follower` has an approved edge following `owner`.
    pub fn is_follower(&self, owner: u64, follower: u64) -> bool {
        self.followers
            .iter()
            .any(|f| f.user_id == owner && f.follower_id == follower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            password: String::new(),
            created_at: Utc::now(),
            private: false,
            suspended: false,
            admin: false,
        }
    }

    #[test]
    fn next_id_starts_at_one_and_increments_past_max() {
        let users: Vec<User> = vec![];
        assert_eq!(next_id(&users, |u| u.id), 1);

        let users = vec![user(1, "a"), user(7, "b"), user(3, "c")];
        assert_eq!(next_id(&users, |u| u.id), 8);
    }

    #[test]
    fn blocked_between_is_symmetric() {
        let mut doc = Document::default();
        doc.blocks.push(Block {
            by_user_id: 1,
            blocked_user_id: 2,
            created_at: Utc::now(),
        });

        assert!(doc.blocked_between(1, 2));
        assert!(doc.blocked_between(2, 1));
        assert!(!doc.blocked_between(1, 3));
    }

    #[test]
    fn document_loads_with_missing_collections() {
        let doc: Document = serde_json::from_str(r#"{"users": []}"#).unwrap();
        assert!(doc.memorials.is_empty());
        assert!(doc.live.is_empty());
        assert!(doc.follow_requests.is_empty());
    }

    #[test]
    fn live_entries_round_trip_keyed_by_user_id() {
        let mut doc = Document::default();
        doc.live.insert(
            4,
            LiveEntry {
                stream_key: "abc".to_string(),
                started_at: Utc::now(),
            },
        );

        let s = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&s).unwrap();
        assert_eq!(back.live.get(&4).unwrap().stream_key, "abc");
    }
}
