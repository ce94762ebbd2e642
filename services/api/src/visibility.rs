//! Visibility and authorization engine
//!
//! Decides, for a possibly absent authenticated identity, whether a
//! resource or query result is observable or mutable. Blocks dominate
//! every other rule; privacy is then resolved through ownership and the
//! follower relation.

use common::document::{Document, Memorial, Post};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::error::ApiError;

/// Outcome of an ownership check on a mutating request. `Forbidden` is
/// deliberately distinct from `NotFound`: the owner-check path discloses
/// that the resource exists, which is an accepted leak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationCheck {
    Allowed,
    Forbidden,
    Unauthorized,
    NotFound,
}

impl MutationCheck {
    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            MutationCheck::Allowed => Ok(()),
            MutationCheck::Forbidden => Err(ApiError::Forbidden),
            MutationCheck::Unauthorized => Err(ApiError::Unauthorized),
            MutationCheck::NotFound => Err(ApiError::NotFound),
        }
    }
}

/// Whether `viewer` may see `post`. Blocks hide unconditionally; then
/// the post is visible when its owner is public, the viewer is the
/// owner, or the viewer is an approved follower of the owner.
pub fn can_view_post(doc: &Document, viewer: Option<u64>, post: &Post) -> bool {
    let Some(owner) = doc.find_user(post.user_id) else {
        return false;
    };

    if let Some(viewer) = viewer {
        if doc.blocked_between(viewer, post.user_id) {
            return false;
        }
        if viewer == post.user_id {
            return true;
        }
    }

    if !owner.private {
        return true;
    }

    match viewer {
        Some(viewer) => doc.is_follower(post.user_id, viewer),
        None => false,
    }
}

/// Filters a post listing for the viewer.
pub fn visible_posts<'a>(doc: &'a Document, viewer: Option<u64>) -> Vec<&'a Post> {
    doc.posts
        .iter()
        .filter(|p| can_view_post(doc, viewer, p))
        .collect()
}

/// Whether `viewer` may see a memorial. Private memorials are visible
/// to their owner and to admins; the follower carve-out only applies
/// when enabled by configuration.
pub fn can_view_memorial(
    doc: &Document,
    config: &AppConfig,
    viewer: Option<u64>,
    memorial: &Memorial,
) -> bool {
    if !memorial.private {
        return true;
    }
    let Some(owner) = memorial.owner else {
        // A private memorial without an owner is visible to nobody in
        // particular, so fall back to showing it; nothing can unlock it.
        return true;
    };
    match viewer {
        Some(viewer) => {
            viewer == owner
                || doc.find_user(viewer).is_some_and(|u| u.admin)
                || (config.memorial_follower_access && doc.is_follower(owner, viewer))
        }
        None => false,
    }
}

/// Ownership check for memorial mutation. Ownerless memorials (created
/// without authentication) stay mutable by anyone, matching the legacy
/// records endpoints.
pub fn check_memorial_mutation(
    doc: &Document,
    viewer: Option<u64>,
    memorial_id: u64,
) -> MutationCheck {
    let Some(memorial) = doc.find_memorial(memorial_id) else {
        return MutationCheck::NotFound;
    };
    match memorial.owner {
        None => MutationCheck::Allowed,
        Some(owner) => match viewer {
            None => MutationCheck::Unauthorized,
            Some(viewer) if viewer == owner => MutationCheck::Allowed,
            Some(_) => MutationCheck::Forbidden,
        },
    }
}

/// Gate for publishing actions: suspended accounts may read but not
/// create posts or chat messages.
pub fn ensure_not_suspended(doc: &Document, user_id: u64) -> Result<(), ApiError> {
    match doc.find_user(user_id) {
        Some(user) if user.suspended => Err(ApiError::Suspended),
        Some(_) => Ok(()),
        None => Err(ApiError::Unauthorized),
    }
}

/// Admin capability gate. Two equally authoritative paths: a bearer
/// identity carrying the admin flag, or presentation of the configured
/// shared secret (compared in constant time).
pub fn admin_gate(
    doc: &Document,
    config: &AppConfig,
    identity: Option<u64>,
    presented_secret: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(id) = identity {
        if doc.find_user(id).is_some_and(|u| u.admin) {
            return Ok(());
        }
    }
    if let Some(secret) = presented_secret {
        let matches: bool = secret
            .as_bytes()
            .ct_eq(config.admin_secret.as_bytes())
            .into();
        if matches {
            return Ok(());
        }
    }
    match identity {
        Some(_) => Err(ApiError::Forbidden),
        None => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::document::{Block, Follower, User};

    fn config() -> AppConfig {
        AppConfig {
            port: 0,
            data_file: "data.json".into(),
            sqlite_file: None,
            uploads_dir: "uploads".into(),
            public_dir: "public".into(),
            token_secret: "secret".into(),
            token_ttl_secs: 3600,
            admin_secret: "admin-secret".into(),
            memorial_follower_access: false,
        }
    }

    fn user(id: u64, private: bool) -> User {
        User {
            id,
            username: format!("user{id}"),
            password: String::new(),
            created_at: Utc::now(),
            private,
            suspended: false,
            admin: false,
        }
    }

    fn post(id: u64, user_id: u64) -> Post {
        Post {
            id,
            user_id,
            title: "t".into(),
            body: "b".into(),
            video_url: String::new(),
            tags: vec![],
            mentions: vec![],
            created_at: Utc::now(),
        }
    }

    fn memorial(id: u64, owner: Option<u64>, private: bool) -> Memorial {
        Memorial {
            id,
            name: "m".into(),
            note: String::new(),
            owner,
            private,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn block(a: u64, b: u64) -> Block {
        Block {
            by_user_id: a,
            blocked_user_id: b,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn public_owner_posts_are_visible_to_everyone() {
        let mut doc = Document::default();
        doc.users.push(user(1, false));
        let p = post(1, 1);

        assert!(can_view_post(&doc, None, &p));
        assert!(can_view_post(&doc, Some(2), &p));
    }

    #[test]
    fn private_owner_posts_need_the_follower_edge() {
        let mut doc = Document::default();
        doc.users.push(user(1, true));
        doc.users.push(user(2, false));
        let p = post(1, 1);

        assert!(!can_view_post(&doc, None, &p));
        assert!(!can_view_post(&doc, Some(2), &p));
        assert!(can_view_post(&doc, Some(1), &p), "owner always sees own posts");

        doc.followers.push(Follower {
            user_id: 1,
            follower_id: 2,
        });
        assert!(can_view_post(&doc, Some(2), &p));
    }

    #[test]
    fn blocks_dominate_even_for_approved_followers() {
        let mut doc = Document::default();
        doc.users.push(user(1, true));
        doc.users.push(user(2, false));
        doc.followers.push(Follower {
            user_id: 1,
            follower_id: 2,
        });
        doc.blocks.push(block(1, 2));
        let p = post(1, 1);

        assert!(!can_view_post(&doc, Some(2), &p));

        // And in the other direction too.
        doc.blocks.clear();
        doc.blocks.push(block(2, 1));
        assert!(!can_view_post(&doc, Some(2), &p));
    }

    #[test]
    fn visible_posts_filters_per_viewer() {
        let mut doc = Document::default();
        doc.users.push(user(1, false));
        doc.users.push(user(2, true));
        doc.posts.push(post(1, 1));
        doc.posts.push(post(2, 2));

        let anon: Vec<u64> = visible_posts(&doc, None).iter().map(|p| p.id).collect();
        assert_eq!(anon, vec![1]);

        let owner: Vec<u64> = visible_posts(&doc, Some(2)).iter().map(|p| p.id).collect();
        assert_eq!(owner, vec![1, 2]);
    }

    #[test]
    fn private_memorial_respects_follower_policy_flag() {
        let mut doc = Document::default();
        doc.users.push(user(1, false));
        doc.users.push(user(2, false));
        doc.followers.push(Follower {
            user_id: 1,
            follower_id: 2,
        });
        let m = memorial(1, Some(1), true);

        let mut cfg = config();
        assert!(can_view_memorial(&doc, &cfg, Some(1), &m));
        assert!(!can_view_memorial(&doc, &cfg, Some(2), &m));
        assert!(!can_view_memorial(&doc, &cfg, None, &m));

        cfg.memorial_follower_access = true;
        assert!(can_view_memorial(&doc, &cfg, Some(2), &m));
    }

    #[test]
    fn memorial_mutation_distinguishes_forbidden_from_not_found() {
        let mut doc = Document::default();
        doc.memorials.push(memorial(1, Some(1), false));
        doc.memorials.push(memorial(2, None, false));

        assert_eq!(check_memorial_mutation(&doc, Some(1), 1), MutationCheck::Allowed);
        assert_eq!(check_memorial_mutation(&doc, Some(2), 1), MutationCheck::Forbidden);
        assert_eq!(
            check_memorial_mutation(&doc, None, 1),
            MutationCheck::Unauthorized
        );
        assert_eq!(check_memorial_mutation(&doc, None, 2), MutationCheck::Allowed);
        assert_eq!(check_memorial_mutation(&doc, Some(1), 99), MutationCheck::NotFound);
    }

    #[test]
    fn suspension_gate_refuses_publishing_only_for_suspended_users() {
        let mut doc = Document::default();
        doc.users.push(user(1, false));
        let mut suspended = user(2, false);
        suspended.suspended = true;
        doc.users.push(suspended);

        assert!(ensure_not_suspended(&doc, 1).is_ok());
        assert!(matches!(
            ensure_not_suspended(&doc, 2),
            Err(ApiError::Suspended)
        ));
        assert!(matches!(
            ensure_not_suspended(&doc, 99),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn admin_gate_accepts_role_or_shared_secret() {
        let mut doc = Document::default();
        let mut admin = user(1, false);
        admin.admin = true;
        doc.users.push(admin);
        doc.users.push(user(2, false));
        let cfg = config();

        assert!(admin_gate(&doc, &cfg, Some(1), None).is_ok());
        assert!(admin_gate(&doc, &cfg, None, Some("admin-secret")).is_ok());
        assert!(admin_gate(&doc, &cfg, Some(2), Some("admin-secret")).is_ok());

        assert!(matches!(
            admin_gate(&doc, &cfg, Some(2), None),
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            admin_gate(&doc, &cfg, None, Some("wrong")),
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            admin_gate(&doc, &cfg, None, None),
            Err(ApiError::Unauthorized)
        ));
    }
}
