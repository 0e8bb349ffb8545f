//! Access-control decisions for project reads and writes.
//!
//! The evaluator is pure: callers fetch the project and its API key first,
//! then ask for a decision. Denials deliberately conflate "wrong key" with
//! "project does not exist" so the public API cannot be used as an oracle for
//! project names or key guessing.

use crate::error::{Error, Result};
use crate::types::{ApiKey, Project};

/// Who is asking. Exactly one of three shapes, never a bag of optionals.
#[derive(Debug, Clone)]
pub enum AccessContext {
    /// An authenticated dashboard session for this user id.
    Owner(String),
    /// A bearer API key presented via `X-Api-Key`.
    ApiKey(String),
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
}

/// Decides whether `ctx` may perform `capability` on `project`.
///
/// Writes are owner-only: a different session gets NotFound (existence
/// hidden), no session gets Unauthorized. Reads succeed for the owner, for
/// public projects, or for a matching API key; a missing credential is
/// Unauthorized and a wrong key is NotFound.
pub fn authorize(
    ctx: &AccessContext,
    project: &Project,
    api_key: Option<&ApiKey>,
    capability: Capability,
) -> Result<()> {
    match capability {
        Capability::Write => match ctx {
            AccessContext::Owner(user_id) if *user_id == project.user_id => Ok(()),
            AccessContext::Owner(_) => Err(Error::NotFound),
            AccessContext::ApiKey(_) | AccessContext::Anonymous => Err(Error::Unauthorized),
        },
        Capability::Read => match ctx {
            AccessContext::Owner(user_id) if *user_id == project.user_id => Ok(()),
            _ if project.public => Ok(()),
            AccessContext::ApiKey(presented) => match api_key {
                Some(key) if key.key == *presented => Ok(()),
                _ => Err(Error::NotFound),
            },
            AccessContext::Owner(_) => Err(Error::NotFound),
            AccessContext::Anonymous => Err(Error::Unauthorized),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(owner: &str, public: bool) -> Project {
        let now = Utc::now();
        Project {
            id: "p1".to_string(),
            user_id: owner.to_string(),
            name: "acme".to_string(),
            public,
            created_at: now,
            updated_at: now,
        }
    }

    fn api_key(key: &str) -> ApiKey {
        let now = Utc::now();
        ApiKey {
            id: "k1".to_string(),
            project_id: "p1".to_string(),
            key: key.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_reads_and_writes() {
        let p = project("alice", false);
        let ctx = AccessContext::Owner("alice".to_string());
        assert!(authorize(&ctx, &p, None, Capability::Read).is_ok());
        assert!(authorize(&ctx, &p, None, Capability::Write).is_ok());
    }

    #[test]
    fn test_other_session_write_is_not_found() {
        let p = project("alice", false);
        let ctx = AccessContext::Owner("mallory".to_string());
        assert!(matches!(
            authorize(&ctx, &p, None, Capability::Write),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_matching_key_reads_but_never_writes() {
        let p = project("alice", false);
        let key = api_key("secret");
        let ctx = AccessContext::ApiKey("secret".to_string());
        assert!(authorize(&ctx, &p, Some(&key), Capability::Read).is_ok());
        assert!(matches!(
            authorize(&ctx, &p, Some(&key), Capability::Write),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_key_is_indistinguishable_from_absent_project() {
        let p = project("alice", false);
        let key = api_key("secret");
        let ctx = AccessContext::ApiKey("guess".to_string());
        assert!(matches!(
            authorize(&ctx, &p, Some(&key), Capability::Read),
            Err(Error::NotFound)
        ));

        // No key provisioned at all behaves the same.
        assert!(matches!(
            authorize(&ctx, &p, None, Capability::Read),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_anonymous_read_requires_public_flag() {
        let private = project("alice", false);
        assert!(matches!(
            authorize(&AccessContext::Anonymous, &private, None, Capability::Read),
            Err(Error::Unauthorized)
        ));

        let public = project("alice", true);
        assert!(authorize(&AccessContext::Anonymous, &public, None, Capability::Read).is_ok());
    }

    #[test]
    fn test_public_project_ignores_presented_key() {
        let p = project("alice", true);
        let key = api_key("secret");
        let ctx = AccessContext::ApiKey("wrong".to_string());
        assert!(authorize(&ctx, &p, Some(&key), Capability::Read).is_ok());
    }

    #[test]
    fn test_nonowner_session_read_of_private_project_is_not_found() {
        let p = project("alice", false);
        let ctx = AccessContext::Owner("mallory".to_string());
        assert!(matches!(
            authorize(&ctx, &p, None, Capability::Read),
            Err(Error::NotFound)
        ));
    }
}
