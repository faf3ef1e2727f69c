use crate::{auth::Identity, errors::ApiError, models::Authored};
use axum::http::Method;

/// GET, HEAD and OPTIONS never change state.
pub fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Authorization rule attached to a resource.
///
/// Both checks are pure: they look only at the requester, the method and, for
/// object checks, the record's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Anyone reads; writes need a login, and changes to an existing record need
    /// to come from its author.
    AuthorOrReadOnly,
    /// Nobody writes.
    ReadOnly,
    /// Every method needs a login.
    Authenticated,
}

impl Policy {
    /// Request-level check, run before the target record is loaded.
    pub fn check(self, identity: &Identity, method: &Method) -> Result<(), ApiError> {
        match self {
            Policy::AuthorOrReadOnly if is_safe(method) => Ok(()),
            Policy::AuthorOrReadOnly | Policy::Authenticated => identity.user().map(|_| ()),
            Policy::ReadOnly if is_safe(method) => Ok(()),
            Policy::ReadOnly => Err(ApiError::PermissionDenied),
        }
    }

    /// Object-level check, run once the target record is known.
    pub fn check_object(
        self,
        identity: &Identity,
        method: &Method,
        object: &impl Authored,
    ) -> Result<(), ApiError> {
        match self {
            Policy::AuthorOrReadOnly if is_safe(method) => Ok(()),
            Policy::AuthorOrReadOnly => {
                if identity.user()?.id == object.author_id() {
                    Ok(())
                } else {
                    Err(ApiError::PermissionDenied)
                }
            }
            Policy::ReadOnly | Policy::Authenticated => self.check(identity, method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;

    struct Owned(i64);

    impl Authored for Owned {
        fn author_id(&self) -> i64 {
            self.0
        }
    }

    fn as_user(id: i64) -> Identity {
        Identity(Some(CurrentUser {
            id,
            username: format!("user{id}"),
        }))
    }

    const UNSAFE: [Method; 4] = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

    #[test]
    fn author_or_read_only_lets_anyone_read() {
        let policy = Policy::AuthorOrReadOnly;
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(policy.check(&Identity::anonymous(), &method).is_ok());
            assert!(policy.check_object(&Identity::anonymous(), &method, &Owned(1)).is_ok());
        }
    }

    #[test]
    fn author_or_read_only_requires_login_to_write() {
        let policy = Policy::AuthorOrReadOnly;
        for method in UNSAFE {
            assert!(matches!(
                policy.check(&Identity::anonymous(), &method),
                Err(ApiError::NotAuthenticated)
            ));
            assert!(policy.check(&as_user(1), &method).is_ok());
        }
    }

    #[test]
    fn author_or_read_only_restricts_changes_to_author() {
        let policy = Policy::AuthorOrReadOnly;
        for method in [Method::PUT, Method::PATCH, Method::DELETE] {
            assert!(policy.check_object(&as_user(1), &method, &Owned(1)).is_ok());
            assert!(matches!(
                policy.check_object(&as_user(2), &method, &Owned(1)),
                Err(ApiError::PermissionDenied)
            ));
        }
    }

    #[test]
    fn read_only_rejects_every_write() {
        let policy = Policy::ReadOnly;
        for identity in [Identity::anonymous(), as_user(1)] {
            assert!(policy.check(&identity, &Method::GET).is_ok());
            for method in UNSAFE {
                assert!(matches!(
                    policy.check(&identity, &method),
                    Err(ApiError::PermissionDenied)
                ));
            }
        }
    }

    #[test]
    fn authenticated_rejects_anonymous_reads() {
        let policy = Policy::Authenticated;
        assert!(policy.check(&Identity::anonymous(), &Method::GET).is_err());
        assert!(policy.check(&as_user(3), &Method::GET).is_ok());
        assert!(policy.check(&as_user(3), &Method::POST).is_ok());
    }
}
