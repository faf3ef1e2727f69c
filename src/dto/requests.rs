use crate::{
    errors::{ApiError, FieldErrors},
    models::{NewPost, Post, User},
    store::Store,
};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidateEmail, ValidationError};

const REQUIRED: &str = "This field is required.";
const NULL: &str = "This field may not be null.";
const BLANK: &str = "This field may not be blank.";

fn valid_username(value: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if !value.chars().all(allowed) {
        return Err(ValidationError::new("invalid_username").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ));
    }
    Ok(())
}

fn blank_or_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        return Ok(());
    }
    Err(ValidationError::new("email").with_message("Enter a valid email address.".into()))
}

/// Tells an explicit `null` (`Some(None)`) apart from an absent field (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn finish(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// `text` of posts and comments: required unless `partial`, never null or blank.
fn check_text(text: &Option<Option<String>>, partial: bool, errors: &mut FieldErrors) {
    let message = match text {
        None if partial => return,
        None => REQUIRED,
        Some(None) => NULL,
        Some(Some(text)) if text.trim().is_empty() => BLANK,
        Some(Some(_)) => return,
    };
    errors.entry("text".into()).or_default().push(message.into());
}

// ============================================================================
// Posts and comments
// ============================================================================

/// Body of POST/PUT/PATCH on posts. `author` and `created_at` are not accepted
/// from clients; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct PostRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub text: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub group: Option<Option<i64>>,
}

impl PostRequest {
    /// Field validation; `partial` is PATCH, where `text` may be omitted.
    pub fn check(&self, store: &Store, partial: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        check_text(&self.text, partial, &mut errors);
        if let Some(Some(group_id)) = self.group {
            if store.group(group_id).is_none() {
                errors
                    .entry("group".into())
                    .or_default()
                    .push(format!("Invalid pk \"{group_id}\" - object does not exist."));
            }
        }

        finish(errors)
    }

    pub fn into_new_post(self, author_id: i64) -> NewPost {
        NewPost {
            author_id,
            text: self.text.flatten().unwrap_or_default(),
            image: self.image.flatten(),
            group_id: self.group.flatten(),
        }
    }

    /// Writes the fields that were sent onto `post`.
    pub fn apply(self, post: &mut Post) {
        if let Some(Some(text)) = self.text {
            post.text = text;
        }
        if let Some(image) = self.image {
            post.image = image;
        }
        if let Some(group_id) = self.group {
            post.group_id = group_id;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub text: Option<Option<String>>,
}

impl CommentRequest {
    pub fn check(&self, partial: bool) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        check_text(&self.text, partial, &mut errors);
        finish(errors)
    }

    /// The new text, if one was sent.
    pub fn into_text(self) -> Option<String> {
        self.text.flatten()
    }
}

// ============================================================================
// Follows
// ============================================================================

/// A user named either by username or by id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(i64),
    Username(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct FollowRequest {
    pub following: Option<UserRef>,
}

impl FollowRequest {
    /// Resolves the user to follow.
    pub fn target(&self, store: &Store) -> Result<User, ApiError> {
        match &self.following {
            None => Err(ApiError::field("following", REQUIRED)),
            Some(UserRef::Username(username)) => store.user_by_username(username).ok_or_else(|| {
                ApiError::field(
                    "following",
                    format!("Object with username={username} does not exist."),
                )
            }),
            Some(UserRef::Id(id)) => store.user(*id).ok_or_else(|| {
                ApiError::field("following", format!("Invalid pk \"{id}\" - object does not exist."))
            }),
        }
    }
}

// ============================================================================
// Identity
// ============================================================================

#[derive(Debug, Validate, Deserialize)]
pub struct SignupRequest {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        custom(function = "valid_username")
    )]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "blank_or_email"))]
    pub email: String,
    #[validate(
        required(message = "This field is required."),
        length(min = 8, max = 128, message = "Password must be 8-128 characters")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required(message = "This field is required."))]
    pub username: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(required(message = "This field is required."))]
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(required(message = "This field is required."))]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::field_errors, models::NewGroup};
    use serde_json::json;

    fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    fn fields(result: Result<(), ApiError>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn post_text_is_required_unless_partial() {
        let store = Store::new();
        let request: PostRequest = parse(json!({}));

        let errors = fields(request.check(&store, false));
        assert_eq!(errors["text"], vec![REQUIRED.to_string()]);
        assert!(request.check(&store, true).is_ok());
    }

    #[test]
    fn blank_post_text_is_rejected() {
        let store = Store::new();
        let request: PostRequest = parse(json!({ "text": "   " }));

        let errors = fields(request.check(&store, true));
        assert_eq!(errors["text"], vec![BLANK.to_string()]);
    }

    #[test]
    fn null_text_is_rejected_even_when_partial() {
        let store = Store::new();
        let request: PostRequest = parse(json!({ "text": null }));

        let errors = fields(request.check(&store, true));
        assert_eq!(errors["text"], vec![NULL.to_string()]);

        let comment: CommentRequest = parse(json!({ "text": null }));
        let errors = fields(comment.check(true));
        assert_eq!(errors["text"], vec![NULL.to_string()]);
    }

    #[test]
    fn post_group_must_exist() {
        let store = Store::new();
        let group = store
            .create_group(NewGroup {
                title: "Cats".into(),
                slug: "cats".into(),
                description: String::new(),
            })
            .unwrap();

        let ok: PostRequest = parse(json!({ "text": "hi", "group": group.id }));
        assert!(ok.check(&store, false).is_ok());

        let bad: PostRequest = parse(json!({ "text": "hi", "group": 99 }));
        let errors = fields(bad.check(&store, false));
        assert!(errors["group"][0].contains("99"));
    }

    #[test]
    fn client_cannot_set_author() {
        let request: PostRequest = parse(json!({ "text": "hi", "author": "mallory" }));
        let new_post = request.into_new_post(3);
        assert_eq!(new_post.author_id, 3);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let mut post = Post {
            id: 1,
            author_id: 1,
            text: "old".into(),
            image: Some("cat.png".into()),
            group_id: Some(2),
            created_at: chrono::Utc::now(),
        };

        let request: PostRequest = parse(json!({ "group": null }));
        request.apply(&mut post);

        assert_eq!(post.text, "old");
        assert_eq!(post.image.as_deref(), Some("cat.png"));
        assert_eq!(post.group_id, None);
    }

    #[test]
    fn follow_target_accepts_username_or_id() {
        let store = Store::new();
        let bob = store.create_user("bob", "", "hash".into()).unwrap();

        let by_name: FollowRequest = parse(json!({ "following": "bob" }));
        assert_eq!(by_name.target(&store).unwrap().id, bob.id);

        let by_id: FollowRequest = parse(json!({ "following": bob.id }));
        assert_eq!(by_id.target(&store).unwrap().username, "bob");

        let missing: FollowRequest = parse(json!({}));
        assert!(matches!(missing.target(&store), Err(ApiError::Validation(_))));

        let unknown: FollowRequest = parse(json!({ "following": "carol" }));
        assert!(matches!(unknown.target(&store), Err(ApiError::Validation(_))));
    }

    #[test]
    fn signup_validates_every_field() {
        let request: SignupRequest = parse(json!({
            "username": "bad name",
            "email": "not-an-email",
            "password": "short"
        }));
        let errors = field_errors(&request.validate().unwrap_err());
        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));

        let request: SignupRequest = parse(json!({
            "username": "alice.b",
            "password": "long enough"
        }));
        assert!(request.validate().is_ok());
    }
}
