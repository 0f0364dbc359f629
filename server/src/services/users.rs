//! Users service
//!
//! Validates submitted user forms and coordinates the record store with the
//! blob store holding each user's image. The two stores are not updated
//! atomically; when one write lands and the other fails, the divergence is
//! logged before the error propagates.

use crate::config::{
    ALLOWED_IMAGE_TYPES, GENERATED_NAME_LENGTH, MAX_EMAIL_LENGTH, MAX_EXTENSION_LENGTH,
    MAX_IMAGE_KILOBYTES, MAX_NAME_LENGTH,
};
use crate::database::{NewUser, User, UserStore};
use crate::error::{AppError, Result};
use crate::storage::{is_valid_name, BlobStore};
use crate::validation::{parse_bool, FieldSource, FieldValue, Rule, RuleSet, UploadedFile};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;

/// Raw user fields as submitted by a client
#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<UploadedFile>,
    pub consent: Option<String>,
}

impl FieldSource for UserForm {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "name" => self.name.as_deref().map(FieldValue::Text),
            "email" => self.email.as_deref().map(FieldValue::Text),
            "image" => self.image.as_ref().map(FieldValue::File),
            "consent" => self.consent.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}

/// A form that passed validation and the consent check
#[derive(Debug)]
struct ValidatedUser {
    name: String,
    email: String,
    image: Option<UploadedFile>,
    consent: bool,
}

const IMAGE_RULES: [Rule; 3] = [
    Rule::Image,
    Rule::Mimes(ALLOWED_IMAGE_TYPES),
    Rule::Max(MAX_IMAGE_KILOBYTES),
];

/// Rules for creating a user; an image is mandatory
pub fn create_rules() -> RuleSet {
    let mut image = vec![Rule::Required];
    image.extend(IMAGE_RULES);

    RuleSet::new()
        .field("name", &[Rule::Required, Rule::String, Rule::Max(MAX_NAME_LENGTH)])
        .field("email", &[Rule::Required, Rule::Email, Rule::Max(MAX_EMAIL_LENGTH)])
        .field("image", &image)
        .field("consent", &[Rule::Boolean])
}

/// Rules for updating a user; omitting the image keeps the stored one
pub fn update_rules() -> RuleSet {
    RuleSet::new()
        .field("name", &[Rule::Required, Rule::String, Rule::Max(MAX_NAME_LENGTH)])
        .field("email", &[Rule::Required, Rule::Email, Rule::Max(MAX_EMAIL_LENGTH)])
        .field("image", &IMAGE_RULES)
        .field("consent", &[Rule::Boolean])
}

impl UserForm {
    /// Field validation (422), then the consent check (400)
    fn validate(self, rules: &RuleSet) -> Result<ValidatedUser> {
        rules.validate(&self).map_err(AppError::Validation)?;

        let consent = self
            .consent
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(false);

        if !consent && self.image.is_some() {
            return Err(AppError::ConsentRequired);
        }

        Ok(ValidatedUser {
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            image: self.image,
            consent,
        })
    }
}

/// Random filename for a stored image: 32 alphanumerics plus the upload's extension.
///
/// The client's extension is kept when it is short, plain alphanumeric text;
/// otherwise the extension of the detected image type is used.
pub fn generate_image_name(file: &UploadedFile) -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_NAME_LENGTH)
        .map(char::from)
        .collect();

    let extension = file
        .client_extension()
        .filter(|ext| {
            ext.len() <= MAX_EXTENSION_LENGTH && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_string)
        .or_else(|| {
            file.image_kind()
                .map(|kind| kind.extensions()[0].to_string())
        });

    match extension {
        Some(extension) => format!("{}.{}", stem, extension),
        None => stem,
    }
}

/// Service for managing users and their images
#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserStore>,
    blobs: Arc<dyn BlobStore>,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { users, blobs }
    }

    /// All users. An empty table is reported as `NoRecords`.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let users = self.users.all().await?;

        if users.is_empty() {
            return Err(AppError::NoRecords);
        }

        Ok(users)
    }

    /// Create a user from a submitted form
    pub async fn create_user(&self, form: UserForm) -> Result<User> {
        let input = form.validate(&create_rules())?;

        let image_name = input.image.as_ref().map(generate_image_name);

        tracing::info!(
            "Creating user: {} (image: {:?})",
            input.email,
            image_name
        );

        let user = self
            .users
            .create(NewUser {
                name: input.name,
                email: input.email,
                image: image_name.clone(),
                consent: input.consent,
            })
            .await?
            .ok_or(AppError::CreateFailed)?;

        if let (Some(file), Some(name)) = (&input.image, &image_name) {
            if let Err(e) = self.blobs.put(name, &file.data).await {
                tracing::error!(
                    "User {} was stored but its image blob {} was not written: {}",
                    user.id,
                    name,
                    e
                );
                return Err(e);
            }
        }

        tracing::info!("User created: {}", user.id);

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.users.find(id).await?.ok_or(AppError::UserNotFound)
    }

    /// Run the update validation alone, without touching either store
    pub fn check_update_form(&self, form: UserForm) -> Result<()> {
        form.validate(&update_rules()).map(|_| ())
    }

    /// Update a user, replacing the stored image when a new one is supplied
    pub async fn update_user(&self, id: i64, form: UserForm) -> Result<User> {
        let input = form.validate(&update_rules())?;

        let mut user = self.get_user(id).await?;

        user.name = input.name;
        user.email = input.email;
        user.consent = input.consent;

        if let Some(file) = &input.image {
            if let Some(previous) = &user.image {
                if self.blobs.exists(previous).await? {
                    self.blobs.delete(previous).await?;
                    tracing::debug!("Removed previous image {} of user {}", previous, id);
                }
            }

            let name = generate_image_name(file);
            if let Err(e) = self.blobs.put(&name, &file.data).await {
                tracing::error!(
                    "Image of user {} was removed but replacement {} was not written: {}",
                    id,
                    name,
                    e
                );
                return Err(e);
            }
            user.image = Some(name);
        }

        match self.users.save(&user).await {
            Ok(saved) => {
                tracing::info!("User updated: {}", saved.id);
                Ok(saved)
            }
            Err(e) => {
                if input.image.is_some() {
                    tracing::error!(
                        "Image {:?} was written for user {} but the record was not saved: {}",
                        user.image,
                        id,
                        e
                    );
                }
                Err(e)
            }
        }
    }

    /// Delete a user along with its image
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let user = self.get_user(id).await?;

        tracing::info!("Deleting user: {}", id);

        if let Some(image) = &user.image {
            if self.blobs.exists(image).await? {
                self.blobs.delete(image).await?;
            }
        }

        if let Err(e) = self.users.delete(id).await {
            tracing::error!(
                "Image {:?} of user {} was deleted but the record was not: {}",
                user.image,
                id,
                e
            );
            return Err(e);
        }

        tracing::info!("User deleted: {}", id);

        Ok(())
    }

    /// Raw bytes of a stored image
    pub async fn read_image(&self, name: &str) -> Result<Vec<u8>> {
        if !is_valid_name(name) {
            return Err(AppError::BlobNotFound(name.to_string()));
        }
        self.blobs.get(name).await
    }
}
