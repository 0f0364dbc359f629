//! Multipart form decoding
//!
//! Text values are trimmed and empty strings are treated as missing, so
//! `name=""` and an absent `name` validate the same way.

use crate::error::{AppError, Result};
use crate::services::UserForm;
use crate::validation::UploadedFile;
use axum::extract::multipart::{Multipart, MultipartRejection};

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read every part of a multipart body into a [`UserForm`]. Unknown parts are ignored.
pub async fn read_user_form(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<UserForm> {
    let mut multipart = multipart.map_err(|e| AppError::Multipart(e.body_text()))?;
    let mut form = UserForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Multipart(e.body_text()))?;

                // Browsers send an empty, nameless part when no file was chosen
                form.image = if filename.is_empty() && data.is_empty() {
                    None
                } else {
                    Some(UploadedFile {
                        filename,
                        data: data.to_vec(),
                    })
                };
            }
            "name" | "email" | "consent" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Multipart(e.body_text()))?;
                let value = non_empty(value);
                match name.as_str() {
                    "name" => form.name = value,
                    "email" => form.email = value,
                    _ => form.consent = value,
                }
            }
            other => {
                tracing::trace!("Ignoring form field: {}", other);
            }
        }
    }

    Ok(form)
}
