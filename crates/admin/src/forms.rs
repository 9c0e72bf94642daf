//! Product create/update forms.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;

use crate::AdminError;

/// An image file attached to a product form.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Read an image from disk, guessing its content type from the extension.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Image` if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, AdminError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AdminError::Image {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(Self {
            content_type: content_type_for(&file_name),
            file_name,
            bytes,
        })
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Fields of the admin product form.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    /// Replaces the product image when present.
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    /// Check the form before it is sent.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` naming the first invalid field.
    pub fn validate(&self) -> Result<(), AdminError> {
        if self.title.trim().is_empty() {
            return Err(AdminError::Validation("title is required".to_string()));
        }
        if self.category.trim().is_empty() {
            return Err(AdminError::Validation("category is required".to_string()));
        }
        if self.price < Decimal::ZERO {
            return Err(AdminError::Validation("price cannot be negative".to_string()));
        }
        Ok(())
    }

    /// Encode as the multipart body the backend expects.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Api` if the image part cannot be built.
    pub fn to_multipart(&self) -> Result<Form, AdminError> {
        let form = Form::new()
            .text("title", self.title.trim().to_string())
            .text("description", self.description.clone())
            .text("price", self.price.normalize().to_string())
            .text("category", self.category.trim().to_string());

        let Some(image) = &self.image else {
            return Ok(form);
        };
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(image.content_type)
            .map_err(souk_storefront::ApiError::from)?;
        Ok(form.part("image", part))
    }
}
