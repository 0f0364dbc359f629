//! Declarative form validation
//!
//! A [`RuleSet`] lists the rules for each field of a submitted form.
//! Rules are checked in order against whatever the form supplies, and every
//! failure is collected as a human-readable message keyed by field name.
//!
//! A field that is absent (or an empty string) only fails `Required`; every
//! other rule is skipped for it.

use image::ImageFormat;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use validator::ValidateEmail;

/// A file received from a client
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// Filename as sent by the client
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Extension of the client-supplied filename, without the dot
    pub fn client_extension(&self) -> Option<&str> {
        let (stem, extension) = self.filename.rsplit_once('.')?;
        if stem.is_empty() || extension.is_empty() {
            return None;
        }
        Some(extension)
    }

    /// Image type detected from the file contents
    pub fn image_kind(&self) -> Option<ImageKind> {
        ImageKind::sniff(&self.data)
    }

    /// Size in kilobytes, rounded up
    pub fn kilobytes(&self) -> usize {
        self.data.len().div_ceil(1024)
    }
}

/// Image formats accepted as uploads, recognised from their contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Svg,
}

impl ImageKind {
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if let Ok(format) = image::guess_format(data) {
            return match format {
                ImageFormat::Jpeg => Some(Self::Jpeg),
                ImageFormat::Png => Some(Self::Png),
                ImageFormat::Gif => Some(Self::Gif),
                ImageFormat::Bmp => Some(Self::Bmp),
                ImageFormat::WebP => Some(Self::Webp),
                _ => None,
            };
        }

        // SVG is text: look for an <svg> root near the start of the document
        let head = String::from_utf8_lossy(&data[..data.len().min(1024)]);
        let head = head.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with('<') && head.contains("<svg") {
            return Some(Self::Svg);
        }

        None
    }

    /// Extensions this format is known by; the first is canonical
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Gif => &["gif"],
            Self::Bmp => &["bmp"],
            Self::Webp => &["webp"],
            Self::Svg => &["svg"],
        }
    }
}

/// A single field value as seen by the validator
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    File(&'a UploadedFile),
}

impl FieldValue<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::File(file) => file.data.is_empty() && file.filename.is_empty(),
        }
    }
}

/// Anything that can hand field values to a [`RuleSet`]
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// Parse a boolean form value: `true`, `false`, `1` or `0`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    Required,
    String,
    Email,
    /// Characters for text, kilobytes for files
    Max(usize),
    Image,
    Mimes(&'static [&'static str]),
    Boolean,
}

impl Rule {
    /// Check a present value, returning the failure message if any
    fn check(&self, field: &str, value: FieldValue<'_>) -> Option<String> {
        let passes = match (self, value) {
            (Rule::Required, value) => !value.is_empty(),
            (Rule::String, value) => matches!(value, FieldValue::Text(_)),
            (Rule::Email, FieldValue::Text(text)) => text.validate_email(),
            (Rule::Max(limit), FieldValue::Text(text)) => text.chars().count() <= *limit,
            (Rule::Max(limit), FieldValue::File(file)) => file.kilobytes() <= *limit,
            (Rule::Image, FieldValue::File(file)) => file.image_kind().is_some(),
            (Rule::Mimes(allowed), FieldValue::File(file)) => file
                .image_kind()
                .map(|kind| kind.extensions().iter().any(|ext| allowed.contains(ext)))
                .unwrap_or(false),
            (Rule::Boolean, FieldValue::Text(text)) => parse_bool(text).is_some(),
            _ => false,
        };

        if passes {
            return None;
        }

        Some(match self {
            Rule::Required => format!("The {} field is required.", field),
            Rule::String => format!("The {} field must be a string.", field),
            Rule::Email => format!("The {} field must be a valid email address.", field),
            Rule::Max(limit) => match value {
                FieldValue::File(_) => format!(
                    "The {} field must not be greater than {} kilobytes.",
                    field, limit
                ),
                FieldValue::Text(_) => format!(
                    "The {} field must not be greater than {} characters.",
                    field, limit
                ),
            },
            Rule::Image => format!("The {} field must be an image.", field),
            Rule::Mimes(allowed) => format!(
                "The {} field must be a file of type: {}.",
                field,
                allowed.join(", ")
            ),
            Rule::Boolean => format!("The {} field must be true or false.", field),
        })
    }
}

/// Ordered rules per field
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(&'static str, Vec<Rule>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rules: &[Rule]) -> Self {
        self.fields.push((name, rules.to_vec()));
        self
    }

    pub fn validate(&self, source: &impl FieldSource) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        for (name, rules) in &self.fields {
            let value = source.field(name).filter(|value| !value.is_empty());

            let Some(value) = value else {
                if rules.contains(&Rule::Required) {
                    errors.add(name, format!("The {} field is required.", name));
                }
                continue;
            };

            for rule in rules {
                if let Some(message) = rule.check(name, value) {
                    errors.add(name, message);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Field name to failure messages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: String) {
        self.0.entry(field.to_string()).or_default().push(message);
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.values().flatten().map(String::as_str).collect();
        write!(f, "{}", messages.join(" "))
    }
}
