//! crates/studybank_core/src/image.rs
//!
//! Pure helpers that turn a stored image descriptor into something a view
//! can render: a cache-busted URL, a provider-side rotated URL, and a CSS
//! rotation style.

use crate::domain::{ImageDescriptor, Rotation};
use chrono::{DateTime, Utc};
use std::fmt;

/// Segment that precedes the transformation list in a Cloudinary delivery URL.
const UPLOAD_SEGMENT: &str = "/upload/";

/// The image URL with a cache buster derived from `updated_at` appended.
/// Existing query parameters are kept as they are.
pub fn display_url(image: &ImageDescriptor, updated_at: Option<DateTime<Utc>>) -> String {
    if image.url.is_empty() {
        return String::new();
    }
    match updated_at {
        Some(updated_at) => with_cache_buster(&image.url, updated_at),
        None => image.url.clone(),
    }
}

/// A URL for which the image provider applies the stored rotation itself.
/// Falls back to `display_url` when there is nothing to rotate or the URL
/// is not one the provider can transform.
pub fn rotated_url(image: &ImageDescriptor, updated_at: Option<DateTime<Utc>>) -> String {
    if image.rotation.is_zero() || image.public_id.is_none() {
        return display_url(image, updated_at);
    }

    match transformation_url(&image.url, image.rotation) {
        Some(url) => match updated_at {
            Some(updated_at) => with_cache_buster(&url, updated_at),
            None => url,
        },
        None => display_url(image, updated_at),
    }
}

/// CSS rotation for rendering the stored image client-side.
pub fn image_style(image: &ImageDescriptor) -> ImageStyle {
    ImageStyle {
        rotation: image.rotation,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageStyle {
    pub rotation: Rotation,
}

impl ImageStyle {
    pub const TRANSITION: &'static str = "transform 0.3s ease";

    pub fn transform(&self) -> String {
        format!("rotate({}deg)", self.rotation.degrees())
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "transform: {}; transition: {}",
            self.transform(),
            Self::TRANSITION
        )
    }
}

fn with_cache_buster(url: &str, updated_at: DateTime<Utc>) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", url, separator, updated_at.timestamp_millis())
}

/// Inserts `a_<deg>` as the first transformation after `/upload/`,
/// replacing an angle already there.
fn transformation_url(url: &str, rotation: Rotation) -> Option<String> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return None;
    }
    let split = url.find(UPLOAD_SEGMENT)? + UPLOAD_SEGMENT.len();
    let (head, tail) = url.split_at(split);

    let tail = match tail.split_once('/') {
        Some((first, rest)) if is_angle(first) => rest,
        _ => tail,
    };
    if tail.is_empty() {
        return None;
    }
    Some(format!("{}a_{}/{}", head, rotation.degrees(), tail))
}

fn is_angle(segment: &str) -> bool {
    segment
        .strip_prefix("a_")
        .is_some_and(|deg| !deg.is_empty() && deg.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn display_url_without_timestamp_is_unchanged() {
        let image = ImageDescriptor::new("https://x/y.jpg?sig=abc");
        assert_eq!(display_url(&image, None), "https://x/y.jpg?sig=abc");
        assert_eq!(display_url(&ImageDescriptor::new(""), Some(at())), "");
    }

    #[test]
    fn display_url_appends_epoch_millis() {
        assert_eq!(
            display_url(&ImageDescriptor::new("https://x/y.jpg"), Some(at())),
            "https://x/y.jpg?t=1700000000123"
        );
        assert_eq!(
            display_url(&ImageDescriptor::new("https://x/y.jpg?a=1"), Some(at())),
            "https://x/y.jpg?a=1&t=1700000000123"
        );
    }

    #[test]
    fn unrotated_image_uses_display_url() {
        let image = ImageDescriptor::new("https://res.cloudinary.com/demo/image/upload/sample.jpg")
            .with_public_id("sample");
        assert_eq!(rotated_url(&image, Some(at())), display_url(&image, Some(at())));
    }

    #[test]
    fn rotated_url_inserts_angle_transformation() {
        let image = ImageDescriptor::new("https://res.cloudinary.com/demo/image/upload/v1/sample.jpg")
            .with_public_id("sample")
            .with_rotation(Rotation::Deg90);

        assert_eq!(
            rotated_url(&image, Some(at())),
            "https://res.cloudinary.com/demo/image/upload/a_90/v1/sample.jpg?t=1700000000123"
        );

        let rerotated = ImageDescriptor {
            url: "https://res.cloudinary.com/demo/image/upload/a_90/v1/sample.jpg".to_string(),
            ..image.with_rotation(Rotation::Deg270)
        };
        assert_eq!(
            rotated_url(&rerotated, None),
            "https://res.cloudinary.com/demo/image/upload/a_270/v1/sample.jpg"
        );
    }

    #[test]
    fn untransformable_urls_fall_back() {
        let image = ImageDescriptor::new("https://cdn.example.com/y.jpg")
            .with_public_id("y")
            .with_rotation(Rotation::Deg180);
        assert_eq!(rotated_url(&image, Some(at())), display_url(&image, Some(at())));

        let image = ImageDescriptor::new("https://res.cloudinary.com/demo/image/upload/sample.jpg")
            .with_rotation(Rotation::Deg180);
        assert_eq!(rotated_url(&image, None), image.url);
    }

    #[test]
    fn style_reflects_stored_rotation() {
        let style = image_style(&ImageDescriptor::new("u").with_rotation(Rotation::Deg180));
        assert_eq!(
            style.to_string(),
            "transform: rotate(180deg); transition: transform 0.3s ease"
        );
        assert_eq!(image_style(&ImageDescriptor::new("u")).transform(), "rotate(0deg)");
    }
}
