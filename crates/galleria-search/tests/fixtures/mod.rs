//! Image fixtures for search tests.

#![allow(dead_code)]

use galleria_core::Image;
use uuid::Uuid;

pub use galleria_db::test_fixtures::gallery_images;

/// Three images: cat-only (1), dog-only (2), neither (3).
pub fn animals() -> Vec<Image> {
    vec![
        Image::new(Uuid::from_u128(1)).with_auto_tags(["cat"]),
        Image::new(Uuid::from_u128(2)).with_user_tags(["dog"]),
        Image::new(Uuid::from_u128(3)).with_description("an empty beach"),
    ]
}

/// Fifteen images tagged `mountains`, each with its own distinct
/// `mountain view N` tag.
pub fn mountain_suggestion_images() -> Vec<Image> {
    (1..=15)
        .map(|n| {
            Image::new(Uuid::from_u128(n))
                .with_user_tags(["mountains"])
                .with_auto_tags([format!("mountain view {}", n)])
        })
        .collect()
}

/// Images for fuzzy-matching checks.
///
/// | id | tag       |
/// |----|-----------|
/// | 1  | mountains |
/// | 2  | ca        |
/// | 3  | cat       |
/// | 4  | car       |
pub fn fuzzy_images() -> Vec<Image> {
    vec![
        Image::new(Uuid::from_u128(1)).with_user_tags(["mountains"]),
        Image::new(Uuid::from_u128(2)).with_user_tags(["ca"]),
        Image::new(Uuid::from_u128(3)).with_user_tags(["cat"]),
        Image::new(Uuid::from_u128(4)).with_user_tags(["car"]),
    ]
}
