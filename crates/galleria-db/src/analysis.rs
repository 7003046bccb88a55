//! Term analysis for fuzzy matching.
//!
//! Searchable values are broken into lowercase alphanumeric runs. The
//! PostgreSQL trigger that maintains `image_term` applies the same rule
//! (`regexp_split_to_table(lower(value), '[^[:alnum:]]+')`), so both stores
//! index identical terms.

use std::collections::HashSet;

use galleria_core::Image;

/// Split text into lowercase alphanumeric terms.
pub fn analyze(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|run| !run.is_empty())
        .map(str::to_lowercase)
}

/// Distinct terms across every searchable field of an image.
pub fn analyze_image(image: &Image) -> HashSet<String> {
    image.searchable_values().flat_map(analyze).collect()
}
