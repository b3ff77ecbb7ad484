use crate::constants::{AUTO_SLUG_ALPHABET, CUSTOM_SLUG_MAX_LEN, CUSTOM_SLUG_MIN_LEN};
use crate::errors::FormflowError;
use charybdis::macros::charybdis_model;
use charybdis::types::{Text, Timestamp, Uuid};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SlugKind {
    Auto,
    Custom,
}

/// Reservation row of the single slug namespace shared by auto and custom slugs.
/// The partition key is the lower-cased slug, so uniqueness is case-insensitive.
#[charybdis_model(
    table_name = slugs,
    partition_keys = [slug],
    clustering_keys = [],
)]
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slug {
    pub slug: Text,
    pub form_id: Uuid,
    pub kind: Text,

    #[serde(default = "chrono::Utc::now")]
    pub created_at: Timestamp,
}

impl Slug {
    pub fn new(slug: &str, form_id: Uuid, kind: SlugKind) -> Self {
        Self {
            slug: normalize(slug),
            form_id,
            kind: kind.to_string(),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Outcome of an insert-if-absent on the slug namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugReservation {
    Reserved,
    Taken { form_id: Uuid },
}

pub fn normalize(slug: &str) -> String {
    slug.trim().to_ascii_lowercase()
}

/// Lowercase alphanumerics and hyphens, no leading or trailing hyphen.
pub fn has_valid_format(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Normalizes an owner-supplied slug and checks it before anything touches the namespace.
pub fn validate_custom(candidate: &str) -> Result<String, FormflowError> {
    let slug = normalize(candidate);

    if slug.len() < CUSTOM_SLUG_MIN_LEN || slug.len() > CUSTOM_SLUG_MAX_LEN {
        return Err(FormflowError::InvalidSlugFormat(format!(
            "'{}' must be between {} and {} characters",
            candidate, CUSTOM_SLUG_MIN_LEN, CUSTOM_SLUG_MAX_LEN
        )));
    }

    if !has_valid_format(&slug) {
        return Err(FormflowError::InvalidSlugFormat(format!(
            "'{}' may only contain lowercase letters, numbers and inner hyphens",
            candidate
        )));
    }

    Ok(slug)
}

pub fn generate_auto(len: usize) -> String {
    let mut rng = rand::rng();

    (0..len.max(1))
        .map(|_| AUTO_SLUG_ALPHABET[rng.random_range(0..AUTO_SLUG_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_lowercase_alphanumerics_and_inner_hyphens() {
        assert_eq!(validate_custom("feedback").unwrap(), "feedback");
        assert_eq!(validate_custom("  Team-2024 ").unwrap(), "team-2024");
        assert!(has_valid_format("a-b-c"));
    }

    #[test]
    fn rejects_malformed_slugs() {
        for candidate in ["", "ab", "-team", "team-", "Invalid Slug!", "snake_case", "ümlaut"] {
            let err = validate_custom(candidate).unwrap_err();
            assert!(matches!(err, FormflowError::InvalidSlugFormat(_)), "{}", candidate);
        }

        assert!(validate_custom(&"a".repeat(CUSTOM_SLUG_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn generated_auto_slugs_satisfy_the_shared_format() {
        for _ in 0..50 {
            let slug = generate_auto(11);
            assert_eq!(slug.len(), 11);
            assert!(has_valid_format(&slug), "{}", slug);
        }
    }

    #[test]
    fn reservations_are_keyed_by_lowercased_slug() {
        let slug = Slug::new("Feedback", Uuid::new_v4(), SlugKind::Custom);

        assert_eq!(slug.slug, "feedback");
        assert_eq!(slug.kind, "custom");
    }
}
