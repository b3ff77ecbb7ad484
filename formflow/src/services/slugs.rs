use crate::errors::FormflowError;
use crate::models::form::Form;
use crate::models::slug::{generate_auto, normalize, validate_custom, Slug, SlugKind, SlugReservation};
use crate::services::engine::FormEngine;
use crate::services::flows::snapshot::PublicForm;
use crate::store::Store;
use charybdis::types::{Timestamp, Uuid};
use log::{debug, error, info, warn};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishedSlugs {
    pub auto_slug: String,
    pub custom_slug: Option<String>,
    pub auto_url: String,
    pub custom_url: Option<String>,
    pub published_at: Option<Timestamp>,
}

impl From<&Form> for PublishedSlugs {
    fn from(form: &Form) -> Self {
        Self {
            auto_slug: form.auto_slug.clone(),
            custom_slug: form.custom_slug.clone(),
            auto_url: format!("/f/{}", form.auto_slug),
            custom_url: form.custom_slug.as_ref().map(|slug| format!("/f/{}", slug)),
            published_at: form.published_at,
        }
    }
}

impl<S: Store> FormEngine<S> {
    /// Reserves a random slug for `form_id`, retrying on collisions.
    pub async fn allocate_auto_slug(&self, form_id: Uuid) -> Result<String, FormflowError> {
        for attempt in 1..=self.config.max_auto_slug_attempts.max(1) {
            let candidate = generate_auto(self.config.auto_slug_len);

            match self.store.reserve_slug(&Slug::new(&candidate, form_id, SlugKind::Auto)).await? {
                SlugReservation::Reserved => return Ok(candidate),
                SlugReservation::Taken { .. } => {
                    debug!("auto slug '{}' collided on attempt {}", candidate, attempt);
                }
            }
        }

        Err(FormflowError::InternalServerError(format!(
            "could not allocate an auto slug for form {}",
            form_id
        )))
    }

    /// Validates `candidate` and reserves it for `form_id`.
    ///
    /// Format errors are raised before the namespace is touched. A slug held by any other form,
    /// or used as this form's auto slug, is a `SlugConflict`.
    pub async fn reserve_custom_slug(&self, form_id: Uuid, candidate: &str) -> Result<String, FormflowError> {
        let slug = validate_custom(candidate)?;

        match self.store.reserve_slug(&Slug::new(&slug, form_id, SlugKind::Custom)).await? {
            SlugReservation::Reserved => Ok(slug),
            SlugReservation::Taken { form_id: holder } => {
                // left behind by an earlier publish of this form that failed half-way
                if holder == form_id {
                    let held = self.store.find_slug(&slug).await?;

                    if held.is_some_and(|held| held.kind == SlugKind::Custom.to_string()) {
                        return Ok(slug);
                    }
                }

                warn!("slug '{}' requested by form {} is already taken", slug, form_id);

                Err(FormflowError::SlugConflict(format!("slug '{}' is already taken", slug)))
            }
        }
    }

    /// Resolves a slug of either kind, case-insensitively, to its form.
    pub async fn resolve_slug(&self, slug: &str) -> Result<Uuid, FormflowError> {
        let normalized = normalize(slug);

        if normalized.is_empty() {
            return Err(FormflowError::NotFound("slug not found".to_string()));
        }

        self.store
            .find_slug(&normalized)
            .await?
            .map(|held| held.form_id)
            .ok_or_else(|| FormflowError::NotFound(format!("slug '{}' not found", normalized)))
    }

    /// Marks the form as published, optionally switching its custom slug.
    ///
    /// The new custom slug is reserved before the form is updated and the old one is released
    /// only afterwards, so a failure at any step leaves the form with a usable slug.
    pub async fn publish(&self, form_id: Uuid, custom_slug: Option<&str>) -> Result<PublishedSlugs, FormflowError> {
        let candidate = custom_slug.map(validate_custom).transpose()?;

        let _guard = self.locker.lock(form_id).await;
        let mut form = self.find_form(form_id).await?;
        let previous_custom = form.custom_slug.clone();
        let mut reserved = None;

        if let Some(slug) = candidate {
            if previous_custom.as_deref() != Some(slug.as_str()) {
                reserved = Some(self.reserve_custom_slug(form_id, &slug).await?);
            }

            form.custom_slug = Some(slug);
        }

        let now = chrono::Utc::now();
        form.published_at.get_or_insert(now);
        form.updated_at = now;

        if let Err(e) = self.store.update_publication(&form).await {
            if let Some(slug) = &reserved {
                if let Err(release_err) = self.store.release_slug(slug, form_id).await {
                    error!("failed to roll back slug '{}' of form {}: {}", slug, form_id, release_err);
                }
            }

            return Err(e);
        }

        if let (Some(_), Some(old)) = (&reserved, &previous_custom) {
            if let Err(e) = self.store.release_slug(old, form_id).await {
                warn!("failed to release previous slug '{}' of form {}: {}", old, form_id, e);
            }
        }

        info!("published form {} as {:?}", form_id, form.slugs());

        Ok(PublishedSlugs::from(&form))
    }

    /// Public read of a published form through any of its slugs.
    pub async fn resolve_public_form(&self, slug: &str) -> Result<PublicForm, FormflowError> {
        let form = self.find_form_by_slug(slug).await?;

        if !form.is_published() {
            return Err(FormflowError::NotFound(format!("slug '{}' not found", normalize(slug))));
        }

        let flow = self.current_snapshot(&form).await?;

        Ok(PublicForm::new(&form, flow))
    }

    /// The form a slug points at, provided the form still lists that slug as its own.
    pub(crate) async fn find_form_by_slug(&self, slug: &str) -> Result<Form, FormflowError> {
        let form_id = self.resolve_slug(slug).await?;
        let not_found = || FormflowError::NotFound(format!("slug '{}' not found", normalize(slug)));

        let form = self.store.find_form(form_id).await?.ok_or_else(not_found)?;

        if !form.holds_slug(&normalize(slug)) {
            return Err(not_found());
        }

        Ok(form)
    }
}
