use charybdis::macros::charybdis_model;
use charybdis::types::{BigInt, Boolean, Text, Timestamp, Uuid};
use serde::{Deserialize, Serialize};

#[charybdis_model(
    table_name = forms,
    partition_keys = [id],
    clustering_keys = [],
)]
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub title: Text,

    #[serde(default)]
    pub description: Text,

    pub accepting_responses: Boolean,

    // reserved on creation, never changes afterwards
    pub auto_slug: Text,

    pub custom_slug: Option<Text>,

    // `None` until the first reconciliation
    pub current_flow_id: Option<Uuid>,

    #[serde(default)]
    pub current_flow_version: BigInt,

    pub published_at: Option<Timestamp>,

    #[serde(default = "chrono::Utc::now")]
    pub created_at: Timestamp,

    #[serde(default = "chrono::Utc::now")]
    pub updated_at: Timestamp,
}

impl Form {
    pub fn new(title: String, description: String, auto_slug: String) -> Self {
        let now = chrono::Utc::now();

        Self {
            id: Uuid::new_v4(),
            title,
            description,
            accepting_responses: true,
            auto_slug,
            custom_slug: None,
            current_flow_id: None,
            current_flow_version: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Slugs currently pointing at this form, custom first.
    pub fn slugs(&self) -> Vec<&str> {
        self.custom_slug
            .as_deref()
            .into_iter()
            .chain(std::iter::once(self.auto_slug.as_str()))
            .filter(|slug| !slug.is_empty())
            .collect()
    }

    pub fn holds_slug(&self, slug: &str) -> bool {
        self.slugs().iter().any(|held| held.eq_ignore_ascii_case(slug))
    }
}

partial_form!(UpdateAcceptingForm, id, accepting_responses, updated_at);

partial_form!(UpdatePublicationForm, id, custom_slug, published_at, updated_at);

impl From<&Form> for UpdatePublicationForm {
    fn from(form: &Form) -> Self {
        Self {
            id: form.id,
            custom_slug: form.custom_slug.clone(),
            published_at: form.published_at,
            updated_at: form.updated_at,
        }
    }
}
