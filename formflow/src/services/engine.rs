use crate::constants::{
    DEFAULT_AUTO_SLUG_LEN, DEFAULT_MAX_AUTO_SLUG_ATTEMPTS, DEFAULT_MAX_FLOW_DEPTH, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::errors::FormflowError;
use crate::models::form::Form;
use crate::resources::resource_locker::ResourceLocker;
use crate::services::flows::snapshot::FlowSnapshot;
use crate::services::ids::{IdGenerator, UuidGenerator};
use crate::store::Store;
use charybdis::types::Uuid;
use futures::future::join_all;
use log::{error, info};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub auto_slug_len: usize,
    pub max_auto_slug_attempts: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,

    /// Deepest nesting level a flow may reach; roots sit at level 0.
    pub max_flow_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_slug_len: DEFAULT_AUTO_SLUG_LEN,
            max_auto_slug_attempts: DEFAULT_MAX_AUTO_SLUG_ATTEMPTS,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            max_flow_depth: DEFAULT_MAX_FLOW_DEPTH,
        }
    }
}

/// Entry point of the form backend. Owner operations on one form are serialized by the
/// locker; public reads and submissions only rely on versioned reads from the store.
pub struct FormEngine<S: Store> {
    pub(crate) store: S,
    pub(crate) locker: ResourceLocker,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) config: EngineConfig,
}

impl<S: Store> FormEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            locker: ResourceLocker::default(),
            ids: Arc::new(UuidGenerator),
            config,
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates an unpublished form that already owns its auto slug.
    pub async fn create_form(&self, title: &str, description: &str) -> Result<Form, FormflowError> {
        let title = title.trim();

        if title.is_empty() {
            return Err(FormflowError::ValidationError((
                "title".to_string(),
                "can't be blank".to_string(),
            )));
        }

        let mut form = Form::new(title.to_string(), description.trim().to_string(), String::new());
        form.auto_slug = self.allocate_auto_slug(form.id).await?;

        if let Err(e) = self.store.insert_form(&form).await {
            if let Err(release_err) = self.store.release_slug(&form.auto_slug, form.id).await {
                error!("failed to release auto slug '{}': {}", form.auto_slug, release_err);
            }

            return Err(e);
        }

        info!("created form {} with auto slug '{}'", form.id, form.auto_slug);

        Ok(form)
    }

    pub async fn get_form(&self, form_id: Uuid) -> Result<Form, FormflowError> {
        self.find_form(form_id).await
    }

    /// Removes the form with its revisions and responses, then frees both slugs.
    pub async fn delete_form(&self, form_id: Uuid) -> Result<(), FormflowError> {
        let _guard = self.locker.lock(form_id).await;
        let form = self.find_form(form_id).await?;

        self.store.delete_form(form_id).await?;

        let slugs = form.slugs();
        let releases = join_all(slugs.iter().map(|slug| self.store.release_slug(slug, form_id))).await;

        for (slug, result) in slugs.iter().zip(releases) {
            if let Err(e) = result {
                error!("failed to release slug '{}' of deleted form {}: {}", slug, form_id, e);
            }
        }

        info!("deleted form {}", form_id);

        Ok(())
    }

    /// Toggles public submissions. Independent of flow edits and publication.
    pub async fn set_accepting(&self, form_id: Uuid, accepting: bool) -> Result<(), FormflowError> {
        let _guard = self.locker.lock(form_id).await;

        self.find_form(form_id).await?;
        self.store
            .update_accepting(form_id, accepting, chrono::Utc::now())
            .await?;

        info!("form {} accepting responses: {}", form_id, accepting);

        Ok(())
    }

    pub(crate) async fn find_form(&self, form_id: Uuid) -> Result<Form, FormflowError> {
        self.store
            .find_form(form_id)
            .await?
            .ok_or_else(|| FormflowError::NotFound(format!("form {} not found", form_id)))
    }

    /// Snapshot of the revision the form currently points at.
    pub(crate) async fn current_snapshot(&self, form: &Form) -> Result<FlowSnapshot, FormflowError> {
        match form.current_flow_id {
            Some(flow_id) => {
                let blocks = self.store.find_flow_blocks(form.id, flow_id).await?;

                Ok(FlowSnapshot::build(flow_id, form.current_flow_version, &blocks))
            }
            None => Ok(FlowSnapshot::default()),
        }
    }
}
