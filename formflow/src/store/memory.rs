use crate::errors::FormflowError;
use crate::models::block::Block;
use crate::models::form::Form;
use crate::models::response_batch::ResponseBatch;
use crate::models::slug::{normalize, Slug, SlugReservation};
use crate::store::Store;
use charybdis::types::{BigInt, Timestamp, Uuid};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Process-local store. Conditional writes are atomic per key through the map's entry locks.
#[derive(Default)]
pub struct MemoryStore {
    forms: DashMap<Uuid, Form>,
    blocks: DashMap<Uuid, Vec<Block>>,
    slugs: DashMap<String, Slug>,
    responses: DashMap<Uuid, Vec<ResponseBatch>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug_count(&self) -> usize {
        self.slugs.len()
    }

    fn form_not_found(form_id: Uuid) -> FormflowError {
        FormflowError::NotFound(format!("form {} not found", form_id))
    }
}

impl Store for MemoryStore {
    async fn insert_form(&self, form: &Form) -> Result<(), FormflowError> {
        self.forms.insert(form.id, form.clone());

        Ok(())
    }

    async fn find_form(&self, form_id: Uuid) -> Result<Option<Form>, FormflowError> {
        Ok(self.forms.get(&form_id).map(|form| form.clone()))
    }

    async fn update_accepting(
        &self,
        form_id: Uuid,
        accepting: bool,
        updated_at: Timestamp,
    ) -> Result<(), FormflowError> {
        let mut form = self.forms.get_mut(&form_id).ok_or_else(|| Self::form_not_found(form_id))?;
        form.accepting_responses = accepting;
        form.updated_at = updated_at;

        Ok(())
    }

    async fn update_publication(&self, form: &Form) -> Result<(), FormflowError> {
        let mut stored = self.forms.get_mut(&form.id).ok_or_else(|| Self::form_not_found(form.id))?;
        stored.custom_slug = form.custom_slug.clone();
        stored.published_at = form.published_at;
        stored.updated_at = form.updated_at;

        Ok(())
    }

    async fn delete_form(&self, form_id: Uuid) -> Result<(), FormflowError> {
        self.blocks.remove(&form_id);
        self.responses.remove(&form_id);
        self.forms.remove(&form_id);

        Ok(())
    }

    async fn find_flow_blocks(&self, form_id: Uuid, flow_id: Uuid) -> Result<Vec<Block>, FormflowError> {
        let blocks = self
            .blocks
            .get(&form_id)
            .map(|blocks| blocks.iter().filter(|b| b.flow_id == flow_id).cloned().collect())
            .unwrap_or_default();

        Ok(blocks)
    }

    async fn find_all_blocks(&self, form_id: Uuid) -> Result<Vec<Block>, FormflowError> {
        Ok(self.blocks.get(&form_id).map(|blocks| blocks.clone()).unwrap_or_default())
    }

    async fn replace_flow(
        &self,
        form_id: Uuid,
        expected_version: BigInt,
        flow_id: Uuid,
        version: BigInt,
        blocks: &[Block],
    ) -> Result<(), FormflowError> {
        // the form entry stays locked until the pointer moved, which makes the check-and-set atomic
        let mut form = self.forms.get_mut(&form_id).ok_or_else(|| Self::form_not_found(form_id))?;

        if form.current_flow_version != expected_version {
            return Err(FormflowError::Conflict(format!(
                "flow of form {} moved from version {} to {}",
                form_id, expected_version, form.current_flow_version
            )));
        }

        self.blocks.entry(form_id).or_default().extend(blocks.iter().cloned());

        form.current_flow_id = Some(flow_id);
        form.current_flow_version = version;
        form.updated_at = chrono::Utc::now();

        Ok(())
    }

    async fn reserve_slug(&self, slug: &Slug) -> Result<SlugReservation, FormflowError> {
        match self.slugs.entry(normalize(&slug.slug)) {
            Entry::Occupied(existing) => Ok(SlugReservation::Taken {
                form_id: existing.get().form_id,
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(slug.clone());

                Ok(SlugReservation::Reserved)
            }
        }
    }

    async fn find_slug(&self, slug: &str) -> Result<Option<Slug>, FormflowError> {
        Ok(self.slugs.get(&normalize(slug)).map(|slug| slug.clone()))
    }

    async fn release_slug(&self, slug: &str, form_id: Uuid) -> Result<(), FormflowError> {
        self.slugs.remove_if(&normalize(slug), |_, held| held.form_id == form_id);

        Ok(())
    }

    async fn insert_response(&self, batch: &ResponseBatch) -> Result<(), FormflowError> {
        self.responses.entry(batch.form_id).or_default().push(batch.clone());

        Ok(())
    }

    async fn find_response(&self, form_id: Uuid, response_id: Uuid) -> Result<Option<ResponseBatch>, FormflowError> {
        let batch = self
            .responses
            .get(&form_id)
            .and_then(|responses| responses.iter().find(|batch| batch.id == response_id).cloned());

        Ok(batch)
    }

    async fn find_response_page(
        &self,
        form_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<ResponseBatch>, usize), FormflowError> {
        let Some(responses) = self.responses.get(&form_id) else {
            return Ok((vec![], 0));
        };

        let mut newest_first: Vec<&ResponseBatch> = responses.iter().collect();

        // mirrors the clustering order of the table
        newest_first.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then_with(|| b.id.cmp(&a.id)));

        let page = newest_first.into_iter().skip(offset).take(limit).cloned().collect();

        Ok((page, responses.len()))
    }
}
