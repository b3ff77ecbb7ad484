use crate::constants::BATCH_CHUNK_SIZE;
use crate::errors::FormflowError;
use crate::models::block::Block;
use crate::models::form::{Form, UpdateAcceptingForm, UpdatePublicationForm};
use crate::models::response_batch::ResponseBatch;
use crate::models::slug::{normalize, Slug, SlugReservation};
use crate::store::Store;
use charybdis::batch::ModelBatch;
use charybdis::operations::{Insert, Update};
use charybdis::types::{BigInt, Timestamp, Uuid};
use futures::StreamExt;
use log::{error, warn};
use scylla::client::caching_session::CachingSession;
use scylla::serialize::row::SerializeRow;
use scylla::value::{CqlValue, Row};
use std::sync::Arc;

const RESERVE_SLUG_QUERY: &str = "
    INSERT INTO slugs (slug, form_id, kind, created_at)
    VALUES (?, ?, ?, ?)
    IF NOT EXISTS
";

const RELEASE_SLUG_QUERY: &str = "
    DELETE FROM slugs
    WHERE slug = ?
    IF form_id = ?
";

const MOVE_FLOW_POINTER_QUERY: &str = "
    UPDATE forms
    SET current_flow_id = ?, current_flow_version = ?, updated_at = ?
    WHERE id = ?
    IF current_flow_version = ?
";

pub struct ScyllaStore {
    db_session: Arc<CachingSession>,
}

impl ScyllaStore {
    pub fn new(db_session: Arc<CachingSession>) -> Self {
        Self { db_session }
    }

    /// Runs a lightweight transaction and reports its `[applied]` column.
    async fn execute_lwt(&self, query: &'static str, values: impl SerializeRow) -> Result<bool, FormflowError> {
        let result = self
            .db_session
            .execute_unpaged(query, values)
            .await
            .map_err(|e| FormflowError::DatabaseError(e.to_string()))?;

        let applied = result
            .into_rows_result()
            .map_err(|e| FormflowError::DatabaseError(e.to_string()))?
            .maybe_first_row::<Row>()
            .map_err(|e| FormflowError::DatabaseError(e.to_string()))?
            .and_then(|row| row.columns.into_iter().next().flatten())
            .is_some_and(|applied| matches!(applied, CqlValue::Boolean(true)));

        Ok(applied)
    }
}

impl Store for ScyllaStore {
    async fn insert_form(&self, form: &Form) -> Result<(), FormflowError> {
        form.insert().execute(&self.db_session).await?;

        Ok(())
    }

    async fn find_form(&self, form_id: Uuid) -> Result<Option<Form>, FormflowError> {
        let form = Form::maybe_find_first_by_id(form_id).execute(&self.db_session).await?;

        Ok(form)
    }

    async fn update_accepting(
        &self,
        form_id: Uuid,
        accepting: bool,
        updated_at: Timestamp,
    ) -> Result<(), FormflowError> {
        let form = UpdateAcceptingForm {
            id: form_id,
            accepting_responses: accepting,
            updated_at,
        };

        form.update().execute(&self.db_session).await?;

        Ok(())
    }

    async fn update_publication(&self, form: &Form) -> Result<(), FormflowError> {
        UpdatePublicationForm::from(form)
            .update()
            .execute(&self.db_session)
            .await?;

        Ok(())
    }

    async fn delete_form(&self, form_id: Uuid) -> Result<(), FormflowError> {
        Block::delete_by_form_id(form_id)
            .execute(&self.db_session)
            .await
            .map_err(|err| {
                error!("delete blocks of form {}: {}", form_id, err);
                err
            })?;

        ResponseBatch::delete_by_form_id(form_id)
            .execute(&self.db_session)
            .await
            .map_err(|err| {
                error!("delete responses of form {}: {}", form_id, err);
                err
            })?;

        // the form row goes last so a failed cleanup can be retried
        Form::delete_by_id(form_id).execute(&self.db_session).await?;

        Ok(())
    }

    async fn find_flow_blocks(&self, form_id: Uuid, flow_id: Uuid) -> Result<Vec<Block>, FormflowError> {
        let blocks = Block::find_by_form_id_and_flow_id(form_id, flow_id)
            .execute(&self.db_session)
            .await?
            .try_collect()
            .await?;

        Ok(blocks)
    }

    async fn find_all_blocks(&self, form_id: Uuid) -> Result<Vec<Block>, FormflowError> {
        let blocks = Block::find_by_form_id(form_id)
            .execute(&self.db_session)
            .await?
            .try_collect()
            .await?;

        Ok(blocks)
    }

    async fn replace_flow(
        &self,
        form_id: Uuid,
        expected_version: BigInt,
        flow_id: Uuid,
        version: BigInt,
        blocks: &[Block],
    ) -> Result<(), FormflowError> {
        let blocks = blocks.to_vec();

        // rows of an unreferenced revision are invisible, so a failure here leaves readers untouched
        Block::unlogged_batch()
            .chunked_insert(&self.db_session, &blocks, BATCH_CHUNK_SIZE)
            .await
            .map_err(|err| {
                error!("insert blocks of flow {}: {}", flow_id, err);
                err
            })?;

        let applied = self
            .execute_lwt(
                MOVE_FLOW_POINTER_QUERY,
                (flow_id, version, chrono::Utc::now(), form_id, expected_version),
            )
            .await?;

        if !applied {
            if let Err(err) = Block::delete_by_form_id_and_flow_id(form_id, flow_id)
                .execute(&self.db_session)
                .await
            {
                warn!("failed to clean up rejected flow {} of form {}: {}", flow_id, form_id, err);
            }

            return Err(FormflowError::Conflict(format!(
                "flow of form {} is no longer at version {}",
                form_id, expected_version
            )));
        }

        Ok(())
    }

    async fn reserve_slug(&self, slug: &Slug) -> Result<SlugReservation, FormflowError> {
        let applied = self
            .execute_lwt(
                RESERVE_SLUG_QUERY,
                (&slug.slug, slug.form_id, &slug.kind, slug.created_at),
            )
            .await?;

        if applied {
            return Ok(SlugReservation::Reserved);
        }

        // the holder may have released it in between; the caller treats it as taken either way
        let form_id = self
            .find_slug(&slug.slug)
            .await?
            .map(|held| held.form_id)
            .unwrap_or_default();

        Ok(SlugReservation::Taken { form_id })
    }

    async fn find_slug(&self, slug: &str) -> Result<Option<Slug>, FormflowError> {
        let slug = Slug::maybe_find_first_by_slug(normalize(slug))
            .execute(&self.db_session)
            .await?;

        Ok(slug)
    }

    async fn release_slug(&self, slug: &str, form_id: Uuid) -> Result<(), FormflowError> {
        let released = self.execute_lwt(RELEASE_SLUG_QUERY, (normalize(slug), form_id)).await?;

        if !released {
            warn!("slug '{}' was not held by form {}, nothing released", slug, form_id);
        }

        Ok(())
    }

    async fn insert_response(&self, batch: &ResponseBatch) -> Result<(), FormflowError> {
        batch.insert().execute(&self.db_session).await?;

        Ok(())
    }

    async fn find_response(&self, form_id: Uuid, response_id: Uuid) -> Result<Option<ResponseBatch>, FormflowError> {
        let batch = ResponseBatch::maybe_find_first_by_form_id_and_id(form_id, response_id)
            .execute(&self.db_session)
            .await?;

        Ok(batch)
    }

    async fn find_response_page(
        &self,
        form_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<ResponseBatch>, usize), FormflowError> {
        let mut responses = ResponseBatch::find_by_form_id(form_id)
            .execute(&self.db_session)
            .await?;

        // rows outside the window are only counted
        let mut page = Vec::with_capacity(limit);
        let mut total = 0;

        while let Some(result) = responses.next().await {
            let batch = result?;

            if total >= offset && page.len() < limit {
                page.push(batch);
            }

            total += 1;
        }

        Ok((page, total))
    }
}
