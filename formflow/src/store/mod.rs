use crate::errors::FormflowError;
use crate::models::block::Block;
use crate::models::form::Form;
use crate::models::response_batch::ResponseBatch;
use crate::models::slug::{Slug, SlugReservation};
use charybdis::types::{BigInt, Timestamp, Uuid};

pub mod memory;
pub mod scylla_store;

pub use memory::MemoryStore;
pub use scylla_store::ScyllaStore;

/// Persistence seam of the engine.
///
/// The two conditional operations carry all cross-process guarantees:
/// `reserve_slug` is an insert-if-absent on the slug namespace and `replace_flow` only moves the
/// form's flow pointer when `expected_version` is still current.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn insert_form(&self, form: &Form) -> Result<(), FormflowError>;

    async fn find_form(&self, form_id: Uuid) -> Result<Option<Form>, FormflowError>;

    async fn update_accepting(&self, form_id: Uuid, accepting: bool, updated_at: Timestamp)
        -> Result<(), FormflowError>;

    /// Persists `custom_slug`, `published_at` and `updated_at`.
    async fn update_publication(&self, form: &Form) -> Result<(), FormflowError>;

    /// Removes all flow revisions and responses of the form, then the form row itself. A failure
    /// before the last step leaves the form readable.
    async fn delete_form(&self, form_id: Uuid) -> Result<(), FormflowError>;

    async fn find_flow_blocks(&self, form_id: Uuid, flow_id: Uuid) -> Result<Vec<Block>, FormflowError>;

    /// Every revision ever written for the form, orphaned blocks included.
    async fn find_all_blocks(&self, form_id: Uuid) -> Result<Vec<Block>, FormflowError>;

    /// Writes `blocks` as revision `flow_id` and points the form at it, provided the form is still
    /// at `expected_version`. Fails with `Conflict` otherwise and leaves the current revision as is.
    async fn replace_flow(
        &self,
        form_id: Uuid,
        expected_version: BigInt,
        flow_id: Uuid,
        version: BigInt,
        blocks: &[Block],
    ) -> Result<(), FormflowError>;

    async fn reserve_slug(&self, slug: &Slug) -> Result<SlugReservation, FormflowError>;

    async fn find_slug(&self, slug: &str) -> Result<Option<Slug>, FormflowError>;

    /// Removes the reservation only while it still belongs to `form_id`.
    async fn release_slug(&self, slug: &str, form_id: Uuid) -> Result<(), FormflowError>;

    async fn insert_response(&self, batch: &ResponseBatch) -> Result<(), FormflowError>;

    async fn find_response(&self, form_id: Uuid, response_id: Uuid) -> Result<Option<ResponseBatch>, FormflowError>;

    /// One page of the form's responses, newest first, with the total number of responses.
    async fn find_response_page(
        &self,
        form_id: Uuid,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<ResponseBatch>, usize), FormflowError>;
}
