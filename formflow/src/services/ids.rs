use charybdis::types::Uuid;

/// Source of the opaque identifiers handed out for connections, flow revisions and responses.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Uuid;
}

#[derive(Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}
