pub mod block;
pub mod form;
pub mod response_batch;
pub mod slug;
pub mod udts;
