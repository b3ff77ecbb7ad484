pub const BATCH_CHUNK_SIZE: usize = 100;

pub const CUSTOM_SLUG_MIN_LEN: usize = 3;
pub const CUSTOM_SLUG_MAX_LEN: usize = 50;
pub const AUTO_SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const DEFAULT_AUTO_SLUG_LEN: usize = 11;
pub const DEFAULT_MAX_AUTO_SLUG_ATTEMPTS: usize = 8;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_FLOW_DEPTH: usize = 256;
