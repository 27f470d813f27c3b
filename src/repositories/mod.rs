pub mod memory;
pub mod status;

pub use memory::MemoryStatusRepository;
pub use status::{PgStatusRepository, StatusStore};

#[cfg(test)]
pub use status::MockStatusStore;
