pub mod memory;
pub mod mongo;

pub use memory::InMemoryCatalog;
pub use mongo::DataApiStore;
