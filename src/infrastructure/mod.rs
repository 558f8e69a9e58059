//! Storage backends and the outbound event publisher.

pub mod memory;
pub mod nats;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use nats::NatsPublisher;
pub use postgres::PgStore;
