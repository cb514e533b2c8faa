//! Services: statistics, sessions, validation and the backend client

pub mod aggregator;
pub mod api;
pub mod capabilities;
pub mod sequencer;
pub mod session;
pub mod validation;

pub use aggregator::StatsAggregator;
pub use api::{EntryScope, HttpApi, MilkApi};
pub use capabilities::{capabilities_for, Capabilities};
pub use sequencer::{FetchSequencer, FetchTicket};
pub use session::{AuthSession, FileStore, KeyValueStore, MemoryStore, Session};
pub use validation::MilkDraft;
