// # ipsetter-core
//
// Core library for the one-shot DNS A record reconciler.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for discovering the caller's current public IP
// - **DnsProvider**: Trait for listing, fetching, creating and editing records
// - **StateStore**: Optional memory of the last record identifier written
// - **resolver**: Pure decision over a record listing (create / update / skip)
// - **RecordSetter**: One reconciliation pass through a `DnsProvider`
// - **Engine**: Discover IP → consult store → `RecordSetter` → remember result
//
// ## Design Principles
//
// 1. **One pass per process**: nothing is spawned, nothing loops
// 2. **Fresh remote state**: a remembered identifier is a hint, never truth
// 3. **At most one write**: create XOR edit, or nothing at all
// 4. **No retries**: failures are classified and returned to the caller

pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod record;
pub mod resolver;
pub mod setter;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{Config, DnsConfig};
pub use credentials::{StaticToken, TokenSource};
pub use engine::{Engine, PassReport};
pub use error::{Error, Result, WriteAction};
pub use record::{DesiredState, EditRequest, RecordId, RecordType, RemoteRecord};
pub use resolver::{Decision, resolve};
pub use setter::{Outcome, RecordSetter};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{DnsProvider, IpSource, StateStore};
