//! fOS Mirror - Reactive state binding
//!
//! Keeps DOM regions consistent with a property map. Writes go through a
//! [`Reactive`] handle: watchers run immediately, DOM updates are
//! coalesced into one pass per frame.
//!
//! ```ignore
//! let mirror = Mirror::new(document, frames.clone());
//! let app = mirror.create(State::new().with("count", 0), MirrorConfig::default())?;
//! app.set("count", 1);
//! frames.run_frame();
//! ```

mod value;
mod state;
mod error;
mod config;
mod metadata;
mod template;
mod bindings;
mod watchers;
mod extensions;
mod scheduler;
mod binder;
mod reactive;
pub mod storage;
pub mod catalog;

pub use value::Value;
pub use state::State;
pub use error::MirrorError;
pub use config::{BindingDecl, MirrorConfig, RootTarget};
pub use metadata::{ElementMetadata, MetadataCache, WriteBack};
pub use template::Template;
pub use bindings::{Binding, BindingKind, BindingRegistry};
pub use watchers::{Watcher, WatcherRegistry};
pub use extensions::{ExtensionHandler, ExtensionRegistry};
pub use scheduler::{BatchPhase, BatchScheduler, FrameCallback, FrameQueue, FrameScheduler};
pub use reactive::{EngineStats, Mirror, Reactive, WeakReactive};
pub use storage::{FileStorage, MemoryStorage, StateStorage, StorageError};

pub use fos_dom::NodeId;
