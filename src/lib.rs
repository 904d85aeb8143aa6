//! Read-only bridge to preferences written by another process.
//!
//! A `PreferenceFacade` answers typed reads from one of two sources: a
//! legacy snapshot left on external storage by older producers, or the
//! live shared-preferences file in the module's data directory. The legacy
//! snapshot wins until the first reload signal, after which the live store
//! is authoritative for good and the legacy data is deleted.
//!
//! ```no_run
//! use prefbridge::{Config, FixedLocation, PreferenceFacade};
//! use prefbridge::signal::{Broadcaster, DEFAULT_RELOAD_ACTION};
//!
//! let config = Config::default();
//! let facade = PreferenceFacade::new(config.layout.clone());
//! let broadcaster = Broadcaster::new();
//!
//! let loader = facade.clone();
//! let ctx: FixedLocation = config.location();
//! let signal = broadcaster.signal(DEFAULT_RELOAD_ACTION);
//! std::thread::spawn(move || loader.load(&ctx, &signal, "settings"));
//!
//! // Blocks until loading has finished.
//! let enabled = facade.get_boolean("enabled", false);
//! # let _ = enabled;
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod locate;
pub mod observability;
pub mod signal;
pub mod store;
pub mod value;

pub use config::{Config, ConfigError, Layout};
pub use error::PrefsError;
pub use facade::{LoadOutcome, PreferenceFacade, SourceKind};
pub use locate::{FixedLocation, LocateError, LocationContext};
pub use signal::{ReloadSignal, Subscription};
pub use value::{ConfigValue, FromConfigValue, PrefsMap};
