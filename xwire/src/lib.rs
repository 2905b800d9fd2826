//! # xwire — name-based dependency wiring
//!
//! Register providers under logical names, optionally tagged with an
//! environment, then run an entry point: every parameter is resolved by
//! name, recursively, once per run. Activating an environment swaps in
//! its providers without touching any call site.
//!
//! ```rust,ignore
//! use xwire::{injectable, Entrypoint};
//!
//! #[injectable]
//! fn db_string() -> String {
//!     "sqlite:///prod.db".to_string()
//! }
//!
//! #[injectable(name = "users", environment = "fake_users")]
//! fn fake_users() -> Vec<String> {
//!     vec!["u1".into(), "u2".into()]
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let render = Entrypoint::new("render", ["users"], |deps| {
//!         for user in deps.get::<Vec<String>>("users")?.iter() {
//!             println!("{user}");
//!         }
//!         Ok::<_, anyhow::Error>(())
//!     });
//!     xwire::run(&render)
//! }
//! ```

pub use xwire_container::*;
pub use xwire_macros::injectable;
pub use xwire_support::*;

#[cfg(feature = "cli")]
pub mod cli;
pub mod logging;

#[cfg(feature = "cli")]
pub use cli::run;

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
