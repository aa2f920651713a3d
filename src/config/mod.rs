//! Configuration loading and validation for revkeep.
//!
//! Settings live in a single YAML document. Every key is optional.
//!
//! # Example
//!
//! ```
//! use revkeep::config::Settings;
//!
//! let settings = Settings::from_yaml("prune_added: true\nevent_queue_limit: 64").unwrap();
//! settings.validate().unwrap();
//! assert!(settings.prune_added);
//! assert_eq!(settings.admin_dir, ".svn");
//! ```

pub mod settings;

pub use settings::Settings;
