#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Manifest merge and validation engine for a package-registry cache.
//!
//! Storage, uplink transport and search are reached through the traits in
//! [`manifest::exists`] and [`manifest::uplink`]; everything else here is a
//! pure function over [`manifest::Manifest`] values.

pub mod config;
pub mod error;
pub mod manifest;

pub use config::{Config, UplinkConfig};
pub use error::Error;
pub use manifest::{Manifest, PackageVersion, RegistryError};
