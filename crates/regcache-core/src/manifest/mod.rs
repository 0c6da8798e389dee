//! Manifest engine.
//!
//! Provides:
//! - A typed manifest model with lossless round-trips of unknown fields
//! - Normalization of malformed manifests and revision stamping
//! - Effective readme resolution
//! - Client projection and search records
//! - Dist-tag assignment and publish body validation
//! - Merging cached manifests with uplink manifests
//! - Existence checks against the local store and uplinks
//! - HTTP uplinks and concurrent fan-out synchronization

pub mod error;
pub mod exists;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod project;
pub mod publish;
pub mod readme;
pub mod tags;
pub mod uplink;
pub mod version;

pub use error::{codes as registry_codes, RegistryError};
pub use exists::{
    add_package, check_local, check_remote, prepare_publish, publish_package, PackageStore,
    SyncOptions, SyncOutcome, UplinkSync,
};
pub use merge::{attach_uplink_metadata, attach_uplink_metadata_at, merge, merge_time};
pub use model::{Manifest, PackageVersion, UplinkMeta, DEFAULT_REVISION, LATEST_TAG};
pub use normalize::{new_manifest, next_revision, normalize, normalize_dist_tags};
pub use project::{
    normalize_contributors, project, search_projection, Contributor, SearchEntry, CLIENT_FIELDS,
};
pub use publish::{is_malformed_publish, is_publishable};
pub use readme::{latest_readme, strip_readme, README_TAG_PRIORITY};
pub use tags::set_tag;
pub use uplink::{FanoutSync, Fetched, HttpUplink, Uplink};
