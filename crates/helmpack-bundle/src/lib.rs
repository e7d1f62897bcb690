//! helmpack Bundle - packaging and publishing air-gapped bundles
//!
//! - [`packager`]: chart tree plus images into a `.helmpack.tgz` bundle
//! - [`importer`]: bundle into a private registry, chart rewritten
//! - [`relocate`]: the image reference mapping and chart text rewriting
//! - [`inspect`]: read a bundle without unpacking it

pub mod error;
pub mod importer;
pub mod inspect;
pub mod packager;
pub mod relocate;

pub use error::{BundleError, Result};
pub use importer::{ImportReport, ImportTarget, Importer};
pub use inspect::BundleInfo;
pub use packager::{PackOptions, PackOutcome, Packager};
pub use relocate::{RelocationMapping, RelocationReport, relocate_chart, relocate_file};
