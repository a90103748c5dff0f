//! aurcheck - keeps a directory of AUR package clones in step with the AUR
//!
//! Every subdirectory of the AUR directory is expected to be a git clone of
//! one AUR package. aurcheck pulls them all, reads the version each PKGBUILD
//! declares and compares it with what pacman has installed, so that the user
//! learns which packages have a newer source and which were flagged for a
//! rebuild without receiving an update.
//!
//! ## Modules
//!
//! - [`config`]: YAML configuration with XDG compliance
//! - [`sync`]: bounded-parallel synchronization of the whole directory
//! - [`git`]: validation and safe pulling of a single clone
//! - [`manifest`]: PKGBUILD version extraction
//! - [`package`]: package identity and version ordering via `vercmp`
//! - [`pacman`]: installed foreign packages
//! - [`rebuild`]: `checkrebuild` integration
//! - [`reconcile`] and [`report`]: turning all of the above into a report

pub mod config;
pub mod error;
pub mod git;
pub mod manifest;
pub mod package;
pub mod pacman;
pub mod rebuild;
pub mod reconcile;
pub mod report;
pub mod sync;
pub mod tool;

pub use config::Config;
pub use error::{FleetError, PackageError, ToolError};
pub use git::{GitClient, InvalidReason, RepoSynchronizer, SyncOutcome};
pub use package::{Package, Vercmp, VersionComparator};
pub use reconcile::{reconcile, PendingUpdate, Report};
pub use sync::{FleetSummary, SyncEngine};
