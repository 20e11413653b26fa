//! # arkscan
//!
//! Best-effort scraper for ARK: Survival Ascended save files.
//!
//! This library provides functionality to:
//! - Pull character names, levels, stats, map/server and inventory out of
//!   cluster upload blobs
//! - Read player, character and stat-point data from `.arkprofile` files
//! - Resolve tribe ids to names from `.arktribe` files, with a TTL cache
//! - Guess which platform (PS5, Xbox, Epic, Steam) a player is on
//!
//! The save format is not fully known. Fields are located by property tag
//! and pattern, so a damaged or unexpected file yields fewer fields rather
//! than an error. Files are only ever read.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tribes = arkscan::TribeCache::new(vec![PathBuf::from("/srv/ark/TheIsland_WP")]);
//! let extractor = arkscan::ClusterExtractor::default();
//!
//! let scan = extractor.scan_dir(Path::new("/srv/ark/cluster"), Some(&tribes))?;
//! for upload in &scan.files {
//!     for character in &upload.characters {
//!         println!("{} ({}) lvl {}", character.name, upload.platform, character.level);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod character;
pub mod cluster;
mod error;
pub mod files;
pub mod items;
pub mod platform;
pub mod profile;
pub mod scanner;
pub mod servers;
pub mod tribe;
pub mod window;

#[doc(inline)]
pub use cache::{Clock, SystemClock, TribeCache, TribeLookup, TribeMap};
#[doc(inline)]
pub use character::{CharacterExtractor, CharacterRecord, ItemScope, Meter, Percent, Reading};
#[doc(inline)]
pub use cluster::{ClusterExtractor, ClusterScan, ClusterUpload};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use platform::{KnownPlatforms, Platform};
#[doc(inline)]
pub use profile::{PlayerSummary, ProfileExtractor, ProfileRecord, ServerPlayers, StatSlot};
#[doc(inline)]
pub use servers::{ServerDirs, ServerStatus};
#[doc(inline)]
pub use tribe::{parse_tribe, read_tribe_file, TribeFields, TribeRecord};
#[doc(inline)]
pub use window::AnchorWindow;
