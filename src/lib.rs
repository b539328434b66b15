//! Application icon **extract**ion from Windows executables.
//!
//! Supports:
//! * 16-bit segmented (NE) and 32-bit or 64-bit portable (PE) executables
//! * Selection of the icon image best suited for a target display size
//! * Decoding of 1, 4, 8, 16, 24 and 32 bit icon bitmaps including their transparency mask
//! * Decoding of PNG-compressed icon images with the `images` feature
//!
//! See [`best_icon_raster`] for the main entry point, and [`Executable`] for parsing and querying
//! the resources of an executable.
//!
//! # Examples
//!
//! ### Thumbnail extraction
//! ```
//! use exeicon::{best_icon_raster, ExtractOptions};
//!
//! let mut file = std::fs::File::open(BINARY_PATH)?;
//!
//! // pick the icon best suited for a 64x64 thumbnail and decode it
//! let raster = best_icon_raster(&mut file, &ExtractOptions::with_target_size(64, 64));
//!
//! if let Some(raster) = raster {
//!     // rows from top to bottom, four bytes per pixel
//!     let rgba = raster.pixels();
//! }
//! ```
//!
//! ### Icon enumeration
//! ```
//! use exeicon::{Executable, Limits};
//!
//! let mut file = std::fs::File::open(BINARY_PATH)?;
//!
//! // detect the format and parse the resources
//! let executable = Executable::parse(&mut file, &Limits::default())?.unwrap();
//!
//! // list the images of the main icon group
//! for icon in executable.icons(&mut file, &Limits::default())? {
//!     println!("{}x{} {} bpp", icon.width, icon.height, icon.bits_per_pixel);
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg_hide))]
#![cfg_attr(docsrs, doc(cfg_hide(doc)))]

pub(crate) mod detect;
pub(crate) mod dib;
pub(crate) mod errors;
pub(crate) mod executable;
pub(crate) mod icon;
pub(crate) mod ne;
pub(crate) mod options;
pub(crate) mod pe;
pub(crate) mod raster;
pub(crate) mod resource;
pub(crate) mod util;

pub mod constants;
pub mod types;

pub use crate::{
    detect::*, dib::*, errors::*, executable::*, icon::*, ne::*, options::*, pe::*, raster::*,
    resource::*,
};
