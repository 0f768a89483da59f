//! Texture baking pipeline
//!
//! Converts source assets into compressed, target-ready textures:
//!
//! - **Dispatch**: classify each manifest entry as an atlas descriptor or a
//!   raster image
//! - **Atlas expansion**: drive the external packer and recover the composite
//!   image it produces
//! - **Encode**: size-normalize the image, run the external ETC2 encoder, and
//!   LZ4-pack the result
//! - **Change cache**: skip entries whose content digest is unchanged since
//!   the previous run
//!
//! # Example
//!
//! ```ignore
//! use texbake::pipeline::{BatchOptions, BatchPipeline};
//!
//! let pipeline = BatchPipeline::new(options);
//! let report = pipeline.run_manifest(Path::new("assets.txt"))?;
//! println!("{}", report.summary());
//! ```

pub mod atlas;
pub mod batch;
pub mod cache;
pub mod compress;
pub mod encoder;
pub mod job;
pub mod normalize;
pub mod result;

pub use atlas::*;
pub use batch::*;
pub use cache::*;
pub use compress::*;
pub use encoder::*;
pub use job::*;
pub use normalize::*;
pub use result::*;
