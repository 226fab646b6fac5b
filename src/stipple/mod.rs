//! Photograph stippling guided by a rendered CSG scene.
//!
//! A pass dithers the photograph, classifies every pixel against the scene
//! and per-entity renderings, stores the resulting dots in a quad-tree and
//! finally composites sprites for them tile by tile.

pub mod classifier;
pub mod config;
pub mod dither;
pub mod dot;
pub mod edges;
pub mod quadtree;
pub mod rng;
pub mod tiling;
pub mod worker;

pub use classifier::{ClassifierInputs, EntityLayer, PixelClassifier, StippleJob, StippleResult};
pub use config::{Configuration, EntityConfiguration};
pub use dither::DitheringMethod;
pub use dot::StippleDot;
pub use edges::EdgeDetectionMethod;
pub use quadtree::{Rect, SpatialIndex};
pub use rng::StippleRng;
pub use tiling::{SpriteSheet, TileGrid, TilingCompositor};
pub use worker::{DotGenerationWorker, WorkerEvent, WorkerHandle};
