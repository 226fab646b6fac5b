//! Constructive solid geometry scenes and model-guided stippling.
//!
//! The [`csg`] module keeps an editable tree of parametric primitives and
//! boolean operations whose results are evaluated on [BSP](mesh::bsp) trees
//! and kept up to date as operands move or resize. The [`stipple`] module
//! turns a photograph into a dot drawing, using renderings of that scene to
//! decide where dots go.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **image-io**: write composited stipple drawings to `.png`
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//! - **parallel**: use rayon for BSP construction and tile rendering

#![forbid(unsafe_code)]
#![warn(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod aabb;
pub mod csg;
pub mod errors;
pub mod float_types;
pub mod io;
pub mod mesh;
pub mod stipple;
pub mod traits;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use csg::CsgTree;
pub use mesh::ExactMesh;
pub use traits::CSGOps;
