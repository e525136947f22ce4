//! Procedural scalar fields from a branching network of descent segments.
//!
//! The engine scatters one jittered point per integer grid cell, links each
//! point to its locally lowest neighbor under an externally supplied
//! elevation function, smooths the resulting segments with Catmull-Rom
//! subdivision, refines them once at half resolution, and evaluates the
//! field as the distance to the nearest segment plus the elevation along it.
//! The output renders as terrain heightmaps or Lichtenberg (branching
//! discharge) figures depending on the control function.
//!
//! # Example
//!
//! ```
//! use dendrite_field::{BranchingField, FieldConfig, PerlinControl};
//!
//! let control = PerlinControl::new(0);
//! let field = BranchingField::new(control, FieldConfig::default());
//!
//! let value = field.evaluate(1.5, 2.5);
//! assert!(value.is_finite());
//! ```
//!
//! Evaluation is a pure function of the query point: the point cache is
//! built once at construction and never mutated, so a `BranchingField` can
//! be shared across threads and sampled for every pixel independently.

mod control;
mod engine;
mod grid;

pub use control::{ControlFunction, LichtenbergControl, PerlinControl, PlaneControl};
pub use engine::{BranchingField, FieldConfig};
pub use grid::PointGrid;
