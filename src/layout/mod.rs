//! Plant boundary geometry
//!
//! The buildable area of a plant is an irregular simple polygon on the ground
//! plane. This module answers the two questions dragging needs:
//! - is a candidate point inside the boundary?
//! - if not, where is the nearest legal point?
//!
//! plus the boundary-resistance easing that makes out-of-bounds drags feel
//! elastic instead of walled.

mod polygon;
mod boundary;

pub use polygon::*;
pub use boundary::*;
