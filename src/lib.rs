//! camsnap library crate.
//!
//! Pick a camera, bind its live feed to a display surface and capture
//! mirrored stills. The binary is a thin shell over these modules.

pub mod camera;
pub mod cli;
pub mod config;
pub mod permissions;
pub mod selection;
pub mod session;
