//! View models the dashboard renders. Everything here is a pure function of
//! a batch of readings or of the static seed catalogs.

pub mod cards;
pub mod catalog;
pub mod education;
pub mod pagination;
pub mod stats;
pub mod status;
