//! ReelPlan - Release Planning Core
//!
//! Content calendar, template cascade and export assembly for scheduled
//! social video releases. The UI is an external collaborator: it drives the
//! core through [`core::project::Project`] and supplies layouts through
//! [`core::export::LayoutProvider`].

pub mod core;
