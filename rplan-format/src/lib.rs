//! This crate contains abstractions for dealing with the textual reconfiguration-plan format
//! and the configuration layout format.
//!
//! A plan file holds one action per line in the canonical form `kind(args...,start,end)`, for
//! example `migrate(vm3,n1,n4,0,5)`. A layout file holds one line per online node: the node
//! name, a colon, and the space-separated names of the VMs hosted on it. In both formats a
//! backslash escapes the characters which would otherwise delimit a name.
//!
//! To read plan files see [`reader::PlanReader`], to write them see [`writer::PlanWriter`];
//! layout files go through [`reader::LayoutReader`] and [`writer::LayoutWriter`].

mod actions;
pub mod reader;
pub mod writer;

pub use actions::NodeLine;
pub use actions::PlanAction;
pub use reader::ReadError;
