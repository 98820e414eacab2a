//! Kumiki core library.
//!
//! Kumiki walks a tree of declaration units, each contributing build edges
//! through a [`graph::Builder`], and compiles the accumulated graph into one
//! Ninja build file. The file regenerates itself whenever a unit or the
//! generator changes.
//!
//! The pipeline is: [`config`] → [`toolchain`] → [`rules`] →
//! [`declaration`] (filling a [`graph::BuildGraph`]) → [`ninja_gen`], driven
//! by [`runner`].

pub mod cli;
pub mod config;
pub mod declaration;
mod diagnostics;
pub mod graph;
pub mod ninja_gen;
pub mod rules;
pub mod runner;
pub mod template;
pub mod toolchain;
