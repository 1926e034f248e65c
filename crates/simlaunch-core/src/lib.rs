//! Core library for simlaunch: a declarative launch orchestrator.
//!
//! A launch description declares arguments, then lists the units to start.
//! Values flowing into units are [`substitution::Substitution`] trees that
//! stay unresolved until launch time.
//!
//! - [`catalog`]: argument declarations, choice discovery, and override binding.
//! - [`substitution`]: the substitution graph and its resolver.
//! - [`unit`]: node and include descriptors.
//! - [`plan`]: launch description files and plan assembly.
//! - [`launch`]: resolves a plan unit by unit and starts the processes.
//! - [`package`]: install prefix lookup for package data and executables.

pub mod catalog;
pub mod launch;
pub mod package;
pub mod plan;
pub mod substitution;
pub mod unit;
