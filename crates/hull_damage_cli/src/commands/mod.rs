//! Subcommand implementations.
pub(crate) mod render;
pub(crate) mod sets;
