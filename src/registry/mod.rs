//! Package-manager collaborator

mod npm;

pub use npm::Npm;
