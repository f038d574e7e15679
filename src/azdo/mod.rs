//! Azure DevOps REST API access.

pub mod client;
pub mod queries;

pub use client::AzdoClient;
