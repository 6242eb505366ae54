//! Container Engine Adapter — thin driver over the local Docker daemon.

pub mod client;
pub mod container;
pub mod event;
pub mod image;

pub use client::{DockerClient, DockerError};
pub use container::RunSpec;
