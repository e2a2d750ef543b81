//! Trellis Kernel
//!
//! Component types and the container capability the router resolves through:
//!
//! - **Component types**: constructable descriptors with a display name and aliases
//! - **Component instances**: live view models tagged with their type
//! - **Container capability**: `has` / `get_resolver` / `get` over registration keys
//! - **Component registry**: a hierarchical in-memory container

pub mod component;
pub mod container;
pub mod registry;

pub use component::{ComponentInstance, ComponentType};
pub use container::{key_from, Container, Factory, Key, Resolver, CUSTOM_ELEMENT_KEY_PREFIX};
pub use registry::ComponentRegistry;
