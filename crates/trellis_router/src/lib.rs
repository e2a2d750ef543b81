//! Trellis Router
//!
//! Resolution of the component part of a routing instruction:
//!
//! - **Appellations**: a name, a type, a live instance, or a pending load
//! - **Modules**: lazily loaded export sets with a `default` export convention
//! - **Instruction components**: one canonical holder per route with late,
//!   container-backed resolution to a type or instance
//!
//! # Example
//!
//! ```rust
//! use trellis_router::{
//!     Appellation, ComponentRegistry, ComponentType, Container, InstructionComponent,
//! };
//!
//! let registry = ComponentRegistry::new();
//! let home = ComponentType::new("home", || ());
//! registry.register(home.clone());
//!
//! let component = InstructionComponent::create(Appellation::from("home"));
//! let container: &dyn Container = &*registry;
//!
//! let ty = component.to_type(Some(container))?.expect("registered");
//! assert!(ty.ptr_eq(&home));
//!
//! let instance = component.to_instance(Some(container))?.expect("constructed");
//! assert!(instance.is_instance_of(&home));
//! # Ok::<(), trellis_router::RouterError>(())
//! ```

pub mod appellation;
pub mod config;
pub mod error;
pub mod instruction_component;

pub use appellation::{Appellation, ComponentFuture, Module, Resolved, DEFAULT_EXPORT};
pub use config::{NameRetention, RouterConfig};
pub use error::{Result, RouterError};
pub use instruction_component::{
    Applied, ComponentState, InstructionComponent, PendingResolution, SettledResolution,
};

// Re-export the kernel types routes are built from
pub use trellis_kernel::{
    key_from, ComponentInstance, ComponentRegistry, ComponentType, Container, Factory, Key,
    Resolver,
};
