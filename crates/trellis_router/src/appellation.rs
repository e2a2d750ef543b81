//! Component appellations - every accepted way of naming what to render
//!
//! A route can point at a component by name, by type, by a live instance, or
//! by a pending load that will produce one of those later. Loads usually
//! settle to a module: a set of named exports, where a `default` export (or a
//! lone export) is the component.
//!
//! All classification of these shapes happens in this module, so the
//! instruction component only ever deals with [`Appellation`] variants.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use indexmap::IndexMap;
use trellis_kernel::{ComponentInstance, ComponentType};

use crate::error::{Result, RouterError};

/// Name of the conventional default export
pub const DEFAULT_EXPORT: &str = "default";

/// A load that settles to something renderable
pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<Resolved>> + Send + 'static>>;

/// What a route component can be specified as
pub enum Appellation {
    /// Component name, resolved through a container later
    Name(String),
    /// Component type
    Type(ComponentType),
    /// Live component instance
    Instance(ComponentInstance),
    /// Pending load
    Pending(ComponentFuture),
}

impl Appellation {
    /// Wrap an infallible load
    pub fn pending<F>(load: F) -> Self
    where
        F: Future<Output = Resolved> + Send + 'static,
    {
        Appellation::Pending(Box::pin(async move { Ok(load.await) }))
    }

    /// Wrap a load that may fail
    pub fn pending_fallible<F>(load: F) -> Self
    where
        F: Future<Output = Result<Resolved>> + Send + 'static,
    {
        Appellation::Pending(Box::pin(load))
    }

    pub fn is_name(&self) -> bool {
        matches!(self, Appellation::Name(_))
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Appellation::Type(_))
    }

    pub fn is_instance(&self) -> bool {
        matches!(self, Appellation::Instance(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Appellation::Pending(_))
    }

    /// The name this appellation answers to, derived from its type if needed
    pub fn name(&self) -> Option<&str> {
        match self {
            Appellation::Name(name) => Some(name),
            Appellation::Type(ty) => Some(ty.name()),
            Appellation::Instance(instance) => Some(instance.component_type().name()),
            Appellation::Pending(_) => None,
        }
    }

    /// The component type, derived from the instance if needed
    pub fn component_type(&self) -> Option<&ComponentType> {
        match self {
            Appellation::Type(ty) => Some(ty),
            Appellation::Instance(instance) => Some(instance.component_type()),
            Appellation::Name(_) | Appellation::Pending(_) => None,
        }
    }

    pub fn instance(&self) -> Option<&ComponentInstance> {
        match self {
            Appellation::Instance(instance) => Some(instance),
            _ => None,
        }
    }
}

impl fmt::Debug for Appellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Appellation::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Appellation::Type(ty) => f.debug_tuple("Type").field(ty).finish(),
            Appellation::Instance(instance) => f.debug_tuple("Instance").field(instance).finish(),
            Appellation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<&str> for Appellation {
    fn from(name: &str) -> Self {
        Appellation::Name(name.to_string())
    }
}

impl From<String> for Appellation {
    fn from(name: String) -> Self {
        Appellation::Name(name)
    }
}

impl From<ComponentType> for Appellation {
    fn from(ty: ComponentType) -> Self {
        Appellation::Type(ty)
    }
}

impl From<ComponentInstance> for Appellation {
    fn from(instance: ComponentInstance) -> Self {
        Appellation::Instance(instance)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────────

/// Named exports of a lazily loaded module, in declaration order
#[derive(Debug, Default)]
pub struct Module {
    exports: IndexMap<String, Appellation>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an export
    pub fn with_export(mut self, name: impl Into<String>, value: impl Into<Appellation>) -> Self {
        self.exports.insert(name.into(), value.into());
        self
    }

    /// Module with only a default export
    pub fn with_default(value: impl Into<Appellation>) -> Self {
        Self::new().with_export(DEFAULT_EXPORT, value)
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// Pick the component export: `default` first, then a lone export
    pub fn into_component(mut self) -> Result<Appellation> {
        if let Some(default) = self.exports.shift_remove(DEFAULT_EXPORT) {
            return Ok(default);
        }
        match self.exports.len() {
            0 => Err(RouterError::NoExport),
            1 => self
                .exports
                .pop()
                .map(|(_, value)| value)
                .ok_or(RouterError::NoExport),
            count => Err(RouterError::AmbiguousExport(count)),
        }
    }
}

/// What a pending load settles to
#[derive(Debug)]
pub enum Resolved {
    /// Directly usable name, type, instance, or another pending load
    Appellation(Appellation),
    /// A module whose exports hold the component
    Module(Module),
}

impl Resolved {
    /// Reduce to a single appellation
    pub fn into_appellation(self) -> Result<Appellation> {
        match self {
            Resolved::Appellation(appellation) => Ok(appellation),
            Resolved::Module(module) => module.into_component(),
        }
    }
}

impl From<Appellation> for Resolved {
    fn from(appellation: Appellation) -> Self {
        Resolved::Appellation(appellation)
    }
}

impl From<&str> for Resolved {
    fn from(name: &str) -> Self {
        Resolved::Appellation(name.into())
    }
}

impl From<String> for Resolved {
    fn from(name: String) -> Self {
        Resolved::Appellation(name.into())
    }
}

impl From<ComponentType> for Resolved {
    fn from(ty: ComponentType) -> Self {
        Resolved::Appellation(ty.into())
    }
}

impl From<ComponentInstance> for Resolved {
    fn from(instance: ComponentInstance) -> Self {
        Resolved::Appellation(instance.into())
    }
}

impl From<Module> for Resolved {
    fn from(module: Module) -> Self {
        Resolved::Module(module)
    }
}
