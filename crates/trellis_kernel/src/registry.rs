//! Hierarchical component registry
//!
//! [`ComponentRegistry`] is a small [`Container`] implementation: component
//! types are registered under their name key, each alias key, and their type
//! key. Child registries see everything registered in their ancestors, while
//! registrations made in a child stay local to it.
//!
//! # Example
//!
//! ```rust
//! use trellis_kernel::{key_from, ComponentRegistry, ComponentType, Container};
//!
//! let root = ComponentRegistry::new();
//! root.register(ComponentType::new("home", || ()));
//!
//! let child = root.create_child();
//! assert!(child.has(&key_from("home"), true));
//! assert!(!child.has(&key_from("home"), false));
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use crate::component::{ComponentInstance, ComponentType};
use crate::container::{key_from, Container, Factory, Key, Resolver};

/// Factory for a registered type
struct TypeFactory {
    component_type: ComponentType,
}

impl Factory for TypeFactory {
    fn component_type(&self) -> &ComponentType {
        &self.component_type
    }
}

/// Builds a new instance on every resolution
struct TransientResolver {
    factory: Arc<TypeFactory>,
}

impl Resolver for TransientResolver {
    fn get_factory(&self, _container: &dyn Container) -> Option<Arc<dyn Factory>> {
        let factory: Arc<dyn Factory> = self.factory.clone();
        Some(factory)
    }

    fn resolve(&self, _container: &dyn Container) -> Option<ComponentInstance> {
        Some(self.factory.construct())
    }
}

/// Always hands out the same instance
struct InstanceResolver {
    instance: ComponentInstance,
}

impl Resolver for InstanceResolver {
    fn get_factory(&self, _container: &dyn Container) -> Option<Arc<dyn Factory>> {
        let factory: Arc<dyn Factory> = Arc::new(TypeFactory {
            component_type: self.instance.component_type().clone(),
        });
        Some(factory)
    }

    fn resolve(&self, _container: &dyn Container) -> Option<ComponentInstance> {
        Some(self.instance.clone())
    }
}

/// Registry of component types with parent fallback
#[derive(Default)]
pub struct ComponentRegistry {
    parent: Option<Arc<ComponentRegistry>>,
    resolvers: RwLock<FxHashMap<Key, Arc<dyn Resolver>>>,
}

impl ComponentRegistry {
    /// Create a root registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a registry that falls back to `self`
    pub fn create_child(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            parent: Some(self.clone()),
            resolvers: RwLock::default(),
        })
    }

    pub fn parent(&self) -> Option<&Arc<ComponentRegistry>> {
        self.parent.as_ref()
    }

    /// Register a transient component type under its name, aliases, and type key
    pub fn register(&self, component_type: ComponentType) {
        tracing::debug!(
            name = component_type.name(),
            aliases = ?component_type.aliases(),
            "registering component type"
        );
        let resolver: Arc<dyn Resolver> = Arc::new(TransientResolver {
            factory: Arc::new(TypeFactory {
                component_type: component_type.clone(),
            }),
        });

        let mut resolvers = self.resolvers.write().unwrap_or_else(PoisonError::into_inner);
        resolvers.insert(key_from(component_type.name()), resolver.clone());
        for alias in component_type.aliases() {
            resolvers.insert(key_from(alias), resolver.clone());
        }
        resolvers.insert(Key::of_type(&component_type), resolver);
    }

    /// Register a fixed instance under `name`
    pub fn register_instance(&self, name: &str, instance: ComponentInstance) {
        tracing::debug!(name, "registering component instance");
        self.resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key_from(name), Arc::new(InstanceResolver { instance }));
    }

    /// Register a custom resolver under an arbitrary key
    pub fn register_resolver(&self, key: Key, resolver: Arc<dyn Resolver>) {
        self.resolvers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resolver);
    }

    /// Number of keys registered directly on this registry
    pub fn len(&self) -> usize {
        self.resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn own_resolver(&self, key: &Key) -> Option<Arc<dyn Resolver>> {
        self.resolvers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl Container for ComponentRegistry {
    fn has(&self, key: &Key, search_ancestors: bool) -> bool {
        if self.own_resolver(key).is_some() {
            return true;
        }
        search_ancestors
            && self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.has(key, true))
    }

    fn get_resolver(&self, key: &Key) -> Option<Arc<dyn Resolver>> {
        self.own_resolver(key)
            .or_else(|| self.parent.as_ref()?.get_resolver(key))
    }

    fn get(&self, key: &Key) -> Option<ComponentInstance> {
        if let Some(resolver) = self.get_resolver(key) {
            return resolver.resolve(self);
        }
        match key {
            // Unregistered types can still be constructed directly
            Key::Type(component_type) => Some(component_type.create_instance()),
            Key::Resource(name) => {
                tracing::debug!(key = name.as_str(), "no registration for resource key");
                None
            }
        }
    }
}
