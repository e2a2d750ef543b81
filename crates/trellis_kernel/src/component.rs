//! Component types and live component instances
//!
//! A [`ComponentType`] plays the role of a component class: it has a display
//! name, optional aliases, and knows how to construct its view model. A
//! [`ComponentInstance`] is a constructed view model tagged with the type
//! that produced it, so the type is always derivable from an instance.
//!
//! Both are shared handles and compare by identity.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

type Constructor = Arc<dyn Fn() -> Arc<dyn Any + Send + Sync> + Send + Sync>;

struct TypeInner {
    name: String,
    aliases: Vec<String>,
    construct: Constructor,
}

/// A constructable component type
#[derive(Clone)]
pub struct ComponentType {
    inner: Arc<TypeInner>,
}

impl ComponentType {
    /// Define a component type whose view model is built by `construct`
    pub fn new<T, F>(name: impl Into<String>, construct: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(TypeInner {
                name: name.into(),
                aliases: Vec::new(),
                construct: Arc::new(move || Arc::new(construct()) as Arc<dyn Any + Send + Sync>),
            }),
        }
    }

    /// Return a new type with the same constructor and the given aliases
    ///
    /// The result is a distinct type: it does not compare equal to `self`.
    pub fn with_aliases<I, S>(self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(TypeInner {
                name: self.inner.name.clone(),
                aliases: aliases.into_iter().map(Into::into).collect(),
                construct: self.inner.construct.clone(),
            }),
        }
    }

    /// Display name used for routing and registration
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.inner.aliases
    }

    /// Whether `name` is this type's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.inner.name == name || self.inner.aliases.iter().any(|alias| alias == name)
    }

    /// Construct a fresh instance of this type
    pub fn create_instance(&self) -> ComponentInstance {
        ComponentInstance {
            component_type: self.clone(),
            view_model: (self.inner.construct)(),
        }
    }

    pub fn ptr_eq(&self, other: &ComponentType) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("name", &self.inner.name)
            .field("aliases", &self.inner.aliases)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ComponentInstance
// ─────────────────────────────────────────────────────────────────────────────

/// A live view model together with the type that built it
#[derive(Clone)]
pub struct ComponentInstance {
    component_type: ComponentType,
    view_model: Arc<dyn Any + Send + Sync>,
}

impl ComponentInstance {
    /// Wrap an existing view model as an instance of `component_type`
    pub fn new<T: Any + Send + Sync>(component_type: ComponentType, view_model: T) -> Self {
        Self {
            component_type,
            view_model: Arc::new(view_model),
        }
    }

    /// The runtime type of this instance
    pub fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    pub fn is_instance_of(&self, component_type: &ComponentType) -> bool {
        self.component_type.ptr_eq(component_type)
    }

    /// Borrow the view model as a concrete type
    pub fn view_model<T: Any>(&self) -> Option<&T> {
        self.view_model.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &ComponentInstance) -> bool {
        Arc::ptr_eq(&self.view_model, &other.view_model)
    }
}

impl PartialEq for ComponentInstance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("type", &self.component_type.name())
            .finish()
    }
}
