//! Scopes and property resolution
//!
//! A [`Scope`] pairs a binding context with its override context and links to
//! the scope it was created under. Each component view or repeated item gets
//! one, so the chain mirrors the nesting of views.
//!
//! [`resolve_property`] answers "which object should this expression read
//! `name` from (or write it to)?":
//!
//! ```text
//!   scope ──parent──▶ scope ──parent──▶ root scope
//!     │                 │                  │
//!   override ─▶ bc    override ─▶ bc     override ─▶ bc
//! ```
//!
//! At each level the override context is checked before its binding context.
//! With `ancestor > 0` the walk jumps straight to that level (`$parent`,
//! `$parent.$parent`, ...) and looks nowhere else.

use std::fmt;
use std::sync::Arc;

use crate::binding_context::BindingContext;
use crate::error::{Result, ScopeError};
use crate::flags::LifecycleFlags;
use crate::override_context::OverrideContext;

struct ScopeInner {
    parent_scope: Option<Scope>,
    binding_context: BindingContext,
    override_context: OverrideContext,
}

/// One level of the data-resolution chain
///
/// Cloning shares the scope. A scope keeps its ancestors alive; ancestors
/// never refer to their children.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    /// Create a root scope backed by `bc` and a new standalone override context
    ///
    /// Use this for the root component, in tests, or to stop binding
    /// expressions from traversing further up.
    pub fn create(flags: LifecycleFlags, bc: BindingContext) -> Self {
        let oc = OverrideContext::create(flags, bc.clone());
        Self::new(None, bc, oc)
    }

    /// Create a root scope backed by `bc` and a caller-supplied override context
    ///
    /// The override context may already carry injected names such as `$host`.
    pub fn create_with_override(
        flags: LifecycleFlags,
        bc: BindingContext,
        oc: Option<OverrideContext>,
    ) -> Self {
        match oc {
            Some(oc) => Self::new(None, bc, oc),
            None => Self::create(flags, bc),
        }
    }

    /// Create a root scope from an existing override context
    pub fn from_override(_flags: LifecycleFlags, oc: Option<OverrideContext>) -> Result<Self> {
        let oc = oc.ok_or_else(|| {
            ScopeError::InvalidArgument("OverrideContext is missing".to_string())
        })?;
        let bc = oc.binding_context().clone();
        Ok(Self::new(None, bc, oc))
    }

    /// Create a child scope under `parent`
    pub fn from_parent(
        flags: LifecycleFlags,
        parent: Option<&Scope>,
        bc: BindingContext,
    ) -> Result<Self> {
        let parent = parent.ok_or_else(|| {
            ScopeError::InvalidArgument("ParentScope is missing".to_string())
        })?;
        let oc = OverrideContext::create(flags, bc.clone());
        Ok(Self::new(Some(parent.clone()), bc, oc))
    }

    fn new(
        parent_scope: Option<Scope>,
        binding_context: BindingContext,
        override_context: OverrideContext,
    ) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                parent_scope,
                binding_context,
                override_context,
            }),
        }
    }

    /// The enclosing scope, or `None` for a root
    ///
    /// This is a strong link: holding a child scope keeps its whole ancestor
    /// chain alive.
    pub fn parent_scope(&self) -> Option<&Scope> {
        self.inner.parent_scope.as_ref()
    }

    pub fn binding_context(&self) -> &BindingContext {
        &self.inner.binding_context
    }

    pub fn override_context(&self) -> &OverrideContext {
        &self.inner.override_context
    }

    /// Number of ancestors above this scope
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent_scope();
        while let Some(scope) = current {
            depth += 1;
            current = scope.parent_scope();
        }
        depth
    }

    /// Whether both handles refer to the same scope
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("depth", &self.depth())
            .field("override_context", &self.inner.override_context)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Property resolution
// ─────────────────────────────────────────────────────────────────────────────

/// The object a property lookup settled on
#[derive(Clone, Debug)]
pub enum ContextTarget {
    /// The name was injected on an override context
    Override(OverrideContext),
    /// The name lives on (or should be created on) a binding context
    Binding(BindingContext),
    /// The search ran out while traversing a parent scope
    Boundary,
    /// An explicit ancestor jump went past the root
    NotFound,
}

impl ContextTarget {
    pub fn is_boundary(&self) -> bool {
        matches!(self, ContextTarget::Boundary)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContextTarget::NotFound)
    }

    pub fn as_binding(&self) -> Option<&BindingContext> {
        match self {
            ContextTarget::Binding(bc) => Some(bc),
            _ => None,
        }
    }

    pub fn as_override(&self) -> Option<&OverrideContext> {
        match self {
            ContextTarget::Override(oc) => Some(oc),
            _ => None,
        }
    }
}

/// Find the context that owns `name`
///
/// `ancestor == 0` searches upward from `scope` and falls back to
/// `host_scope` (for projected slot content) when the chain has no owner.
/// `ancestor > 0` looks only at that exact ancestor level.
///
/// When nothing owns the name the result is [`ContextTarget::Boundary`] if
/// `IS_TRAVERSING_PARENT_SCOPE` is set, otherwise the scope's binding context
/// as the target for creating the property.
pub fn resolve_property(
    scope: Option<&Scope>,
    name: &str,
    ancestor: usize,
    flags: LifecycleFlags,
    host_scope: Option<&Scope>,
) -> Result<ContextTarget> {
    let Some(origin) = scope.or(host_scope) else {
        return Err(ScopeError::InvalidArgument(
            "Scope and HostScope are both missing".to_string(),
        ));
    };

    if let Some(scope) = scope {
        if let Some(found) = choose_context(scope, name, ancestor) {
            return Ok(found);
        }
    }

    if let Some(host) = host_scope {
        let distinct = scope.map_or(true, |scope| !scope.ptr_eq(host));
        if distinct {
            if let Some(found) = choose_context(host, name, ancestor) {
                return Ok(found);
            }
        }
    }

    if flags.contains(LifecycleFlags::IS_TRAVERSING_PARENT_SCOPE) {
        return Ok(ContextTarget::Boundary);
    }
    tracing::trace!(name, "no owner found, defaulting to binding context");
    Ok(ContextTarget::Binding(origin.binding_context().clone()))
}

/// `None` means no level owns `name`; `Some(NotFound)` means the ancestor
/// jump ran off the chain.
fn choose_context(scope: &Scope, name: &str, ancestor: usize) -> Option<ContextTarget> {
    if ancestor > 0 {
        let mut current = scope;
        for _ in 0..ancestor {
            match current.parent_scope() {
                Some(parent) => current = parent,
                None => return Some(ContextTarget::NotFound),
            }
        }
        return Some(owner_at(current, name));
    }

    let mut current = Some(scope);
    while let Some(level) = current {
        let oc = level.override_context();
        if oc.has_own(name) || oc.binding_context().has_own(name) {
            return Some(owner_at(level, name));
        }
        current = level.parent_scope();
    }
    None
}

fn owner_at(scope: &Scope, name: &str) -> ContextTarget {
    let oc = scope.override_context();
    if oc.has_own(name) {
        ContextTarget::Override(oc.clone())
    } else {
        ContextTarget::Binding(oc.binding_context().clone())
    }
}
