//! Instruction components - the "what to render" part of a routing instruction
//!
//! An [`InstructionComponent`] accepts any [`Appellation`] and keeps it in a
//! canonical form with separate `name`, `type`, `instance`, and pending-load
//! slots. Resolution is deliberately late: a name is only turned into a type
//! or instance when a container is at hand, which allows components to be
//! registered locally to where they are rendered.
//!
//! # States
//!
//! ```text
//!             set(None)
//!   ┌──────────────────────────────┐
//!   ▼                              │
//! Empty ──set(name)──▶ Named ──set(type)──▶ Typed ──set(instance)──▶ Instanced
//!   │                                                                  ▲
//!   └──set(pending)──▶ Pending ──resolve()──▶ (Named | Typed | Instanced)
//! ```
//!
//! Classification follows a strict priority: instance > type > name.
//!
//! # Stale loads
//!
//! Every `set` bumps a generation counter. A load taken with
//! [`InstructionComponent::take_pending`] remembers the generation it came
//! from, and [`InstructionComponent::apply_resolution`] drops its result if
//! the component has been `set` since, or if the load was taken from a
//! different component.
//!
//! A taken load that is dropped before it settles (a cancelled `resolve`, a
//! lost `select!` branch) goes back to its component, and the next
//! `take_pending` or `resolve` picks it up where it stopped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use trellis_kernel::{key_from, ComponentInstance, ComponentType, Container, Key};

use crate::appellation::{Appellation, ComponentFuture, Resolved};
use crate::config::{NameRetention, RouterConfig};
use crate::error::{Result, RouterError};

/// Which representation an instruction component currently holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentState {
    Empty,
    Named,
    Typed,
    Instanced,
    Pending,
}

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Where an unsettled load goes when its [`PendingResolution`] is dropped
type ReturnSlot = Arc<Mutex<Option<ComponentFuture>>>;

enum PendingSlot {
    /// Load not started yet
    Held(ComponentFuture),
    /// Taken by a [`PendingResolution`]; refilled if the ticket is dropped
    InFlight(ReturnSlot),
    /// The load settled to an error; resolving again reports it again
    Failed(RouterError),
}

/// A pending load detached from its component
///
/// Await [`PendingResolution::settle`] and hand the result back with
/// [`InstructionComponent::apply_resolution`].
///
/// Dropping it before the load settles hands the load back to the component.
pub struct PendingResolution {
    component: u64,
    generation: u64,
    load: Option<ComponentFuture>,
    returned: ReturnSlot,
}

impl PendingResolution {
    /// Generation of the component when the load was taken
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the load to settle
    pub async fn settle(mut self) -> SettledResolution {
        let outcome = match self.load.as_mut() {
            Some(load) => load.await,
            None => Err(RouterError::Load("load already settled".to_string())),
        };
        // Settled loads must not be handed back
        self.load = None;
        SettledResolution {
            component: self.component,
            generation: self.generation,
            outcome,
        }
    }
}

impl Drop for PendingResolution {
    fn drop(&mut self) {
        if let Some(load) = self.load.take() {
            tracing::debug!(
                generation = self.generation,
                "unsettled component load returned to its component"
            );
            *self.returned.lock().unwrap_or_else(PoisonError::into_inner) = Some(load);
        }
    }
}

impl fmt::Debug for PendingResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResolution")
            .field("component", &self.component)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// The outcome of a settled load, tagged with its component and generation
#[derive(Debug)]
pub struct SettledResolution {
    component: u64,
    generation: u64,
    outcome: Result<Resolved>,
}

impl SettledResolution {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of applying a settled load
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The component moved to this state
    Settled(ComponentState),
    /// The component was `set` after the load was taken, or the load came
    /// from another component; nothing changed
    Superseded,
}

/// Canonical holder for a route's component
pub struct InstructionComponent {
    id: u64,
    name: Option<String>,
    component_type: Option<ComponentType>,
    instance: Option<ComponentInstance>,
    promise: Option<PendingSlot>,
    generation: u64,
    config: RouterConfig,
}

impl InstructionComponent {
    /// Create an instruction component from an appellation (or nothing)
    pub fn create(appellation: impl Into<Option<Appellation>>) -> Self {
        Self::create_with_config(appellation, &RouterConfig::default())
    }

    /// Create an instruction component with explicit router configuration
    pub fn create_with_config(
        appellation: impl Into<Option<Appellation>>,
        config: &RouterConfig,
    ) -> Self {
        let mut component = Self {
            id: NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed),
            name: None,
            component_type: None,
            instance: None,
            promise: None,
            generation: 0,
            config: config.clone(),
        };
        component.set(appellation);
        component
    }

    /// Replace the component, moving to the matching state
    pub fn set(&mut self, appellation: impl Into<Option<Appellation>>) {
        self.generation += 1;
        match appellation.into() {
            None => {
                self.name = None;
                self.component_type = None;
                self.instance = None;
                self.promise = None;
            }
            Some(Appellation::Pending(load)) => {
                self.name = None;
                self.component_type = None;
                self.instance = None;
                self.promise = Some(PendingSlot::Held(load));
            }
            Some(Appellation::Name(name)) => {
                self.name = Some(name);
                self.component_type = None;
                self.instance = None;
                self.promise = None;
            }
            Some(Appellation::Type(ty)) => {
                self.name = Some(self.new_name(&ty));
                self.component_type = Some(ty);
                self.instance = None;
                self.promise = None;
            }
            Some(Appellation::Instance(instance)) => {
                let ty = instance.component_type().clone();
                self.name = Some(self.new_name(&ty));
                self.component_type = Some(ty);
                self.instance = Some(instance);
                self.promise = None;
            }
        }
        tracing::debug!(
            state = ?self.state(),
            name = self.name.as_deref(),
            generation = self.generation,
            "instruction component set"
        );
    }

    /// Await a pending load and settle into a concrete state
    ///
    /// Does nothing unless the component is pending. Export-shape errors and
    /// load failures are returned to the caller, and so is
    /// [`RouterError::LoadInFlight`] when another caller holds the load.
    pub async fn resolve(&mut self) -> Result<()> {
        if let Some(PendingSlot::Failed(err)) = &self.promise {
            return Err(err.clone());
        }
        let Some(pending) = self.take_pending() else {
            if self.is_promise() {
                return Err(RouterError::LoadInFlight);
            }
            return Ok(());
        };
        let settled = pending.settle().await;
        self.apply_resolution(settled).map(|_| ())
    }

    /// Detach the held load so it can be awaited without borrowing `self`
    ///
    /// Returns `None` unless a load is held, or was taken and handed back
    /// unsettled.
    pub fn take_pending(&mut self) -> Option<PendingResolution> {
        match self.promise.take() {
            Some(PendingSlot::Held(load)) => Some(self.issue(load)),
            Some(PendingSlot::InFlight(returned)) => {
                let load = returned.lock().unwrap_or_else(PoisonError::into_inner).take();
                match load {
                    Some(load) => Some(self.issue(load)),
                    None => {
                        self.promise = Some(PendingSlot::InFlight(returned));
                        None
                    }
                }
            }
            other => {
                self.promise = other;
                None
            }
        }
    }

    fn issue(&mut self, load: ComponentFuture) -> PendingResolution {
        let returned = ReturnSlot::default();
        self.promise = Some(PendingSlot::InFlight(returned.clone()));
        PendingResolution {
            component: self.id,
            generation: self.generation,
            load: Some(load),
            returned,
        }
    }

    /// Apply a settled load taken from this component
    pub fn apply_resolution(&mut self, settled: SettledResolution) -> Result<Applied> {
        if settled.component != self.id {
            tracing::debug!(
                load_component = settled.component,
                component = self.id,
                "discarding component load taken from another component"
            );
            return Ok(Applied::Superseded);
        }
        if settled.generation != self.generation {
            tracing::debug!(
                load_generation = settled.generation,
                generation = self.generation,
                "discarding superseded component load"
            );
            return Ok(Applied::Superseded);
        }

        match settled.outcome.and_then(Resolved::into_appellation) {
            Ok(appellation) => {
                self.set(appellation);
                Ok(Applied::Settled(self.state()))
            }
            Err(err) => {
                tracing::debug!(error = %err, "component load failed");
                self.promise = Some(PendingSlot::Failed(err.clone()));
                Err(err)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Classification
    // ─────────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> ComponentState {
        if self.is_promise() {
            ComponentState::Pending
        } else if self.is_instance() {
            ComponentState::Instanced
        } else if self.is_type() {
            ComponentState::Typed
        } else if self.is_name() {
            ComponentState::Named
        } else {
            ComponentState::Empty
        }
    }

    /// Neither a name, a type, nor an instance
    pub fn none(&self) -> bool {
        !self.is_name() && !self.is_type() && !self.is_instance()
    }

    pub fn is_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
            && !self.is_type()
            && !self.is_instance()
    }

    pub fn is_type(&self) -> bool {
        self.component_type.is_some() && !self.is_instance()
    }

    pub fn is_instance(&self) -> bool {
        self.instance.is_some()
    }

    pub fn is_promise(&self) -> bool {
        self.promise.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn component_type(&self) -> Option<&ComponentType> {
        self.component_type.as_ref()
    }

    pub fn instance(&self) -> Option<&ComponentInstance> {
        self.instance.as_ref()
    }

    /// Incremented on every `set`
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Container-backed resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Find the component type, consulting the container for names
    ///
    /// An unregistered name yields `Ok(None)`.
    pub fn to_type(&self, container: Option<&dyn Container>) -> Result<Option<ComponentType>> {
        if let Some(ty) = &self.component_type {
            return Ok(Some(ty.clone()));
        }
        let Some(name) = &self.name else {
            return Ok(None);
        };
        let container = container.ok_or_else(|| RouterError::NoContainer(name.clone()))?;

        let key = key_from(name);
        if container.has(&key, true) {
            if let Some(factory) = container
                .get_resolver(&key)
                .and_then(|resolver| resolver.get_factory(container))
            {
                return Ok(Some(factory.component_type().clone()));
            }
        }
        tracing::debug!(name = name.as_str(), "component name is not registered");
        Ok(None)
    }

    /// Find or create the component instance through the container
    ///
    /// A container returning an instance of another type than the known one
    /// is logged and the instance is returned anyway.
    pub fn to_instance(
        &self,
        container: Option<&dyn Container>,
    ) -> Result<Option<ComponentInstance>> {
        if let Some(instance) = &self.instance {
            return Ok(Some(instance.clone()));
        }

        let (key, description) = match (&self.component_type, &self.name) {
            (Some(ty), _) => (Key::of_type(ty), ty.name().to_string()),
            (None, Some(name)) => (key_from(name), name.clone()),
            (None, None) => return Ok(None),
        };
        let container = container.ok_or(RouterError::NoContainer(description))?;

        let instance = container.get(&key);
        if let (Some(expected), Some(produced)) = (&self.component_type, &instance) {
            if !produced.is_instance_of(expected) && self.config.warn_on_type_mismatch {
                tracing::warn!(
                    expected = expected.name(),
                    produced = produced.component_type().name(),
                    "Failed to instantiate"
                );
            }
        }
        Ok(instance)
    }

    /// Whether both point at the same logical component
    ///
    /// Compares names, or type identity when `compare_type` is set.
    pub fn same(&self, other: &InstructionComponent, compare_type: bool) -> bool {
        if compare_type {
            self.component_type == other.component_type
        } else {
            self.name == other.name
        }
    }

    /// Name to use when becoming typed; see [`NameRetention`]
    fn new_name(&self, ty: &ComponentType) -> String {
        match (&self.name, self.config.name_retention) {
            (Some(prior), NameRetention::KeepPrior) => prior.clone(),
            (Some(prior), NameRetention::MatchAliases) if ty.answers_to(prior) => prior.clone(),
            _ => ty.name().to_string(),
        }
    }
}

impl Default for InstructionComponent {
    fn default() -> Self {
        Self::create(None)
    }
}

impl From<Appellation> for InstructionComponent {
    fn from(appellation: Appellation) -> Self {
        Self::create(appellation)
    }
}

impl fmt::Debug for InstructionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionComponent")
            .field("state", &self.state())
            .field("name", &self.name)
            .field("type", &self.component_type)
            .field("instance", &self.instance)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appellation::Module;
    use pollster::block_on;

    fn some_type() -> ComponentType {
        ComponentType::new("some-type", || ())
    }

    #[test]
    fn test_create_from_name() {
        let component = InstructionComponent::create(Appellation::from("foo"));

        assert_eq!(component.state(), ComponentState::Named);
        assert_eq!(component.name(), Some("foo"));
        assert!(component.component_type().is_none());
        assert!(component.instance().is_none());
        assert!(component.is_name());
        assert!(!component.none());
    }

    #[test]
    fn test_create_from_type() {
        let ty = some_type();
        let component = InstructionComponent::create(Appellation::from(ty.clone()));

        assert_eq!(component.state(), ComponentState::Typed);
        assert_eq!(component.name(), Some("some-type"));
        assert!(component.component_type().is_some_and(|t| t.ptr_eq(&ty)));
        assert!(component.is_type());
        assert!(!component.is_name());
    }

    #[test]
    fn test_create_from_instance() {
        let ty = some_type();
        let instance = ty.create_instance();
        let component = InstructionComponent::create(Appellation::from(instance.clone()));

        assert_eq!(component.state(), ComponentState::Instanced);
        assert_eq!(component.name(), Some("some-type"));
        assert!(component.component_type().is_some_and(|t| t.ptr_eq(&ty)));
        assert_eq!(component.instance(), Some(&instance));
        assert!(component.is_instance());
        assert!(!component.is_type());
        assert!(!component.is_name());
    }

    #[test]
    fn test_empty_and_clear() {
        let mut component = InstructionComponent::create(None);
        assert_eq!(component.state(), ComponentState::Empty);
        assert!(component.none());

        component.set(Appellation::from("foo"));
        component.set(None);
        assert_eq!(component.state(), ComponentState::Empty);
        assert!(component.name().is_none());

        // An empty name does not classify as a name
        component.set(Appellation::from(""));
        assert!(component.none());
    }

    #[test]
    fn test_pending_clears_settled_fields() {
        let mut component = InstructionComponent::create(Appellation::from(some_type()));
        component.set(Appellation::pending(async { Resolved::from("later") }));

        assert_eq!(component.state(), ComponentState::Pending);
        assert!(component.is_promise());
        assert!(component.name().is_none());
        assert!(component.component_type().is_none());
        assert!(component.none());
    }

    #[test]
    fn test_name_retention_keeps_prior_alias() {
        let mut component = InstructionComponent::create(Appellation::from("alias"));
        component.set(Appellation::from(some_type()));

        assert_eq!(component.state(), ComponentState::Typed);
        assert_eq!(component.name(), Some("alias"));
    }

    #[test]
    fn test_name_retention_modes() {
        let ty = ComponentType::new("editor", || ()).with_aliases(["compose"]);

        let replace = RouterConfig {
            name_retention: NameRetention::Replace,
            ..RouterConfig::default()
        };
        let mut component = InstructionComponent::create_with_config(Appellation::from("alias"), &replace);
        component.set(Appellation::from(ty.clone()));
        assert_eq!(component.name(), Some("editor"));

        let match_aliases = RouterConfig {
            name_retention: NameRetention::MatchAliases,
            ..RouterConfig::default()
        };
        let mut component =
            InstructionComponent::create_with_config(Appellation::from("compose"), &match_aliases);
        component.set(Appellation::from(ty.clone()));
        assert_eq!(component.name(), Some("compose"));

        let mut component =
            InstructionComponent::create_with_config(Appellation::from("unrelated"), &match_aliases);
        component.set(Appellation::from(ty));
        assert_eq!(component.name(), Some("editor"));
    }

    #[test]
    fn test_resolve_is_noop_when_not_pending() {
        let mut component = InstructionComponent::create(Appellation::from("foo"));
        let generation = component.generation();

        block_on(component.resolve()).unwrap();
        assert_eq!(component.name(), Some("foo"));
        assert_eq!(component.generation(), generation);
    }

    #[test]
    fn test_resolve_direct_appellation() {
        let ty = some_type();
        let settled = ty.clone();
        let mut component =
            InstructionComponent::create(Appellation::pending(async move { Resolved::from(settled) }));

        block_on(component.resolve()).unwrap();
        assert_eq!(component.state(), ComponentState::Typed);
        assert!(component.component_type().is_some_and(|t| t.ptr_eq(&ty)));
        assert!(!component.is_promise());
    }

    #[test]
    fn test_resolve_module_shapes() {
        let mut component = InstructionComponent::create(Appellation::pending(async {
            Resolved::from(Module::with_default("bar"))
        }));
        block_on(component.resolve()).unwrap();
        assert_eq!(component.state(), ComponentState::Named);
        assert_eq!(component.name(), Some("bar"));

        let type_x = some_type();
        let export = type_x.clone();
        let mut component = InstructionComponent::create(Appellation::pending(async move {
            Resolved::from(Module::new().with_export("Foo", export))
        }));
        block_on(component.resolve()).unwrap();
        assert!(component.component_type().is_some_and(|t| t.ptr_eq(&type_x)));
    }

    #[test]
    fn test_resolve_rejects_unresolvable_exports() {
        let mut component =
            InstructionComponent::create(Appellation::pending(async { Resolved::from(Module::new()) }));
        assert_eq!(block_on(component.resolve()), Err(RouterError::NoExport));
        assert_eq!(component.state(), ComponentState::Pending);
        // Resolving again reports the same failure
        assert_eq!(block_on(component.resolve()), Err(RouterError::NoExport));

        let mut component = InstructionComponent::create(Appellation::pending(async {
            Resolved::from(Module::new().with_export("A", "x").with_export("B", "y"))
        }));
        assert_eq!(
            block_on(component.resolve()),
            Err(RouterError::AmbiguousExport(2))
        );
    }

    #[test]
    fn test_resolve_propagates_load_failure() {
        let mut component = InstructionComponent::create(Appellation::pending_fallible(async {
            Err(RouterError::Load("chunk missing".to_string()))
        }));
        let err = block_on(component.resolve()).unwrap_err();
        assert_eq!(err, RouterError::Load("chunk missing".to_string()));
    }

    #[test]
    fn test_stale_resolution_does_not_clobber_newer_set() {
        let mut component =
            InstructionComponent::create(Appellation::pending(async { Resolved::from("stale") }));
        let pending = component.take_pending().expect("pending load");

        // A newer set lands while the load is in flight
        component.set(Appellation::from("fresh"));

        let settled = block_on(pending.settle());
        assert_eq!(component.apply_resolution(settled), Ok(Applied::Superseded));
        assert_eq!(component.name(), Some("fresh"));
        assert_eq!(component.state(), ComponentState::Named);
    }

    #[test]
    fn test_take_pending_only_once() {
        let mut component =
            InstructionComponent::create(Appellation::pending(async { Resolved::from("a") }));
        let pending = component.take_pending();
        assert!(pending.is_some());
        assert!(component.take_pending().is_none());
        assert!(component.is_promise());

        // resolve() while another caller holds the load reports it
        assert_eq!(block_on(component.resolve()), Err(RouterError::LoadInFlight));
        assert!(component.is_promise());

        let settled = block_on(pending.unwrap().settle());
        assert_eq!(
            component.apply_resolution(settled),
            Ok(Applied::Settled(ComponentState::Named))
        );
    }

    #[test]
    fn test_dropped_ticket_returns_load() {
        let mut component =
            InstructionComponent::create(Appellation::pending(async { Resolved::from("home") }));
        let generation = component.generation();
        drop(component.take_pending().expect("pending load"));

        assert!(component.is_promise());
        block_on(component.resolve()).unwrap();
        assert_eq!(component.state(), ComponentState::Named);
        assert_eq!(component.name(), Some("home"));
        assert_eq!(component.generation(), generation + 1);
    }

    #[test]
    fn test_returned_load_after_set_is_ignored() {
        let mut component =
            InstructionComponent::create(Appellation::pending(async { Resolved::from("old") }));
        let pending = component.take_pending().expect("pending load");
        component.set(Appellation::pending(async { Resolved::from("new") }));
        drop(pending);

        block_on(component.resolve()).unwrap();
        assert_eq!(component.name(), Some("new"));
    }

    #[test]
    fn test_resolution_from_other_component_is_discarded() {
        let mut a =
            InstructionComponent::create(Appellation::pending(async { Resolved::from("from-a") }));
        let mut b =
            InstructionComponent::create(Appellation::pending(async { Resolved::from("from-b") }));
        assert_eq!(a.generation(), b.generation());

        let settled = block_on(a.take_pending().expect("pending load").settle());
        assert_eq!(b.apply_resolution(settled), Ok(Applied::Superseded));
        assert_eq!(b.state(), ComponentState::Pending);
        assert!(b.name().is_none());

        block_on(b.resolve()).unwrap();
        assert_eq!(b.name(), Some("from-b"));
    }

    #[test]
    fn test_same() {
        let ty = some_type();
        let a = InstructionComponent::create(Appellation::from(ty.clone()));
        let b = InstructionComponent::create(Appellation::from(ty.create_instance()));
        let c = InstructionComponent::create(Appellation::from("some-type"));
        let other_type = InstructionComponent::create(Appellation::from(
            ComponentType::new("some-type", || ()),
        ));

        assert!(a.same(&b, false));
        assert!(a.same(&c, false));
        assert!(a.same(&b, true));
        assert!(!a.same(&c, true));
        assert!(a.same(&other_type, false));
        assert!(!a.same(&other_type, true));
    }
}
