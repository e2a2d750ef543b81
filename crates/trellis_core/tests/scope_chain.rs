//! Property resolution across realistic scope chains

use std::sync::{Arc, Mutex};

use trellis_core::{
    resolve_property, BindingContext, ContextInit, ContextTarget, LifecycleFlags,
    OverrideContext, ProxyObserverCache, ProxyObserverFactory, Scope, ScopeError, Value,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("trellis_core=trace")
        .with_test_writer()
        .try_init();
}

/// A page with a list rendered through a repeater, one child scope per item
fn repeated_rows(page: &Scope, items: &[&str]) -> Result<Vec<Scope>, ScopeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let row = Scope::from_parent(
                LifecycleFlags::NONE,
                Some(page),
                BindingContext::with_property("item", *item),
            )?;
            row.override_context().set("$index", index as i32);
            row.override_context().set("$first", index == 0);
            Ok(row)
        })
        .collect()
}

#[test]
fn test_repeater_rows_resolve_items_and_page_state() -> Result<(), ScopeError> {
    init_tracing();
    let flags = LifecycleFlags::NONE;
    let page_bc = BindingContext::new();
    page_bc.set("title", "Inbox");
    page_bc.set("item", "page-level");
    let page = Scope::create(flags, page_bc.clone());

    let rows = repeated_rows(&page, &["a", "b", "c"])?;

    for (index, row) in rows.iter().enumerate() {
        // Row item shadows the page's `item`
        let item = resolve_property(Some(row), "item", 0, flags, None)?;
        let bc = item.as_binding().expect("row binding context");
        assert!(bc.ptr_eq(row.binding_context()));

        // Injected `$index` lives on the override context
        let injected = resolve_property(Some(row), "$index", 0, flags, None)?;
        let oc = injected.as_override().expect("override context");
        assert_eq!(oc.get("$index"), Some(Value::from(index as i32)));

        // Page state is found one level up
        let title = resolve_property(Some(row), "title", 0, flags, None)?;
        assert!(title.as_binding().is_some_and(|bc| bc.ptr_eq(&page_bc)));

        // `$parent.item` addresses the page explicitly
        let parent_item = resolve_property(Some(row), "item", 1, flags, None)?;
        assert!(parent_item.as_binding().is_some_and(|bc| bc.ptr_eq(&page_bc)));
    }
    Ok(())
}

#[test]
fn test_ancestor_offset_beyond_depth_is_not_found() -> Result<(), ScopeError> {
    let flags = LifecycleFlags::NONE;
    let root = Scope::create(flags, BindingContext::with_property("p", 1));
    let mut leaf = root.clone();
    for _ in 0..4 {
        leaf = Scope::from_parent(flags, Some(&leaf), BindingContext::new())?;
    }
    assert_eq!(leaf.depth(), 4);

    for offset in 0..=4 {
        let target = resolve_property(Some(&leaf), "p", offset, flags, None)?;
        if offset == 0 || offset == 4 {
            assert!(target.as_binding().is_some_and(|bc| bc.ptr_eq(root.binding_context())));
        }
    }
    for offset in 5..8 {
        let target = resolve_property(Some(&leaf), "p", offset, flags, None)?;
        assert!(target.is_not_found());
    }
    Ok(())
}

#[test]
fn test_slotted_content_falls_back_to_host() -> Result<(), ScopeError> {
    let flags = LifecycleFlags::NONE;
    let host = Scope::create(flags, BindingContext::with_property("label", "Save"));
    let projected = Scope::create(flags, BindingContext::new());

    let label = resolve_property(Some(&projected), "label", 0, flags, Some(&host))?;
    assert!(label.as_binding().is_some_and(|bc| bc.ptr_eq(host.binding_context())));

    // Unknown names default to the projected scope for assignment
    let missing = resolve_property(Some(&projected), "missing", 0, flags, Some(&host))?;
    assert!(missing
        .as_binding()
        .is_some_and(|bc| bc.ptr_eq(projected.binding_context())));

    let traversing = flags | LifecycleFlags::IS_TRAVERSING_PARENT_SCOPE;
    let boundary = resolve_property(Some(&projected), "missing", 0, traversing, Some(&host))?;
    assert!(matches!(boundary, ContextTarget::Boundary));
    Ok(())
}

#[test]
fn test_shared_override_context_root() -> Result<(), ScopeError> {
    let flags = LifecycleFlags::NONE;
    let oc = OverrideContext::create(flags, BindingContext::with_property("x", 1));
    oc.set("$host", "element");

    let scope = Scope::from_override(flags, Some(oc.clone()))?;
    let target = resolve_property(Some(&scope), "$host", 0, flags, None)?;
    assert!(target.as_override().is_some_and(|found| found.ptr_eq(&oc)));

    assert!(Scope::from_override(flags, None).is_err());
    assert!(Scope::from_parent(flags, None, BindingContext::new()).is_err());
    Ok(())
}

#[test]
fn test_observed_scope_reports_writes() -> Result<(), ScopeError> {
    init_tracing();
    let observers = ProxyObserverCache::new();
    let data = BindingContext::with_property("count", 0);
    let flags = LifecycleFlags::PROXY_STRATEGY;

    let observed = BindingContext::create_observed(flags, ContextInit::CopyFrom(&data), &observers);
    let observer = observers.get_or_create(&observed);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    observer.subscribe(move |change| {
        sink.lock().unwrap().push(change.key.clone());
    });

    let scope = Scope::create(flags, observed);
    let target = resolve_property(Some(&scope), "count", 0, flags, None)?;
    target.as_binding().expect("binding context").set("count", 1);

    assert_eq!(*seen.lock().unwrap(), vec!["count".to_string()]);
    // The copy is independent of the original data
    assert_eq!(data.get("count"), Some(Value::from(0)));
    Ok(())
}
