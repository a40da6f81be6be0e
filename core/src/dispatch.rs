//! Decides which widget properties are pushed to the backend on a pass.

use crate::backend::Backend;
use crate::render::Fields;
use crate::view::{Property, UpdateStrategy};

/// Pushes every present property. Used when a node is created.
pub(crate) fn push_all<B: Backend>(
    backend: &mut B,
    handle: &mut B::Handle,
    fields: &mut Fields,
    properties: &[Property],
) -> usize {
    let mut pushed = 0;
    for property in properties {
        if let Some(value) = &property.value {
            log::trace!("init {} = {:?}", property.name, value);
            backend.push_field(handle, fields, property.name, value);
            pushed += 1;
        }
    }
    pushed
}

/// Pushes the properties of an existing node that need pushing on this pass.
///
/// In order:
/// 1. `Always` properties, and `Automatic` properties that can’t be compared
/// 2. `AlwaysWhenStateChanged` properties, if `update_properties` is set
/// 3. `Automatic` properties whose value differs from the one in `previous`
///
/// Only step 2 depends on `update_properties`. `Automatic` properties are compared on every
/// pass that reaches the node, including passes that are not property-update passes, so a
/// changed value is never held back until some state of an ancestor changes.
///
/// Returns the number of pushes.
pub(crate) fn push_changed<B: Backend>(
    backend: &mut B,
    handle: &mut B::Handle,
    fields: &mut Fields,
    properties: &[Property],
    previous: &[Property],
    update_properties: bool,
) -> usize {
    let mut pushed = 0;
    let mut push = |backend: &mut B, handle: &mut B::Handle, fields: &mut Fields, p: &Property| {
        if let Some(value) = &p.value {
            log::trace!("push {} = {:?}", p.name, value);
            backend.push_field(handle, fields, p.name, value);
            pushed += 1;
        }
    };

    for p in properties {
        let incomparable = p.value.as_ref().map_or(false, |v| !v.is_comparable());
        match p.strategy {
            UpdateStrategy::Always => push(backend, handle, fields, p),
            UpdateStrategy::Automatic if incomparable => push(backend, handle, fields, p),
            _ => (),
        }
    }

    if update_properties {
        for p in properties {
            if p.strategy == UpdateStrategy::AlwaysWhenStateChanged {
                push(backend, handle, fields, p);
            }
        }
    }

    for p in properties {
        if p.strategy != UpdateStrategy::Automatic {
            continue;
        }
        let value = match &p.value {
            Some(value) if value.is_comparable() => value,
            _ => continue,
        };
        let unchanged = previous
            .iter()
            .find(|q| q.name == p.name)
            .and_then(|q| q.value.as_ref())
            .and_then(|old| old.diff_eq(value))
            .unwrap_or(false);
        if !unchanged {
            push(backend, handle, fields, p);
        }
    }

    pushed
}
