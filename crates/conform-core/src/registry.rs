//! Per-type resolution cache.
//!
//! Resolving a shape is pure, so each component type is resolved once and
//! the result reused by every adapter built for it.

use std::any::TypeId;
use std::collections::HashMap;

use serde::Serialize;

use crate::component::Component;
use crate::dispatch::{resolve, Dispatch};
use crate::error::ShapeError;

/// Resolved dispatch of one component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub component: &'static str,
    pub dispatch: Dispatch,
}

/// Resolution results keyed by component type.
#[derive(Debug, Default)]
pub struct Registry {
    resolved: HashMap<TypeId, Resolution>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and resolve `C`, or return the cached result.
    ///
    /// Failures are not cached; registering a type that failed reports the
    /// same error again.
    pub fn register<C: Component>(&mut self) -> Result<Resolution, ShapeError> {
        let type_id = TypeId::of::<C>();
        if let Some(resolution) = self.resolved.get(&type_id) {
            return Ok(*resolution);
        }

        let shape = C::shape();
        let dispatch = shape.validate().and_then(|()| resolve(&shape)).map_err(|err| {
            log::error!("{err}");
            err
        })?;

        let resolution = Resolution {
            component: shape.name,
            dispatch,
        };
        log::debug!("{}: resolved to {:?}", shape.name, dispatch);
        self.resolved.insert(type_id, resolution);
        Ok(resolution)
    }

    /// Cached resolution of `C`, if registered.
    pub fn resolution<C: Component>(&self) -> Option<Resolution> {
        self.resolved.get(&TypeId::of::<C>()).copied()
    }

    /// Every cached resolution, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Resolution> + '_ {
        self.resolved.values()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}
