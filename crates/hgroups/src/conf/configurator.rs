// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fail-fast property assembly.
//!
//! A layer declares its configurable surface as a static table of
//! [`PropertySpec`] rows. [`Configurator::apply`] first sweeps the raw set
//! for names the layer never declared, then walks the table in declaration
//! order, converting and assigning one field at a time. The first failure
//! aborts assembly.
//!
//! Sibling lookups (`initial_hosts` reading `port_range`) observe the layer
//! mid-assembly: rows earlier in the table are already assigned, later rows
//! still hold their defaults. Declare dependencies before their dependents.

use crate::conf::{
    ConfigError, Converter, ConvertCtx, InvokerRegistry, PropertyKind, PropertySet,
    PropertyValue, SiblingLookup,
};
use crate::net::NetworkEnv;

/// One declared property of a layer.
pub struct PropertySpec<P: 'static> {
    /// Raw-set key.
    pub name: &'static str,
    /// Declared scalar kind; drives `Default` parsing and diagnostics.
    pub kind: PropertyKind,
    /// Conversion strategy.
    pub converter: Converter,
    /// Snapshot the current field, `None` while unset.
    pub get: fn(&P) -> Option<PropertyValue>,
    /// Assign the converted value; `Err` carries the expected variant name.
    pub set: fn(&mut P, PropertyValue) -> Result<(), &'static str>,
}

/// A layer whose fields are populated from a [`PropertySet`].
pub trait Configurable: Sized + 'static {
    /// Static property table, in assignment order.
    fn property_table() -> &'static [PropertySpec<Self>];
}

/// Applies raw sets to layers, one layer at a time.
pub struct Configurator<'a> {
    props: &'a PropertySet,
    net: &'a dyn NetworkEnv,
    invokers: &'a InvokerRegistry,
}

impl<'a> Configurator<'a> {
    #[must_use]
    pub fn new(
        props: &'a PropertySet,
        net: &'a dyn NetworkEnv,
        invokers: &'a InvokerRegistry,
    ) -> Self {
        Self {
            props,
            net,
            invokers,
        }
    }

    /// Populate `layer` from the raw set. Aborts on the first unknown name,
    /// conversion failure, or assignment mismatch.
    pub fn apply<P: Configurable>(
        &self,
        layer: &mut P,
        layer_name: &'static str,
    ) -> Result<(), ConfigError> {
        let table = P::property_table();
        for (name, _) in self.props.iter() {
            if !table.iter().any(|spec| spec.name == name) {
                return Err(ConfigError::UnknownProperty {
                    layer: layer_name,
                    property: name.to_string(),
                });
            }
        }
        for spec in table {
            let Some(raw) = self.props.value(spec.name) else {
                continue;
            };
            let value = {
                let lookup = TableLookup {
                    layer: &*layer,
                    table,
                };
                let ctx = ConvertCtx {
                    layer: layer_name,
                    property: spec.name,
                    kind: spec.kind,
                    props: self.props,
                    siblings: &lookup,
                    net: self.net,
                    invokers: self.invokers,
                };
                spec.converter.convert(raw, &ctx)?
            };
            log::debug!("[conf] {}.{} <- {}", layer_name, spec.name, value.kind_name());
            (spec.set)(layer, value).map_err(|expected| ConfigError::TypeMismatch {
                layer: layer_name,
                property: spec.name.to_string(),
                expected,
            })?;
        }
        Ok(())
    }

    /// Render every declared property of `layer` back to its canonical raw
    /// form, table order. Unset and renderless fields map to `None`.
    #[must_use]
    pub fn dump<P: Configurable>(layer: &P) -> Vec<(&'static str, Option<String>)> {
        P::property_table()
            .iter()
            .map(|spec| {
                let rendered = (spec.get)(layer).and_then(|v| spec.converter.render(&v));
                (spec.name, rendered)
            })
            .collect()
    }
}

/// Sibling view over a half-assembled layer.
struct TableLookup<'b, P: 'static> {
    layer: &'b P,
    table: &'static [PropertySpec<P>],
}

impl<P> SiblingLookup for TableLookup<'_, P> {
    fn sibling(&self, name: &str) -> Option<PropertyValue> {
        self.table
            .iter()
            .find(|spec| spec.name == name)
            .and_then(|spec| (spec.get)(self.layer))
    }
}
