//! Component descriptor: the static, `Copy` handle to a component.
//!
//! Component crates contribute a [`ComponentDescriptor`] to the [`COMPONENTS`]
//! distributed slice. Linking the crate is enough to make the component
//! available to [`RegistryBuilder::with_linked_components`].
//!
//! ```rust,ignore
//! use conflux_core::linkme::distributed_slice;
//! use conflux_core::{COMPONENTS, ComponentDescriptor, ComponentKind};
//!
//! #[distributed_slice(COMPONENTS)]
//! #[linkme(crate = conflux_core::linkme)]
//! pub static SQL: ComponentDescriptor = ComponentDescriptor {
//!     id: "sql",
//!     kind: ComponentKind::Component,
//!     title: "SQL",
//!     options: sql_options,
//!     factory: sql_factory,
//! };
//! ```
//!
//! [`RegistryBuilder::with_linked_components`]: crate::RegistryBuilder::with_linked_components

use linkme::distributed_slice;

use crate::endpoint::BoxedFactory;
use crate::error::SchemaResult;
use crate::option::OptionDescriptor;
use crate::schema::{ComponentKind, ComponentSchema};

/// A static descriptor that declares a component and creates its factory.
#[derive(Debug, Clone, Copy)]
pub struct ComponentDescriptor {
    /// Component identifier (also the configuration section name).
    pub id: &'static str,

    /// Catalog category.
    pub kind: ComponentKind,

    /// Human readable title.
    pub title: &'static str,

    /// Builds the option descriptor list.
    pub options: fn() -> Vec<OptionDescriptor>,

    /// Creates the component factory.
    pub factory: fn() -> BoxedFactory,
}

impl ComponentDescriptor {
    /// Builds and validates the component schema.
    pub fn schema(&self) -> SchemaResult<ComponentSchema> {
        ComponentSchema::builder(self.id)
            .kind(self.kind)
            .title(self.title)
            .options((self.options)())
            .build()
    }

    /// Creates the factory.
    #[inline]
    pub fn instantiate(&self) -> BoxedFactory {
        (self.factory)()
    }
}

/// Every component descriptor linked into the binary.
#[distributed_slice]
pub static COMPONENTS: [ComponentDescriptor];

/// Returns the linked component descriptors.
pub fn linked_components() -> &'static [ComponentDescriptor] {
    &COMPONENTS
}
