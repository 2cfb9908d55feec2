//! Publishing attributes to the outside world.

use crate::attr::{Attribute, Store};
use std::{
	collections::BTreeMap,
	sync::{Arc, PoisonError, RwLock},
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
	#[error("attribute group already exists: {0}")]
	Exists(String),
	#[error("no such attribute: {0}")]
	NotFound(String),
}

/// A named set of attributes published and removed as one unit.
#[derive(Clone)]
pub struct AttributeGroup {
	pub name: String,
	pub attributes: Vec<Arc<dyn Attribute>>,
}

impl AttributeGroup {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			attributes: Vec::new(),
		}
	}

	pub fn with<A: Attribute + 'static>(mut self, attribute: A) -> Self {
		self.attributes.push(Arc::new(attribute));
		self
	}

	fn find(&self, name: &str) -> Option<&Arc<dyn Attribute>> {
		self.attributes.iter().find(|a| a.name() == name)
	}
}

/// Somewhere attribute groups can be published.
pub trait Registry {
	fn register(&self, group: AttributeGroup) -> Result<(), Error>;

	/// Removes the group and all of its attributes at once. Unknown names
	/// are ignored.
	fn unregister(&self, name: &str);
}

/// In-memory registry, addressed by `group/attribute` paths.
///
/// Clones share the same groups.
#[derive(Clone, Default)]
pub struct Namespace {
	groups: Arc<RwLock<BTreeMap<String, AttributeGroup>>>,
}

impl Namespace {
	pub fn new() -> Self {
		Self::default()
	}

	/// All attribute paths, sorted by group.
	pub fn list(&self) -> Vec<String> {
		let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
		groups
			.values()
			.flat_map(|group| {
				group
					.attributes
					.iter()
					.map(move |attr| format!("{}/{}", group.name, attr.name()))
			})
			.collect()
	}

	pub fn contains(&self, group: &str) -> bool {
		self.groups
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.contains_key(group)
	}

	pub fn show(&self, path: &str) -> Result<String, Error> {
		self.with_attribute(path, |attr| attr.show())
	}

	pub fn store(&self, path: &str, buf: &[u8]) -> Result<Store, Error> {
		self.with_attribute(path, |attr| attr.store(buf))
	}

	fn with_attribute<R>(&self, path: &str, f: impl FnOnce(&dyn Attribute) -> R) -> Result<R, Error> {
		let not_found = || Error::NotFound(path.to_string());
		let (group, name) = path.split_once('/').ok_or_else(not_found)?;

		// the attribute is cloned out so handlers never run under the lock
		let attr = {
			let groups = self.groups.read().unwrap_or_else(PoisonError::into_inner);
			groups
				.get(group)
				.and_then(|g| g.find(name))
				.cloned()
				.ok_or_else(not_found)?
		};

		Ok(f(attr.as_ref()))
	}
}

impl Registry for Namespace {
	fn register(&self, group: AttributeGroup) -> Result<(), Error> {
		let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);

		if groups.contains_key(&group.name) {
			return Err(Error::Exists(group.name));
		}

		groups.insert(group.name.clone(), group);
		Ok(())
	}

	fn unregister(&self, name: &str) {
		self.groups
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(name);
	}
}
