//! Ordered, validated collection of categories.
//!
//! The registry is built once at startup and is immutable afterwards. Its
//! construction enforces the configuration-integrity rules:
//! - an extension may be claimed by at most one category, unless every
//!   claimant belongs to the image family (Photos/Images);
//! - the Unknown category is present exactly once;
//! - no category id is registered twice.

use crate::file_category::{Category, CategoryId, NonSplittable, normalize_extension};
use std::collections::{HashMap, HashSet};

/// Configuration-integrity failures detected while building the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An extension is claimed by several categories outside the image family.
    ExtensionConflict {
        extension: String,
        categories: Vec<String>,
    },
    /// No Unknown category was registered.
    MissingUnknownCategory,
    /// More than one Unknown category was registered.
    DuplicateUnknownCategory,
    /// The same category id was registered twice.
    DuplicateCategory(CategoryId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::ExtensionConflict {
                extension,
                categories,
            } => write!(
                f,
                "Category extensions overlap: {}: {}",
                extension,
                categories.join(", ")
            ),
            RegistryError::MissingUnknownCategory => write!(f, "Unknown category is missing"),
            RegistryError::DuplicateUnknownCategory => {
                write!(f, "Unknown category is registered more than once")
            }
            RegistryError::DuplicateCategory(id) => {
                write!(f, "Category {} is registered more than once", id.display_name())
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// The frozen, ordered list of categories plus precomputed lookups.
#[derive(Debug)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    by_extension: HashMap<String, usize>,
    image_extensions: HashSet<String>,
    unknown_index: usize,
}

impl CategoryRegistry {
    /// Validates and freezes `categories`, keeping registration order.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the list violates any integrity rule.
    pub fn new(categories: Vec<Category>) -> Result<Self, RegistryError> {
        let mut seen_ids = HashSet::new();
        let mut unknown_index = None;

        for (index, category) in categories.iter().enumerate() {
            if !seen_ids.insert(category.id()) {
                return Err(if category.id() == CategoryId::Unknown {
                    RegistryError::DuplicateUnknownCategory
                } else {
                    RegistryError::DuplicateCategory(category.id())
                });
            }
            if category.id() == CategoryId::Unknown {
                unknown_index = Some(index);
            }
        }

        let unknown_index = unknown_index.ok_or(RegistryError::MissingUnknownCategory)?;

        Self::validate_extensions(&categories)?;

        let mut by_extension = HashMap::new();
        let mut image_extensions = HashSet::new();

        for (index, category) in categories.iter().enumerate() {
            for extension in category.extensions() {
                if category.is_image_family() {
                    image_extensions.insert(extension.clone());
                }
                // First registered claimant wins; only image-family ties remain
                // after validation.
                by_extension.entry(extension.clone()).or_insert(index);
            }
        }

        Ok(Self {
            categories,
            by_extension,
            image_extensions,
            unknown_index,
        })
    }

    fn validate_extensions(categories: &[Category]) -> Result<(), RegistryError> {
        let mut claimants: HashMap<&str, Vec<&Category>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for category in categories {
            for extension in category.extensions() {
                let entry = claimants.entry(extension.as_str()).or_default();
                if entry.is_empty() {
                    order.push(extension.as_str());
                }
                entry.push(category);
            }
        }

        for extension in order {
            let owners = &claimants[extension];
            if owners.len() > 1 && !owners.iter().all(|c| c.is_image_family()) {
                let mut names: Vec<String> = owners.iter().map(|c| c.name().to_string()).collect();
                names.sort_by_key(|n| n.to_lowercase());
                names.dedup();
                return Err(RegistryError::ExtensionConflict {
                    extension: extension.to_string(),
                    categories: names,
                });
            }
        }

        Ok(())
    }

    /// Case-insensitive exact lookup of the category claiming `extension`.
    ///
    /// For image-family extensions the first registered image category is
    /// returned; Photos/Images disambiguation is the resolver's job.
    pub fn resolve(&self, extension: &str) -> Option<&Category> {
        let normalized = normalize_extension(extension);
        self.by_extension
            .get(&normalized)
            .map(|&index| &self.categories[index])
    }

    /// The category registered under `id`, if any.
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id() == id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.get(id).is_some()
    }

    /// The Unknown catch-all category.
    pub fn unknown(&self) -> &Category {
        &self.categories[self.unknown_index]
    }

    /// Every category, in registration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Categories with a non-splittable capability, in registration order.
    pub fn non_splittable(&self) -> impl Iterator<Item = (&Category, &dyn NonSplittable)> {
        self.categories
            .iter()
            .filter_map(|c| c.capability().map(|capability| (c, capability)))
    }

    /// Whether `extension` belongs to the shared image extension set.
    pub fn is_image_extension(&self, extension: &str) -> bool {
        self.image_extensions
            .contains(&normalize_extension(extension))
    }

    /// Image-family categories claiming `extension`, in registration order.
    pub fn image_categories_for(&self, extension: &str) -> impl Iterator<Item = &Category> {
        let normalized = normalize_extension(extension);
        self.categories
            .iter()
            .filter(move |c| c.is_image_family() && c.matches(&normalized))
    }

    /// Case-insensitive lookup by destination folder name.
    pub fn by_folder_name(&self, folder_name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.folder_name().eq_ignore_ascii_case(folder_name))
    }
}
