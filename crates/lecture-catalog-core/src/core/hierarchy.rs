// crates/lecture-catalog-core/src/core/hierarchy.rs
// ============================================================================
// Module: Lecture Catalog Hierarchy
// Description: Nested Section -> Category -> Subcategory -> Lecture views.
// Purpose: Join flat record lists into a read-only tree in one pass.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The hierarchy is a derived, read-only view. Storage backends fetch three
//! flat lists per section (categories, subcategories, lectures) and hand
//! them to [`assemble_section`], which joins them in memory by foreign key.
//!
//! Placement rules:
//! - A lecture with a known subcategory lands under that subcategory.
//! - Otherwise a lecture with a known category lands directly under the
//!   category.
//! - A lecture with neither reference is uncategorized.
//! - A lecture that references only unknown or deleted parents is omitted.
//!
//! Every category node is emitted even when it has no children.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Serialize;

use crate::core::identifiers::CategoryId;
use crate::core::identifiers::SubcategoryId;
use crate::core::records::Category;
use crate::core::records::Lecture;
use crate::core::records::Subcategory;
use crate::core::section::Section;

// ============================================================================
// SECTION: Nodes
// ============================================================================

/// A subcategory and its lectures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryNode {
    /// The subcategory record.
    pub subcategory: Subcategory,
    /// Lectures ordered by start time.
    pub lectures: Vec<Lecture>,
}

/// A category with its subcategories and directly attached lectures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    /// The category record.
    pub category: Category,
    /// Subcategories, non-empty first, then by name.
    pub subcategories: Vec<SubcategoryNode>,
    /// Lectures with this category but no subcategory, ordered by start time.
    pub lectures: Vec<Lecture>,
}

/// All content for one section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTree {
    /// Categories in section order.
    pub categories: Vec<CategoryNode>,
    /// Subcategories whose parent is missing or deleted.
    pub orphan_subcategories: Vec<SubcategoryNode>,
    /// Lectures with neither a category nor a subcategory.
    pub uncategorized_lectures: Vec<Lecture>,
}

impl SectionTree {
    /// Returns the total number of lectures placed in this tree.
    #[must_use]
    pub fn lecture_count(&self) -> usize {
        let in_categories: usize = self
            .categories
            .iter()
            .map(|node| {
                node.lectures.len()
                    + node.subcategories.iter().map(|sub| sub.lectures.len()).sum::<usize>()
            })
            .sum();
        let in_orphans: usize = self.orphan_subcategories.iter().map(|sub| sub.lectures.len()).sum();
        in_categories + in_orphans + self.uncategorized_lectures.len()
    }

    /// Finds a category node by identifier.
    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&CategoryNode> {
        self.categories.iter().find(|node| &node.category.id == id)
    }
}

/// The nested catalog keyed by every known section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CatalogHierarchy {
    /// Section trees keyed by section.
    pub sections: BTreeMap<Section, SectionTree>,
}

impl CatalogHierarchy {
    /// Returns the tree for a section.
    #[must_use]
    pub fn section(&self, section: Section) -> Option<&SectionTree> {
        self.sections.get(&section)
    }
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

/// Where a subcategory node lives while the tree is being built.
#[derive(Clone, Copy)]
enum SubcategorySlot {
    /// Index of the parent category node and of the subcategory within it.
    Nested(usize, usize),
    /// Index within the orphan list.
    Orphan(usize),
}

/// Joins flat section lists into a tree.
///
/// `categories` are expected in display order and already filtered to
/// non-deleted rows; `lectures` are expected to be the public set.
#[must_use]
pub fn assemble_section(
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    lectures: Vec<Lecture>,
) -> SectionTree {
    let mut tree = SectionTree {
        categories: categories
            .into_iter()
            .map(|category| CategoryNode {
                category,
                subcategories: Vec::new(),
                lectures: Vec::new(),
            })
            .collect(),
        orphan_subcategories: Vec::new(),
        uncategorized_lectures: Vec::new(),
    };
    let category_index: HashMap<CategoryId, usize> = tree
        .categories
        .iter()
        .enumerate()
        .map(|(index, node)| (node.category.id.clone(), index))
        .collect();

    let mut subcategory_index: HashMap<SubcategoryId, SubcategorySlot> = HashMap::new();
    for subcategory in subcategories {
        let id = subcategory.id.clone();
        let node = SubcategoryNode {
            subcategory,
            lectures: Vec::new(),
        };
        let parent = node
            .subcategory
            .category_id
            .as_ref()
            .and_then(|parent| category_index.get(parent))
            .copied();
        let slot = if let Some(parent) = parent {
            let children = &mut tree.categories[parent].subcategories;
            children.push(node);
            SubcategorySlot::Nested(parent, children.len() - 1)
        } else {
            tree.orphan_subcategories.push(node);
            SubcategorySlot::Orphan(tree.orphan_subcategories.len() - 1)
        };
        subcategory_index.insert(id, slot);
    }

    for lecture in lectures {
        let subcategory_slot =
            lecture.subcategory_id.as_ref().and_then(|id| subcategory_index.get(id)).copied();
        let category_slot =
            lecture.category_id.as_ref().and_then(|id| category_index.get(id)).copied();
        match (subcategory_slot, category_slot) {
            (Some(SubcategorySlot::Nested(parent, child)), _) => {
                tree.categories[parent].subcategories[child].lectures.push(lecture);
            }
            (Some(SubcategorySlot::Orphan(index)), _) => {
                tree.orphan_subcategories[index].lectures.push(lecture);
            }
            (None, Some(parent)) => tree.categories[parent].lectures.push(lecture),
            (None, None) if lecture.is_uncategorized() => tree.uncategorized_lectures.push(lecture),
            (None, None) => {}
        }
    }

    for node in &mut tree.categories {
        node.lectures.sort_by_key(|lecture| lecture.start_time);
        order_subcategories(&mut node.subcategories);
    }
    order_subcategories(&mut tree.orphan_subcategories);
    tree.uncategorized_lectures.sort_by_key(|lecture| lecture.start_time);
    tree
}

/// Orders subcategories non-empty first, then by name, and sorts lectures.
fn order_subcategories(nodes: &mut [SubcategoryNode]) {
    for node in nodes.iter_mut() {
        node.lectures.sort_by_key(|lecture| lecture.start_time);
    }
    nodes.sort_by(|left, right| {
        left.lectures
            .is_empty()
            .cmp(&right.lectures.is_empty())
            .then_with(|| left.subcategory.name.cmp(&right.subcategory.name))
    });
}
