//! In-memory index over the location forest.
//!
//! Built from one bulk read of live locations. Every hierarchy query is a walk
//! over two maps: id → record and parent id → child ids. Sibling order is the
//! order the records were loaded in (newest first from the stores).

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

use crate::database::models::{Location, LocationId};

/// A location with its children attached, as returned by the hierarchy view.
#[derive(Debug, Clone, Serialize)]
pub struct LocationNode {
    #[serde(flatten)]
    pub location: Location,
    pub child_locations: Vec<LocationNode>,
}

#[derive(Debug, Default)]
pub struct LocationTree {
    nodes: HashMap<LocationId, Location>,
    roots: Vec<LocationId>,
    children: HashMap<LocationId, Vec<LocationId>>,
}

impl LocationTree {
    /// Index `locations`, skipping anything soft-deleted.
    pub fn build(locations: Vec<Location>) -> Self {
        let mut tree = Self::default();
        for location in locations.into_iter().filter(|l| l.lifecycle.is_active()) {
            match location.parent_location_id {
                None => tree.roots.push(location.id),
                Some(parent) => tree.children.entry(parent).or_default().push(location.id),
            }
            tree.nodes.insert(location.id, location);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.nodes.get(&id)
    }

    pub fn roots(&self) -> Vec<&Location> {
        self.resolve(&self.roots)
    }

    /// Direct children. Unknown parents simply have none.
    pub fn children(&self, parent: LocationId) -> Vec<&Location> {
        self.children
            .get(&parent)
            .map(|ids| self.resolve(ids))
            .unwrap_or_default()
    }

    /// Breadth-first closure below `id`, excluding `id` itself.
    /// `None` when `id` is not a live location.
    pub fn descendants(&self, id: LocationId) -> Option<Vec<&Location>> {
        self.nodes.get(&id)?;

        let mut found = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);

        while let Some(current) = queue.pop_front() {
            for child in self.children.get(&current).into_iter().flatten() {
                if !seen.insert(*child) {
                    warn!("Location {} reached twice below {}; parent chain has a cycle", child, id);
                    continue;
                }
                if let Some(location) = self.nodes.get(child) {
                    found.push(location);
                    queue.push_back(*child);
                }
            }
        }

        Some(found)
    }

    /// Parent chain of `id`, nearest parent first and root last, excluding
    /// `id` itself. `None` when `id` is not a live location.
    pub fn ancestors(&self, id: LocationId) -> Option<Vec<&Location>> {
        let mut current = self.nodes.get(&id)?;
        let mut seen = HashSet::from([id]);
        let mut chain = Vec::new();

        while let Some(parent_id) = current.parent_location_id {
            if !seen.insert(parent_id) {
                warn!("Ancestor walk from {} revisited {}; parent chain has a cycle", id, parent_id);
                break;
            }
            match self.nodes.get(&parent_id) {
                Some(parent) => {
                    chain.push(parent);
                    current = parent;
                }
                None => break,
            }
        }

        Some(chain)
    }

    /// True when making `new_parent` the parent of `id` would put `id` on its
    /// own ancestor chain.
    pub fn would_create_cycle(&self, id: LocationId, new_parent: LocationId) -> bool {
        if id == new_parent {
            return true;
        }
        self.ancestors(new_parent)
            .map(|chain| chain.iter().any(|l| l.id == id))
            .unwrap_or(false)
    }

    /// Names from the root down to `id`, joined with `" > "`.
    pub fn full_path(&self, id: LocationId) -> Option<String> {
        let location = self.nodes.get(&id)?;
        let mut names: Vec<&str> = self
            .ancestors(id)?
            .iter()
            .map(|l| l.location_name.as_str())
            .collect();
        names.reverse();
        names.push(&location.location_name);
        Some(names.join(" > "))
    }

    /// The whole forest, roots first, children nested recursively.
    pub fn hierarchy(&self) -> Vec<LocationNode> {
        let mut seen = HashSet::new();
        self.roots
            .iter()
            .filter_map(|id| self.subtree(*id, &mut seen))
            .collect()
    }

    fn subtree(&self, id: LocationId, seen: &mut HashSet<LocationId>) -> Option<LocationNode> {
        if !seen.insert(id) {
            return None;
        }
        let location = self.nodes.get(&id)?.clone();
        let child_locations = self
            .children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.subtree(*child, seen))
            .collect();
        Some(LocationNode {
            location,
            child_locations,
        })
    }

    fn resolve(&self, ids: &[LocationId]) -> Vec<&Location> {
        ids.iter().filter_map(|id| self.nodes.get(id)).collect()
    }
}
