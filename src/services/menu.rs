//! Navigation menu assembly from the applications a user's roles grant.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::database::models::{Application, ApplicationId};

/// Top level, children, grandchildren. Nothing deeper is ever resolved.
pub const MAX_MENU_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: ApplicationId,
    pub name: String,
    pub url: Option<String>,
    pub icon_image_url: Option<String>,
    pub icon_class: Option<String>,
    pub is_group: bool,
    pub area_name: String,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    fn leaf(app: &Application) -> Self {
        Self {
            id: app.id,
            name: app.application_name.clone(),
            url: app.url.clone(),
            icon_image_url: app.icon_image_url.clone(),
            icon_class: app.icon_class.clone(),
            is_group: app.is_group,
            area_name: app.area_name.clone(),
            children: Vec::new(),
        }
    }
}

/// Build the menu from granted applications.
///
/// Duplicates (the same application reached through several roles) collapse
/// to one entry. A granted application only shows up when its parent is shown
/// too, and every level is sorted by application id.
pub fn build_menu(granted: &[Application]) -> Vec<MenuItem> {
    let by_id: BTreeMap<ApplicationId, &Application> =
        granted.iter().map(|app| (app.id, app)).collect();

    let mut children: BTreeMap<ApplicationId, Vec<ApplicationId>> = BTreeMap::new();
    let mut top_level = Vec::new();
    for app in by_id.values() {
        match app.parent {
            None => top_level.push(app.id),
            Some(parent) => children.entry(parent).or_default().push(app.id),
        }
    }

    let mut placed = HashSet::new();
    top_level
        .into_iter()
        .filter_map(|id| attach(id, 1, &by_id, &children, &mut placed))
        .collect()
}

fn attach(
    id: ApplicationId,
    depth: usize,
    by_id: &BTreeMap<ApplicationId, &Application>,
    children: &BTreeMap<ApplicationId, Vec<ApplicationId>>,
    placed: &mut HashSet<ApplicationId>,
) -> Option<MenuItem> {
    if !placed.insert(id) {
        return None;
    }
    let mut item = MenuItem::leaf(by_id.get(&id)?);
    if depth < MAX_MENU_DEPTH {
        item.children = children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| attach(*child, depth + 1, by_id, children, placed))
            .collect();
    }
    Some(item)
}
