use serde::{Deserialize, Serialize};

use super::ApplicationId;

/// A navigation entry. `parent = None` marks a top-level menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub application_name: String,
    pub parent: Option<ApplicationId>,
    pub is_group: bool,
    pub url: Option<String>,
    pub icon_image_url: Option<String>,
    pub icon_class: Option<String>,
    pub area_name: String,
}

/// Seed definition; applications are matched by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub application_name: String,
    pub parent: Option<ApplicationId>,
    pub is_group: bool,
    pub url: Option<String>,
    pub icon_image_url: Option<String>,
    pub icon_class: Option<String>,
    pub area_name: String,
}

impl NewApplication {
    pub fn new(name: &str, url: &str, area_name: &str) -> Self {
        Self {
            application_name: name.to_string(),
            parent: None,
            is_group: false,
            url: Some(url.to_string()),
            icon_image_url: None,
            icon_class: None,
            area_name: area_name.to_string(),
        }
    }

    pub fn under(mut self, parent: ApplicationId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn icon(mut self, icon_class: &str) -> Self {
        self.icon_class = Some(icon_class.to_string());
        self
    }

    pub fn group(mut self) -> Self {
        self.is_group = true;
        self
    }
}
