use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use super::{CompanyId, Lifecycle, LocationId, UserId};

/// A site in the location forest. `parent_location_id = None` marks a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub location_name: String,
    pub location_code: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_type: Option<String>,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub contact_email: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub parent_location_id: Option<LocationId>,
    pub company_id: Option<CompanyId>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl Location {
    pub fn is_root(&self) -> bool {
        self.parent_location_id.is_none()
    }

    /// Inclusive bounding-box test; locations without coordinates never match.
    pub fn within_bounds(&self, ne_lat: f64, ne_lng: f64, sw_lat: f64, sw_lng: f64) -> bool {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                lat >= sw_lat && lat <= ne_lat && lng >= sw_lng && lng <= ne_lng
            }
            _ => false,
        }
    }

    /// Apply a partial update. Parent changes must be checked by the caller.
    pub fn apply(&mut self, patch: LocationPatch) {
        if let Some(v) = patch.location_name {
            self.location_name = v.trim().to_string();
        }
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        assign(&mut self.location_code, patch.location_code);
        assign(&mut self.address, patch.address);
        assign(&mut self.city, patch.city);
        assign(&mut self.state, patch.state);
        assign(&mut self.pin_code, patch.pin_code);
        assign(&mut self.country, patch.country);
        assign(&mut self.latitude, patch.latitude);
        assign(&mut self.longitude, patch.longitude);
        assign(&mut self.location_type, patch.location_type);
        assign(&mut self.contact_person, patch.contact_person);
        assign(&mut self.contact_number, patch.contact_number);
        assign(&mut self.contact_email, patch.contact_email);
        assign(&mut self.description, patch.description);
        assign(&mut self.parent_location_id, patch.parent_location_id);
        assign(&mut self.company_id, patch.company_id);
    }
}

fn assign<T>(field: &mut Option<T>, update: Option<Option<T>>) {
    if let Some(value) = update {
        *field = value;
    }
}

/// Payload for creating a location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLocation {
    pub location_name: String,
    #[serde(default)]
    pub location_code: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pin_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub parent_location_id: Option<LocationId>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

impl NewLocation {
    /// Named constructor for the common case of a bare node in the tree.
    pub fn named(name: impl Into<String>, parent_location_id: Option<LocationId>) -> Self {
        Self {
            location_name: name.into(),
            parent_location_id,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut errors = HashMap::new();
        if self.location_name.trim().is_empty() {
            errors.insert("location_name".to_string(), "This field is required".to_string());
        }
        check_coordinates(self.latitude, self.longitude, &mut errors);
        check_email(self.contact_email.as_deref(), &mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Partial update. For every nullable column an explicit JSON `null` clears
/// the field while an absent key leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationPatch {
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub location_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub pin_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub location_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub contact_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub parent_location_id: Option<Option<LocationId>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub company_id: Option<Option<CompanyId>>,
}

impl LocationPatch {
    pub fn reparent(parent_location_id: Option<LocationId>) -> Self {
        Self {
            parent_location_id: Some(parent_location_id),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), HashMap<String, String>> {
        let mut errors = HashMap::new();
        if let Some(name) = &self.location_name {
            if name.trim().is_empty() {
                errors.insert("location_name".to_string(), "Must not be empty".to_string());
            }
        }
        check_coordinates(self.latitude.flatten(), self.longitude.flatten(), &mut errors);
        check_email(self.contact_email.as_ref().and_then(|e| e.as_deref()), &mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_coordinates(latitude: Option<f64>, longitude: Option<f64>, errors: &mut HashMap<String, String>) {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            errors.insert("latitude".to_string(), "Must be between -90 and 90".to_string());
        }
    }
    if let Some(lng) = longitude {
        if !(-180.0..=180.0).contains(&lng) {
            errors.insert("longitude".to_string(), "Must be between -180 and 180".to_string());
        }
    }
}

fn check_email(email: Option<&str>, errors: &mut HashMap<String, String>) {
    if let Some(email) = email {
        let valid = email
            .split_once('@')
            .map(|(user, domain)| !user.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid {
            errors.insert("contact_email".to_string(), "Invalid email address".to_string());
        }
    }
}

/// Listing filters accepted by `GET /api/locations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationQuery {
    pub company_id: Option<CompanyId>,
    #[serde(rename = "type")]
    pub location_type: Option<String>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

impl LocationQuery {
    pub fn matches(&self, location: &Location) -> bool {
        if let Some(company_id) = self.company_id {
            if location.company_id != Some(company_id) {
                return false;
            }
        }
        if let Some(kind) = &self.location_type {
            if location.location_type.as_deref() != Some(kind.as_str()) {
                return false;
            }
        }
        if let Some(active) = self.active {
            if location.is_active != active {
                return false;
            }
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = [
                Some(location.location_name.as_str()),
                location.location_code.as_deref(),
                location.address.as_deref(),
                location.city.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Location {
        let now = Utc::now();
        Location {
            id: 1,
            location_name: "Plant A".to_string(),
            location_code: Some("PA-01".to_string()),
            address: None,
            city: Some("Ranchi".to_string()),
            state: None,
            pin_code: None,
            country: None,
            latitude: Some(23.34),
            longitude: Some(85.31),
            location_type: Some("plant".to_string()),
            contact_person: None,
            contact_number: None,
            contact_email: None,
            description: None,
            is_active: true,
            parent_location_id: None,
            company_id: Some(4),
            created_by: None,
            created_at: now,
            updated_by: None,
            updated_at: now,
            lifecycle: Lifecycle::Active,
        }
    }

    #[test]
    fn patch_distinguishes_absent_and_null_parent() {
        let absent: LocationPatch = serde_json::from_value(json!({ "city": "Bokaro" })).unwrap();
        assert!(absent.parent_location_id.is_none());

        let cleared: LocationPatch = serde_json::from_value(json!({ "parent_location_id": null })).unwrap();
        assert_eq!(cleared.parent_location_id, Some(None));

        let moved: LocationPatch = serde_json::from_value(json!({ "parent_location_id": 9 })).unwrap();
        assert_eq!(moved.parent_location_id, Some(Some(9)));
    }

    #[test]
    fn apply_clears_parent_on_explicit_null() {
        let mut location = sample();
        location.parent_location_id = Some(3);
        location.apply(LocationPatch::reparent(None));
        assert!(location.is_root());
    }

    #[test]
    fn apply_clears_optional_columns_on_null() {
        let mut location = sample();
        location.description = Some("old".to_string());
        let patch: LocationPatch =
            serde_json::from_value(json!({ "description": null, "latitude": null, "location_type": "yard" })).unwrap();
        location.apply(patch);
        assert_eq!(location.description, None);
        assert_eq!(location.latitude, None);
        assert_eq!(location.longitude, Some(85.31));
        assert_eq!(location.location_type.as_deref(), Some("yard"));
        assert_eq!(location.city.as_deref(), Some("Ranchi"));
    }

    #[test]
    fn patch_validation_checks_present_values() {
        let patch: LocationPatch = serde_json::from_value(json!({ "latitude": 120.0, "contact_email": null })).unwrap();
        let errors = patch.validate().unwrap_err();
        assert!(errors.contains_key("latitude"));
        assert!(!errors.contains_key("contact_email"));
    }

    #[test]
    fn validation_reports_each_bad_field() {
        let draft = NewLocation {
            location_name: "  ".to_string(),
            latitude: Some(91.0),
            longitude: Some(-181.0),
            contact_email: Some("nobody".to_string()),
            ..Default::default()
        };
        let errors = draft.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains_key("latitude"));
        assert!(errors.contains_key("contact_email"));
    }

    #[test]
    fn query_filters_combine() {
        let location = sample();
        let query = LocationQuery {
            company_id: Some(4),
            search: Some("pa-0".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&location));

        let query = LocationQuery {
            active: Some(false),
            ..Default::default()
        };
        assert!(!query.matches(&location));
    }

    #[test]
    fn bounds_are_inclusive_and_need_coordinates() {
        let mut location = sample();
        assert!(location.within_bounds(23.34, 86.0, 23.0, 85.31));
        location.latitude = None;
        assert!(!location.within_bounds(90.0, 180.0, -90.0, -180.0));
    }
}
