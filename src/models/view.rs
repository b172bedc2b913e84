use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::widget::Widget;

/// A named, persisted collection of widgets. Widget order is render order
/// and survives persistence, export and import unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated: String,
}

impl View {
    /// An empty builder-session view. The id is assigned on first save.
    pub fn create() -> Self {
        Self::default()
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Assign a fresh store id, used on first save and on import.
    pub fn assign_id(&mut self) {
        self.id = format!("view_{}", Uuid::new_v4().simple());
    }

    /// Save-time validation; callers surface failures before touching the
    /// network.
    pub fn validate(&self) -> Result<(), ViewValidationError> {
        if self.name.trim().is_empty() {
            return Err(ViewValidationError::EmptyName);
        }
        if self.widgets.is_empty() {
            return Err(ViewValidationError::NoWidgets);
        }
        Ok(())
    }

    /// The portable export shape: the view minus its store id.
    pub fn export(&self) -> ViewDocument {
        ViewDocument {
            name: self.name.clone(),
            description: self.description.clone(),
            widgets: self.widgets.clone(),
        }
    }

    pub fn widget_index(&self, widget_id: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w.id == widget_id)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ViewValidationError {
    #[error("view name must not be empty")]
    EmptyName,
    #[error("view must contain at least one widget")]
    NoWidgets,
}

/// Portable view document for export/import. `name` and `widgets` are
/// required; a document missing either is rejected during deserialization,
/// before anything is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDocument {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub widgets: Vec<Widget>,
}

impl ViewDocument {
    /// Parse an exported document. Any store id embedded in the text is
    /// discarded by the document shape itself.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Materialize a brand-new view from this document. The caller assigns
    /// the fresh id via the store; the document never carries one.
    pub fn into_view(self) -> View {
        View {
            id: String::new(),
            name: self.name,
            description: self.description,
            widgets: self.widgets,
            created: String::new(),
            updated: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::widget::WidgetKind;

    fn sample_view() -> View {
        let mut view = View::create();
        view.name = "Branch office".to_string();
        view.description = "Firewall and WiFi health".to_string();
        view.widgets = vec![
            Widget::new(WidgetKind::StatCard),
            Widget::new(WidgetKind::ChartSeverity),
            Widget::new(WidgetKind::DataTable),
        ];
        view.assign_id();
        view
    }

    #[test]
    fn validation_rejects_empty_name_and_empty_widgets() {
        let mut view = View::create();
        assert_eq!(view.validate(), Err(ViewValidationError::EmptyName));
        view.name = "  ".to_string();
        assert_eq!(view.validate(), Err(ViewValidationError::EmptyName));
        view.name = "ok".to_string();
        assert_eq!(view.validate(), Err(ViewValidationError::NoWidgets));
        view.widgets.push(Widget::new(WidgetKind::StatCard));
        assert!(view.validate().is_ok());
    }

    #[test]
    fn export_drops_the_store_id() {
        let view = sample_view();
        let doc = view.export();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["name"], "Branch office");
        assert_eq!(json["widgets"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn export_import_round_trip_preserves_content_and_order() {
        let view = sample_view();
        let text = view.export().to_json_pretty().unwrap();
        let mut imported = ViewDocument::from_json(&text).unwrap().into_view();
        imported.assign_id();

        assert_eq!(imported.name, view.name);
        assert_eq!(imported.description, view.description);
        assert_eq!(imported.widgets, view.widgets);
        assert_ne!(imported.id, view.id);
        assert!(!imported.id.is_empty());
    }

    #[test]
    fn import_rejects_documents_missing_name_or_widgets() {
        assert!(ViewDocument::from_json(r#"{"widgets": []}"#).is_err());
        assert!(ViewDocument::from_json(r#"{"name": "x"}"#).is_err());
        assert!(ViewDocument::from_json(r#"{"name": null, "widgets": []}"#).is_err());
        assert!(ViewDocument::from_json(r#"{"name": "x", "widgets": []}"#).is_ok());
    }

    #[test]
    fn embedded_id_in_import_text_is_discarded() {
        let text = r#"{"id": "view_stolen", "name": "x", "widgets": []}"#;
        let doc = ViewDocument::from_json(text).unwrap();
        let view = doc.into_view();
        assert!(view.id.is_empty());
    }
}
