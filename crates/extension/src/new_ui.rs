//! Manager page layout toggle
//!
//! The manager has an old and a new layout; the new one has extra
//! options that only matter while it is enabled.

use serde_json::Value;
use storage::Prefs;
use stylus_core::{deep_equal, is_falsy, Object};

/// Option ids, `enabled` first
pub const IDS: [&str; 4] = ["enabled", "favicons", "faviconsGray", "targets"];

const PREF_PREFIX: &str = "manage.newUI.";

/// Preference key of an option id; `enabled` maps to `manage.newUI`
pub fn pref_key(id: &str) -> String {
    let key = format!("{PREF_PREFIX}{id}");
    match key.strip_suffix(".enabled") {
        Some(stripped) => stripped.to_string(),
        None => key,
    }
}

/// What the page has rendered so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderState {
    pub favicons_rendered: bool,
    /// Only part of the list is rendered yet
    pub partial_render: bool,
}

/// Follow-up work after the options changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    /// Rebuild the whole style list
    RerenderAll,
    /// Redraw the per-entry target lists
    RenderTargets,
    /// Load missing favicons after the debounce delay
    DebounceFavicons,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiUpdate {
    pub new_ui: bool,
    pub has_favicons: bool,
    pub favicons_grayed: bool,
    pub has_targets: bool,
    pub changed: Vec<&'static str>,
    pub actions: Vec<UiAction>,
}

impl UiUpdate {
    pub fn root_class(&self) -> &'static str {
        if self.new_ui {
            "newUI"
        } else {
            "oldUI"
        }
    }

    /// Classes toggled on the style list
    pub fn entry_classes(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("has-favicons", self.has_favicons),
            ("favicons-grayed", self.favicons_grayed),
            ("has-targets", self.has_targets),
        ]
    }
}

/// Tracks the layout options between preference changes
#[derive(Debug, Default)]
pub struct NewUi {
    values: Object,
}

impl NewUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of an option id
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    /// Re-read the options from `prefs`
    ///
    /// Options other than `enabled` only count as changed while the new
    /// layout is enabled. Returns `None` when nothing changed, except on
    /// the initial call.
    pub fn refresh(&mut self, prefs: &Prefs, is_init: bool, render: RenderState) -> Option<UiUpdate> {
        let mut next = Object::new();
        let mut changed = Vec::new();
        for id in IDS {
            let value = prefs.get(&pref_key(id)).unwrap_or(Value::Null);
            let differs = self
                .values
                .get(id)
                .map_or(true, |old| !deep_equal(old, &value, &[]));
            let enabled = next.get("enabled").map_or(false, |v| !is_falsy(v));
            if differs && (id == "enabled" || enabled) {
                changed.push(id);
            }
            next.insert(id.to_string(), value);
        }
        self.values = next;

        if !is_init && changed.is_empty() {
            return None;
        }

        let enabled = self.flag("enabled");
        let has_favicons = enabled && self.flag("favicons");
        let mut actions = Vec::new();
        if !is_init {
            let favicons_missing = has_favicons && !render.favicons_rendered;
            if changed.contains(&"enabled") || (favicons_missing && !render.partial_render) {
                actions.push(UiAction::RerenderAll);
            } else {
                if changed.contains(&"targets") {
                    actions.push(UiAction::RenderTargets);
                }
                if favicons_missing {
                    actions.push(UiAction::DebounceFavicons);
                }
            }
        }

        Some(UiUpdate {
            new_ui: enabled,
            has_favicons,
            favicons_grayed: enabled && self.flag("faviconsGray"),
            has_targets: !enabled || self.flag("targets"),
            changed,
            actions,
        })
    }

    fn flag(&self, id: &str) -> bool {
        self.values.get(id).map_or(false, |v| !is_falsy(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prefs() -> Prefs {
        let defaults = json!({
            "manage.newUI": true,
            "manage.newUI.favicons": false,
            "manage.newUI.faviconsGray": true,
            "manage.newUI.targets": 3,
        });
        Prefs::new(defaults.as_object().unwrap().clone())
    }

    #[test]
    fn test_pref_keys() {
        assert_eq!(pref_key("enabled"), "manage.newUI");
        assert_eq!(pref_key("faviconsGray"), "manage.newUI.faviconsGray");
    }

    #[test]
    fn test_initial_refresh() {
        let prefs = prefs();
        let mut ui = NewUi::new();
        let update = ui.refresh(&prefs, true, RenderState::default()).unwrap();

        assert_eq!(update.root_class(), "newUI");
        assert_eq!(update.changed, IDS.to_vec());
        assert!(update.actions.is_empty());
        assert_eq!(
            update.entry_classes(),
            vec![("has-favicons", false), ("favicons-grayed", true), ("has-targets", true)]
        );
        assert_eq!(ui.get("targets"), Some(&json!(3)));

        assert_eq!(ui.refresh(&prefs, false, RenderState::default()), None);
    }

    #[test]
    fn test_options_ignored_while_disabled() {
        let prefs = prefs();
        let mut ui = NewUi::new();
        ui.refresh(&prefs, true, RenderState::default());

        prefs.set("manage.newUI", json!(false)).unwrap();
        let update = ui.refresh(&prefs, false, RenderState::default()).unwrap();
        assert_eq!(update.root_class(), "oldUI");
        assert_eq!(update.changed, vec!["enabled"]);
        assert_eq!(update.actions, vec![UiAction::RerenderAll]);
        assert!(update.has_targets);
        assert!(!update.favicons_grayed);

        prefs.set("manage.newUI.targets", json!(0)).unwrap();
        assert_eq!(ui.refresh(&prefs, false, RenderState::default()), None);
    }

    #[test]
    fn test_targets_and_favicons() {
        let prefs = prefs();
        let mut ui = NewUi::new();
        ui.refresh(&prefs, true, RenderState::default());

        prefs.set("manage.newUI.targets", json!(0)).unwrap();
        let update = ui.refresh(&prefs, false, RenderState::default()).unwrap();
        assert_eq!(update.actions, vec![UiAction::RenderTargets]);
        assert!(!update.has_targets);

        prefs.set("manage.newUI.favicons", json!(true)).unwrap();
        let partial = RenderState {
            favicons_rendered: false,
            partial_render: true,
        };
        let update = ui.refresh(&prefs, false, partial).unwrap();
        assert!(update.has_favicons);
        assert_eq!(update.actions, vec![UiAction::DebounceFavicons]);

        prefs.set("manage.newUI.faviconsGray", json!(false)).unwrap();
        let update = ui.refresh(&prefs, false, RenderState::default()).unwrap();
        assert_eq!(update.changed, vec!["faviconsGray"]);
        assert_eq!(update.actions, vec![UiAction::RerenderAll]);
    }
}
