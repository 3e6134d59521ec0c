// ABOUTME: Switch preference wiring for the power-limit setting.
// ABOUTME: Presets the switch from the node and persists user changes through a change listener.

use crate::node::PowerLimitNode;

/// Preference key of the power-limit switch.
pub const PREF_POWER_LIMIT: &str = "power_limit_pref";

/// Receives proposed preference changes. Returning false rejects the change.
pub trait OnPreferenceChange {
    fn on_preference_change(&self, key: &str, new_value: bool) -> bool;
}

/// A boolean switch that only takes a new value once its listener accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPreference {
    key: String,
    checked: bool,
}

impl SwitchPreference {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            checked: false,
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    /// Offer `new_value` to the listener and adopt it if accepted.
    pub fn request_change(&mut self, new_value: bool, listener: &dyn OnPreferenceChange) -> bool {
        let accepted = listener.on_preference_change(&self.key, new_value);
        if accepted {
            self.checked = new_value;
        }
        accepted
    }
}

/// The power-limit settings screen: one switch backed by the kernel node.
#[derive(Debug, Clone)]
pub struct PowerLimitSettings {
    node: PowerLimitNode,
    switch: SwitchPreference,
}

impl PowerLimitSettings {
    /// Build the switch and preset it from the node's current contents.
    pub fn create(node: PowerLimitNode) -> Self {
        let mut switch = SwitchPreference::new(PREF_POWER_LIMIT);
        switch.set_checked(node.is_currently_limited());
        Self { node, switch }
    }

    pub fn node(&self) -> &PowerLimitNode {
        &self.node
    }

    pub fn is_checked(&self) -> bool {
        self.switch.is_checked()
    }

    /// User flipped the switch. Returns whether the node took the new value.
    pub fn set_limited(&mut self, limited: bool) -> bool {
        let Self { node, switch } = self;
        switch.request_change(limited, &NodeListener(&*node))
    }

    /// Re-read the node, picking up changes made behind our back.
    pub fn refresh(&mut self) -> bool {
        let limited = self.node.is_currently_limited();
        self.switch.set_checked(limited);
        limited
    }
}

impl OnPreferenceChange for PowerLimitSettings {
    fn on_preference_change(&self, key: &str, new_value: bool) -> bool {
        NodeListener(&self.node).on_preference_change(key, new_value)
    }
}

struct NodeListener<'a>(&'a PowerLimitNode);

impl OnPreferenceChange for NodeListener<'_> {
    fn on_preference_change(&self, key: &str, new_value: bool) -> bool {
        if key == PREF_POWER_LIMIT {
            return self.0.on_toggle(new_value);
        }
        false
    }
}
