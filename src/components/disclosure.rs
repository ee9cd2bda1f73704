//! Show/hide behaviours: dropdowns, modals, confirmations, toggles,
//! accordions and tabs.

use super::{data_flag, data_parse, impl_any, Component, Dataset};

/// Open/closed menu. Mounted as `dropdown` or `mobileMenu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropdown {
    name: &'static str,
    pub open: bool,
}

impl Dropdown {
    pub fn new() -> Self {
        Self {
            name: "dropdown",
            open: false,
        }
    }

    pub fn mobile_menu() -> Self {
        Self {
            name: "mobileMenu",
            open: false,
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

impl Default for Dropdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Dropdown {
    fn name(&self) -> &'static str {
        self.name
    }

    impl_any!();
}

/// Dialog that locks page scrolling while open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modal {
    pub open: bool,
}

impl Modal {
    pub fn show(&mut self) {
        self.open = true;
    }

    pub fn hide(&mut self) {
        self.open = false;
    }

    pub fn toggle(&mut self) {
        if self.open {
            self.hide();
        } else {
            self.show();
        }
    }

    pub fn locks_scroll(&self) -> bool {
        self.open
    }
}

impl Component for Modal {
    fn name(&self) -> &'static str {
        "modal"
    }

    impl_any!();
}

type ConfirmAction = Box<dyn FnOnce()>;

/// Yes/no prompt holding the action to run on confirmation.
#[derive(Default)]
pub struct ConfirmDialog {
    pub open: bool,
    pub title: String,
    pub message: String,
    action: Option<ConfirmAction>,
}

impl std::fmt::Debug for ConfirmDialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmDialog")
            .field("open", &self.open)
            .field("title", &self.title)
            .field("message", &self.message)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

impl ConfirmDialog {
    pub fn show(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        action: impl FnOnce() + 'static,
    ) {
        self.title = title.into();
        self.message = message.into();
        self.action = Some(Box::new(action));
        self.open = true;
    }

    /// Runs the pending action at most once. Returns whether one ran.
    pub fn confirm(&mut self) -> bool {
        self.open = false;
        match self.action.take() {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.action = None;
    }

    pub fn locks_scroll(&self) -> bool {
        self.open
    }
}

impl Component for ConfirmDialog {
    fn name(&self) -> &'static str {
        "confirmDialog"
    }

    impl_any!();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toggle {
    pub active: bool,
}

impl Toggle {
    /// `data-initial-state="true"` starts active.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            active: data_flag(dataset, "initial-state"),
        }
    }

    pub fn toggle(&mut self) {
        self.active = !self.active;
    }

    pub fn show(&mut self) {
        self.active = true;
    }

    pub fn hide(&mut self) {
        self.active = false;
    }
}

impl Component for Toggle {
    fn name(&self) -> &'static str {
        "toggle"
    }

    impl_any!();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accordion {
    open_items: Vec<usize>,
    allow_multiple: bool,
}

impl Accordion {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            open_items: Vec::new(),
            allow_multiple: data_flag(dataset, "allow-multiple"),
        }
    }

    pub fn allows_multiple(&self) -> bool {
        self.allow_multiple
    }

    pub fn toggle_item(&mut self, index: usize) {
        if self.is_open(index) {
            self.open_items.retain(|open| *open != index);
        } else if self.allow_multiple {
            self.open_items.push(index);
        } else {
            self.open_items = vec![index];
        }
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open_items.contains(&index)
    }

    pub fn close_all(&mut self) {
        self.open_items.clear();
    }
}

impl Component for Accordion {
    fn name(&self) -> &'static str {
        "accordion"
    }

    impl_any!();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tabs {
    pub active: usize,
}

impl Tabs {
    /// `data-initial-tab`; anything unparsable starts at the first tab.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            active: data_parse(dataset, "initial-tab").unwrap_or(0),
        }
    }

    pub fn set_tab(&mut self, index: usize) {
        self.active = index;
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == index
    }

    pub fn next_tab(&mut self) {
        self.active += 1;
    }

    pub fn prev_tab(&mut self) {
        self.active = self.active.saturating_sub(1);
    }
}

impl Component for Tabs {
    fn name(&self) -> &'static str {
        "tabs"
    }

    impl_any!();
}
