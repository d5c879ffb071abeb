use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Upload,
    Instagram,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Upload, Tab::Instagram];

    /// The `data-tab` identifier, shared by the tab and its content pane.
    pub fn id(&self) -> &'static str {
        match self {
            Tab::Upload => "upload",
            Tab::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| format!("unknown tab: {}", s))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TabElement {
    pub tab: Tab,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContentPane {
    pub id: &'static str,
    pub active: bool,
}

/// Tab strip plus content panes. Exactly one of each is active at a time,
/// and the two share an identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct TabBar {
    tabs: Vec<TabElement>,
    panes: Vec<ContentPane>,
}

impl Default for TabBar {
    fn default() -> Self {
        let mut bar = Self {
            tabs: Tab::ALL
                .iter()
                .map(|&tab| TabElement { tab, active: false })
                .collect(),
            panes: Tab::ALL
                .iter()
                .map(|t| ContentPane {
                    id: t.id(),
                    active: false,
                })
                .collect(),
        };
        bar.select(Tab::Upload);
        bar
    }
}

impl TabBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, tab: Tab) {
        for t in &mut self.tabs {
            t.active = false;
        }
        for p in &mut self.panes {
            p.active = false;
        }
        for t in &mut self.tabs {
            if t.tab == tab {
                t.active = true;
            }
        }
        for p in &mut self.panes {
            if p.id == tab.id() {
                p.active = true;
            }
        }
    }

    pub fn tabs(&self) -> &[TabElement] {
        &self.tabs
    }

    pub fn panes(&self) -> &[ContentPane] {
        &self.panes
    }

    pub fn active(&self) -> Tab {
        self.tabs
            .iter()
            .find(|t| t.active)
            .map(|t| t.tab)
            .unwrap_or(Tab::Upload)
    }
}
