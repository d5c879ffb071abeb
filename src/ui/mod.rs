//! Headless model of the detector page.
//!
//! The page has a theme toggle, two tabs (upload and Instagram) and one
//! result panel per tab. [`page::Page`] owns the state and reacts to the same
//! events a browser page would: clicks, drops and file choices.

pub mod page;
pub mod render;
pub mod storage;
pub mod tabs;
pub mod theme;

pub use page::{FlowPanel, Page, PageState};
pub use render::{render, Flow, RenderedResult, ResultPanel};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use tabs::{Tab, TabBar};
pub use theme::{Theme, ThemeController};
