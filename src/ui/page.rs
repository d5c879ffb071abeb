use base64::Engine as _;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use super::render::{render, Flow, ResultPanel, FILL_DELAY};
use super::storage::Storage;
use super::tabs::{Tab, TabBar};
use super::theme::{Theme, ThemeController};
use crate::client::{PredictionApi, SelectedFile};
use crate::prediction::Outcome;

pub const MSG_EMPTY_URL: &str = "Silakan masukkan URL Instagram.";

/// Loading indicator, error region, result panel and preview for one flow.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowPanel {
    pub loading: bool,
    pub error: Option<String>,
    pub result: ResultPanel,
    /// `None` is an empty `src`.
    pub preview_src: Option<String>,
}

impl FlowPanel {
    fn begin(&mut self) {
        self.loading = true;
        self.result.hide();
        self.error = None;
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadArea {
    pub dragover: bool,
}

/// Everything visible on the page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageState {
    pub theme: Theme,
    pub tabs: TabBar,
    pub upload_area: UploadArea,
    pub upload: FlowPanel,
    pub instagram_url: String,
    pub instagram: FlowPanel,
}

impl PageState {
    pub fn data_theme(&self) -> &'static str {
        self.theme.as_str()
    }

    pub fn theme_icon_class(&self) -> &'static str {
        self.theme.icon_class()
    }

    pub fn panel(&self, flow: Flow) -> &FlowPanel {
        match flow {
            Flow::Upload => &self.upload,
            Flow::Instagram => &self.instagram,
        }
    }

    fn panel_mut(&mut self, flow: Flow) -> &mut FlowPanel {
        match flow {
            Flow::Upload => &mut self.upload,
            Flow::Instagram => &mut self.instagram,
        }
    }
}

/// The detector page. Submissions may overlap; whichever response arrives
/// last decides what its panel shows.
pub struct Page<A: PredictionApi> {
    api: Arc<A>,
    theme: Mutex<ThemeController>,
    state: Arc<Mutex<PageState>>,
}

impl<A: PredictionApi + 'static> Page<A> {
    pub fn new(api: A, storage: Box<dyn Storage>) -> Self {
        let theme = ThemeController::load(storage);
        let state = PageState {
            theme: theme.theme(),
            tabs: TabBar::new(),
            upload_area: UploadArea::default(),
            upload: FlowPanel::default(),
            instagram_url: String::new(),
            instagram: FlowPanel::default(),
        };
        Self {
            api: Arc::new(api),
            theme: Mutex::new(theme),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> PageState {
        self.state.lock().expect("page state lock poisoned").clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut PageState) -> R) -> R {
        let mut state = self.state.lock().expect("page state lock poisoned");
        f(&mut state)
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = self.theme.lock().expect("theme lock poisoned").toggle();
        self.update(|s| s.theme = theme);
        theme
    }

    pub fn select_tab(&self, tab: Tab) {
        self.update(|s| s.tabs.select(tab));
    }

    pub fn drag_enter(&self) {
        self.update(|s| s.upload_area.dragover = true);
    }

    pub fn drag_leave(&self) {
        self.update(|s| s.upload_area.dragover = false);
    }

    pub async fn drop_files(&self, files: Vec<SelectedFile>) {
        self.update(|s| s.upload_area.dragover = false);
        if files.is_empty() {
            return;
        }
        self.submit_upload(files).await;
    }

    /// File picker `change`.
    pub async fn choose_files(&self, files: Vec<SelectedFile>) {
        self.submit_upload(files).await;
    }

    pub async fn submit_upload(&self, files: Vec<SelectedFile>) {
        let Some(file) = files.into_iter().next() else {
            return;
        };

        self.update(|s| s.upload.begin());
        debug!("[ai-or-human] Uploading {} ({} bytes)", file.name, file.bytes.len());

        match self.api.upload(&file).await {
            Ok(payload) => match payload.into_outcome() {
                Outcome::Reported(message) => self.update(|s| s.upload.fail(message)),
                Outcome::Classified(result) => {
                    self.show_result(Flow::Upload, &result);
                    self.show_local_preview(file).await;
                }
            },
            Err(e) => self.update(|s| s.upload.fail(format!("Error: {}", e))),
        }
    }

    pub fn set_instagram_url(&self, url: &str) {
        self.update(|s| s.instagram_url = url.to_string());
    }

    /// "Analyze" button on the Instagram tab.
    pub async fn analyze_instagram(&self) {
        let url = self.update(|s| s.instagram_url.trim().to_string());

        if url.is_empty() {
            self.update(|s| s.instagram.error = Some(MSG_EMPTY_URL.to_string()));
            return;
        }

        self.update(|s| s.instagram.begin());

        match self.api.instagram(&url).await {
            Ok(payload) => match payload.into_outcome() {
                Outcome::Reported(message) => self.update(|s| s.instagram.fail(message)),
                Outcome::Classified(result) => {
                    self.show_result(Flow::Instagram, &result);
                    let preview = result
                        .image_data
                        .as_deref()
                        .filter(|d| !d.is_empty())
                        .map(|d| format!("data:image/jpeg;base64,{}", d));
                    self.update(|s| s.instagram.preview_src = preview);
                }
            },
            Err(e) => self.update(|s| s.instagram.fail(format!("Error: {}", e))),
        }
    }

    fn show_result(&self, flow: Flow, result: &crate::prediction::PredictionResult) {
        let rendered = render(result);
        let generation = self.update(|s| {
            let panel = s.panel_mut(flow);
            panel.loading = false;
            panel.result.show(rendered)
        });

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(FILL_DELAY).await;
            let mut state = state.lock().expect("page state lock poisoned");
            state.panel_mut(flow).result.fill(generation);
        });
    }

    /// Builds the preview from the local bytes; nothing is fetched.
    async fn show_local_preview(&self, file: SelectedFile) {
        let encoded = tokio::task::spawn_blocking(move || {
            format!(
                "data:{};base64,{}",
                file.mime,
                base64::engine::general_purpose::STANDARD.encode(&file.bytes)
            )
        })
        .await;

        match encoded {
            Ok(src) => self.update(|s| s.upload.preview_src = Some(src)),
            Err(e) => warn!("[ai-or-human] Preview encoding failed: {:?}", e),
        }
    }
}
