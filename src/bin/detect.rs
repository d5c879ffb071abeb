//! detect - terminal front-end for the ai-or-human page
//!
//! Reads one command per line from stdin and drives the page against a
//! running server:
//!
//!   theme                     toggle light/dark
//!   tab <upload|instagram>    switch tab
//!   upload <path>...          pick files (only the first is sent)
//!   drop <path>...            drag-and-drop files onto the upload area
//!   instagram <url>           enter a post URL and analyze it
//!   show                      print the current tab
//!   quit

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ai_or_human::client::{HttpApi, PredictionApi, SelectedFile};
use ai_or_human::ui::{FileStorage, Flow, Page, PageState, Tab};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

const DEFAULT_URL: &str = "http://localhost:5000";
const DEFAULT_STATE_FILE: &str = "./.ai-or-human.json";

fn print_usage() {
    eprintln!(
        "commands: theme | tab <upload|instagram> | upload <path>... | drop <path>... | instagram <url> | show | quit"
    );
}

fn describe(state: &PageState) -> String {
    let tab = state.tabs.active();
    let flow = match tab {
        Tab::Upload => Flow::Upload,
        Tab::Instagram => Flow::Instagram,
    };
    let panel = state.panel(flow);

    let mut out = format!("[theme: {}] [tab: {}]\n", state.data_theme(), tab);
    if tab == Tab::Instagram && !state.instagram_url.is_empty() {
        out.push_str(&format!("  url: {}\n", state.instagram_url));
    }
    if panel.loading {
        out.push_str("  loading...\n");
    }
    if let Some(error) = &panel.error {
        out.push_str(&format!("  error: {}\n", error));
    }
    if panel.result.shown {
        if let Some(r) = &panel.result.content {
            out.push_str(&format!("  {}\n", r.title));
            out.push_str(&format!("  confidence: {}\n", r.confidence_text));
            out.push_str(&format!("  - Manusia: {}\n", r.prob_human_text));
            out.push_str(&format!("  - AI: {}\n", r.prob_ai_text));
        }
    }
    if let Some(src) = &panel.preview_src {
        out.push_str(&format!("  preview: {} chars\n", src.len()));
    }
    out
}

async fn read_files(paths: &[&str]) -> Vec<SelectedFile> {
    let mut files = Vec::new();
    for p in paths {
        match SelectedFile::read(Path::new(p)).await {
            Ok(f) => files.push(f),
            Err(e) => eprintln!("cannot read {}: {}", p, e),
        }
    }
    files
}

/// Runs commands from `input` until EOF or `quit`, printing the page after
/// each one.
async fn run<A, R, W>(page: &Page<A>, input: R, out: &mut W) -> anyhow::Result<()>
where
    A: PredictionApi + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{}", describe(&page.snapshot()))?;
    out.flush()?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (command, rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();

        match command {
            "theme" => {
                page.toggle_theme();
            }
            "tab" => match args.first().map(|a| a.parse::<Tab>()) {
                Some(Ok(tab)) => page.select_tab(tab),
                Some(Err(e)) => eprintln!("{}", e),
                None => print_usage(),
            },
            "upload" => {
                page.select_tab(Tab::Upload);
                let files = read_files(&args).await;
                page.choose_files(files).await;
            }
            "drop" => {
                page.select_tab(Tab::Upload);
                page.drag_enter();
                let files = read_files(&args).await;
                page.drop_files(files).await;
            }
            "instagram" => {
                page.select_tab(Tab::Instagram);
                page.set_instagram_url(rest);
                page.analyze_instagram().await;
            }
            "show" => {}
            "quit" | "exit" => break,
            _ => {
                print_usage();
                continue;
            }
        }

        write!(out, "{}", describe(&page.snapshot()))?;
        out.flush()?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let base_url = std::env::var("AI_OR_HUMAN_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let state_file = std::env::var("AI_OR_HUMAN_STATE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE));

    let api = HttpApi::new(&base_url)?;
    let storage = FileStorage::open(&state_file)?;
    let page = Page::new(api, Box::new(storage));

    run(&page, BufReader::new(tokio::io::stdin()), &mut io::stdout()).await
}
