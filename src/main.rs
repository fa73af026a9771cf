use anyhow::Result;
use floating_text::{overlay, OverlayConfig, TextList};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let loaded = TextList::load();
    match &loaded.source {
        Some(path) => log::info!(
            "{} line(s) to show from {}",
            loaded.texts.len(),
            path.display()
        ),
        None => log::info!("Showing placeholder, no text file was readable"),
    }

    overlay::run(OverlayConfig::default(), loaded.texts)
}
