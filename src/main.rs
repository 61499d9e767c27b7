// Week Grid Application
// Main entry point

use std::sync::Arc;

use anyhow::{anyhow, Result};

use week_grid::services::local_store::LocalStore;
use week_grid::services::notification::{DesktopNotificationSink, NoticeQueue};
use week_grid::services::remote::{EventService, HttpEventService, InMemoryEventService};
use week_grid::services::settings::{cache_path, SettingsService};
use week_grid::ui_egui::WeekGridApp;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    log::info!("Starting Week Grid");

    let settings_service = SettingsService::from_environment()?;
    let settings = settings_service.load()?;
    log::info!("Settings loaded from {}", settings_service.path().display());

    let store = match cache_path(&settings) {
        Some(path) => LocalStore::open(&path)?,
        None => {
            log::warn!("No data directory available, cache will not survive restarts");
            LocalStore::in_memory()?
        }
    };

    let service: Arc<dyn EventService> = match &settings.service_url {
        Some(url) => Arc::new(HttpEventService::new(url, settings.api_token.clone())?),
        None => {
            log::warn!("No service_url configured, events stay on this machine");
            Arc::new(InMemoryEventService::new())
        }
    };

    let notices = NoticeQueue::new();
    let notifier = Arc::new(DesktopNotificationSink::new(notices.clone(), settings.desktop_notifications));
    let app = WeekGridApp::new(settings, service, store, notices, notifier)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Week Grid"),
        ..Default::default()
    };

    eframe::run_native("Week Grid", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow!("Failed to run the week grid: {}", e))
}
