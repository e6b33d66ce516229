use log::{error, info, warn};
use rune_bridge::backend::Backend;
use rune_bridge::config::{Config, Paths};
use rune_bridge::dbus::run_dbus_server;
use rune_bridge::library::Library;
use rune_bridge::logging::start_file_logger;
use rune_bridge::signals::PlaybackMode;
use rune_bridge::App;
use std::path::Path;
use tokio::fs;
use tokio::sync::{mpsc, watch};
use tokio::task;

#[tokio::main]
async fn main() -> Result<(), App> {
    let paths = Paths::from_env()?;

    // Ensure all directories exist
    fs::create_dir_all(paths.log_dir()).await?;

    let config = Config::load(&paths).await?;

    // Check if library.toml exists, if not, create an empty one
    if !Path::new(&config.library).exists() {
        if let Some(parent) = config.library.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&config.library, "").await?;
    }

    let _logger = start_file_logger(&config.log_level, &paths.log_dir())?;

    let library = Library::load_from_file(&config.library).await?;
    if library.tracks.is_empty() {
        warn!("Library at {} is empty", config.library.display());
    }

    let (request_sender, request_receiver) = mpsc::channel(config.channel_capacity);
    let (response_sender, response_receiver) = mpsc::channel(config.channel_capacity);
    let (stop_sender, _stop_receiver) = watch::channel(());

    task::spawn(Backend::new(library, PlaybackMode::Loop, response_sender).run(request_receiver));

    let mut server = task::spawn(run_dbus_server(
        request_sender,
        response_receiver,
        stop_sender.clone(),
    ));

    let result = tokio::select! {
        result = &mut server => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            let _ = stop_sender.send(());
            server.await
        }
    };
    if let Err(e) = result? {
        error!("DBus server error: {}", e);
        return Err(e);
    }

    info!("runed exited");
    Ok(())
}
