use clap::{Parser, Subcommand};
use futures_util::stream::StreamExt;
use log::info;
use rune_bridge::config::{Config, Paths};
use rune_bridge::dbus::DbusTransport;
use rune_bridge::dispatch::{parse_state_tag, press_play_pause_confirmed};
use rune_bridge::export::{export_tracks, ExportFormat};
use rune_bridge::fetch::{
    fetch_collection_group_summary, fetch_collection_groups, fetch_playback_status,
};
use rune_bridge::library::Library;
use rune_bridge::logging::start_stderr_logger;
use rune_bridge::scan::scan_library;
use rune_bridge::signals::{
    CollectionType, NextRequest, PauseRequest, PlayRequest, PlaybackMode, PlaybackStatus,
    PreviousRequest, Request, SetPlaybackModeRequest, StopRequest,
};
use rune_bridge::{App, SignalBridge};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;

type StdResult<T> = std::result::Result<T, App>;

#[derive(Parser)]
#[command(
    name = "rctl",
    about = "Control the runed player backend.",
    version = "1.0.0"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start runed")]
    Start,

    #[command(about = "Shut runed down")]
    Quit,

    #[command(about = "Resume playback")]
    Play,

    #[command(about = "Pause playback")]
    Pause,

    #[command(about = "Press the play/pause button")]
    Toggle(ToggleCommand),

    #[command(about = "Stop playback")]
    Stop,

    #[command(about = "Play the next track")]
    Next,

    #[command(about = "Play the previous track")]
    Previous,

    #[command(about = "Set the playback mode")]
    Mode(ModeCommand),

    #[command(about = "Show the playback status")]
    Status,

    #[command(about = "Show the group summary of a collection type")]
    Summary(SummaryCommand),

    #[command(about = "List the collections in some groups")]
    Groups(GroupsCommand),

    #[command(about = "Print playback status changes as they happen")]
    Watch(WatchCommand),

    #[command(about = "Build the library from the audio files under a directory")]
    Scan(ScanCommand),

    #[command(about = "Write the play queue or one collection to a JSON or M3U8 file")]
    Export(ExportCommand),
}

#[derive(Parser)]
struct ToggleCommand {
    #[arg(short = 's', long = "state", help = "Playback state tag to act on instead of asking runed")]
    state: Option<String>,
    #[arg(short = 'd', long = "disabled", help = "Press the button while it is disabled")]
    disabled: bool,
}

#[derive(Parser)]
struct ModeCommand {
    #[arg(short = 'l', long = "loop", action = clap::ArgAction::SetTrue, help = "Loop over the queue")]
    loop_mode: bool,
    #[arg(short = 's', long = "shuffle", action = clap::ArgAction::SetTrue, help = "Pick tracks at random")]
    shuffle_mode: bool,
    #[arg(short = 'r', long = "repeat", action = clap::ArgAction::SetTrue, help = "Repeat the current track")]
    repeat_mode: bool,
}

#[derive(Parser)]
struct SummaryCommand {
    #[arg(help = "album, artist, directory or playlist")]
    collection_type: String,
}

#[derive(Parser)]
struct GroupsCommand {
    #[arg(help = "album, artist, directory or playlist")]
    collection_type: String,
    #[arg(required = true, help = "Group titles, as shown by `rctl summary`")]
    titles: Vec<String>,
}

#[derive(Parser)]
struct WatchCommand {
    #[arg(short = 'n', long = "count", help = "Exit after this many changes")]
    count: Option<usize>,
}

#[derive(Parser)]
struct ScanCommand {
    #[arg(help = "Root directory of the music collection")]
    root: PathBuf,
    #[arg(short = 'o', long = "output", help = "Library file to write instead of the configured one")]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct ExportCommand {
    #[arg(help = "album, artist, directory or playlist; the whole queue when left out", requires = "name")]
    collection_type: Option<String>,
    #[arg(help = "Collection name, as shown by `rctl groups`")]
    name: Option<String>,
    #[arg(short = 'f', long = "format", default_value = "m3u8", help = "json or m3u8")]
    format: String,
    #[arg(short = 'o', long = "output", help = "Output file; relative paths start at the library root")]
    output: PathBuf,
}

struct Session {
    bridge: SignalBridge,
    transport: Arc<DbusTransport>,
    config: Config,
}

impl Session {
    async fn request<R: Request>(&self, request: &R) -> StdResult<R::Response> {
        match self.config.request_timeout {
            Some(timeout) => self.bridge.request_timeout(request, timeout).await,
            None => self.bridge.request(request).await,
        }
    }
}

#[tokio::main]
async fn main() -> StdResult<()> {
    let cli = Cli::parse();
    let _logger = start_stderr_logger("warn")?;
    let config = Config::load(&Paths::from_env()?).await?;

    // These work on the library file and don't need runed.
    let command = match cli.command {
        Commands::Scan(scan_cmd) => return handle_scan_command(scan_cmd, &config).await,
        Commands::Export(export_cmd) => return handle_export_command(export_cmd, &config).await,
        command => command,
    };

    let (transport, inbound) = DbusTransport::connect(config.channel_capacity).await?;
    let transport = Arc::new(transport);
    let bridge = SignalBridge::new(transport.clone(), config.channel_capacity);
    bridge.attach(inbound);

    let session = Session {
        bridge,
        transport,
        config,
    };
    handle_command(command, &session).await
}

async fn handle_command(command: Commands, session: &Session) -> StdResult<()> {
    if matches!(command, Commands::Start) {
        return start_runed(session).await;
    }
    if !is_runed_running(session).await {
        eprintln!("runed is not running");
        return Ok(());
    }
    match command {
        Commands::Start | Commands::Scan(_) | Commands::Export(_) => Ok(()),
        Commands::Quit => {
            session.transport.stop_daemon().await?;
            println!("runed has exited");
            Ok(())
        }
        Commands::Play => {
            print_status(&session.request(&PlayRequest).await?);
            Ok(())
        }
        Commands::Pause => {
            print_status(&session.request(&PauseRequest).await?);
            Ok(())
        }
        Commands::Toggle(toggle_cmd) => handle_toggle_command(toggle_cmd, session).await,
        Commands::Stop => {
            print_status(&session.request(&StopRequest).await?);
            Ok(())
        }
        Commands::Next => {
            print_status(&session.request(&NextRequest).await?);
            Ok(())
        }
        Commands::Previous => {
            print_status(&session.request(&PreviousRequest).await?);
            Ok(())
        }
        Commands::Mode(mode_cmd) => handle_mode_command(mode_cmd, session).await,
        Commands::Status => {
            print_status(&wait_for(session, fetch_playback_status(&session.bridge)).await?);
            Ok(())
        }
        Commands::Summary(summary_cmd) => {
            handle_summary_command(summary_cmd.collection_type.parse()?, session).await
        }
        Commands::Groups(groups_cmd) => handle_groups_command(groups_cmd, session).await,
        Commands::Watch(watch_cmd) => handle_watch_command(watch_cmd, session).await,
    }
}

async fn handle_toggle_command(toggle_cmd: ToggleCommand, session: &Session) -> StdResult<()> {
    let bridge = &session.bridge;
    let (state, disabled) = match toggle_cmd.state {
        Some(tag) => (parse_state_tag(&tag)?, toggle_cmd.disabled),
        None => {
            let status = wait_for(session, fetch_playback_status(bridge)).await?;
            (status.state, toggle_cmd.disabled || status.queue_len == 0)
        }
    };
    match wait_for(session, press_play_pause_confirmed(bridge, state, disabled)).await? {
        Some(status) => {
            info!("Pressed play/pause in state {state}");
            print_status(&status);
        }
        None => println!("The play/pause button is disabled"),
    }
    Ok(())
}

async fn handle_mode_command(mode_cmd: ModeCommand, session: &Session) -> StdResult<()> {
    let mode = if mode_cmd.loop_mode {
        PlaybackMode::Loop
    } else if mode_cmd.shuffle_mode {
        PlaybackMode::Shuffle
    } else if mode_cmd.repeat_mode {
        PlaybackMode::Repeat
    } else {
        eprintln!("No playback mode given");
        return Ok(());
    };
    print_status(&session.request(&SetPlaybackModeRequest { mode }).await?);
    Ok(())
}

async fn handle_summary_command(collection_type: CollectionType, session: &Session) -> StdResult<()> {
    let groups = wait_for(
        session,
        fetch_collection_group_summary(&session.bridge, collection_type),
    )
    .await?;
    if groups.is_empty() {
        println!("No {collection_type:?} collections");
    }
    for group in groups {
        println!("{:<4}{}", group.group_title, group.count);
    }
    Ok(())
}

async fn handle_groups_command(groups_cmd: GroupsCommand, session: &Session) -> StdResult<()> {
    let collection_type = groups_cmd.collection_type.parse()?;
    let groups = wait_for(
        session,
        fetch_collection_groups(&session.bridge, collection_type, groups_cmd.titles),
    )
    .await?;
    for group in groups {
        println!("[{}]", group.group_title);
        for collection in group.collections {
            println!("  {} ({} tracks)", collection.name, collection.track_count);
        }
    }
    Ok(())
}

async fn handle_watch_command(watch_cmd: WatchCommand, session: &Session) -> StdResult<()> {
    let updates = session.bridge.subscribe::<PlaybackStatus>().into_stream();
    let mut updates = match watch_cmd.count {
        Some(count) => updates.take(count).boxed(),
        None => updates.boxed(),
    };
    while let Some(status) = updates.next().await {
        print_status(&status?);
    }
    Ok(())
}

/// Bounds `future` by the configured request timeout.
async fn wait_for<T>(
    session: &Session,
    future: impl std::future::Future<Output = StdResult<T>>,
) -> StdResult<T> {
    match session.config.request_timeout {
        Some(timeout) => tokio::time::timeout(timeout, future)
            .await
            .map_err(|_| App::Timeout(timeout))?,
        None => future.await,
    }
}

fn print_status(status: &PlaybackStatus) {
    let track = match (&status.index, &status.title) {
        (Some(index), Some(title)) => format!("{title} [{}/{}]", index + 1, status.queue_len),
        _ => "nothing queued".to_string(),
    };
    println!("{} ({:?}): {}", status.state, status.mode, track);
}

async fn handle_scan_command(scan_cmd: ScanCommand, config: &Config) -> StdResult<()> {
    let output = scan_cmd.output.unwrap_or_else(|| config.library.clone());
    let mut library = scan_library(&scan_cmd.root).await?;
    if let Ok(previous) = Library::load_from_file(&output).await {
        library.adopt_playlists(&previous);
    }
    library.save_to_file(&output).await?;
    println!(
        "Library scanned: {} tracks written to {}",
        library.tracks.len(),
        output.display()
    );
    println!("Restart runed to play them");
    Ok(())
}

async fn handle_export_command(export_cmd: ExportCommand, config: &Config) -> StdResult<()> {
    let format: ExportFormat = export_cmd.format.parse()?;
    let library = Library::load_from_file(&config.library).await?;
    let tracks = match (&export_cmd.collection_type, &export_cmd.name) {
        (Some(collection_type), Some(name)) => {
            library.collection_tracks(collection_type.parse::<CollectionType>()?, name)
        }
        _ => library.tracks.iter().collect(),
    };
    if tracks.is_empty() {
        eprintln!("Nothing to export");
        return Ok(());
    }

    let output = match &library.root {
        Some(root) => root.join(&export_cmd.output),
        None => export_cmd.output.clone(),
    };
    let written = export_tracks(&library, &tracks, format, &output).await?;
    if written != output {
        eprintln!(
            "Warning: Output file extension corrected to .{}",
            format.extension()
        );
    }
    println!("{} tracks saved to {}", tracks.len(), written.display());
    Ok(())
}

async fn is_runed_running(session: &Session) -> bool {
    session.transport.test_connection().await.is_ok()
}

async fn start_runed(session: &Session) -> StdResult<()> {
    if is_runed_running(session).await {
        println!("runed is already running");
        return Ok(());
    }

    let current_exe_path = std::env::current_exe()?;
    let exe_dir = current_exe_path.parent().ok_or_else(|| {
        App::InvalidInput("Failed to get the directory of the executable".to_string())
    })?;
    let runed_path = exe_dir.join("runed");

    if !runed_path.exists() {
        return Err(App::InvalidInput(
            "runed executable not found in the same directory".to_string(),
        ));
    }

    let child = Command::new(runed_path).spawn().map_err(App::Io)?;
    println!("runed started, process ID: {:?}", child.id());
    Ok(())
}
