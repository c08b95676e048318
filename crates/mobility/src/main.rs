//! `mobility` - CLI for the mobility preference and route stores.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::Receiver;
use tracing::debug;

use mobility::cli::{
    Cli, Command, ConfigCommand, DestinationsCommand, NavigateCommand, PrefsCommand,
    RoutesCommand,
};
use mobility::guidance::{braille_announcement, calibration_prompt};
use mobility::{
    begin_navigation, init_logging, BackupFile, Config, KeyValueStore, MemoryStore,
    NavigationRequest, PreferenceChange, PreferenceKey, Preferences, PreferencesStore, Route,
    RouteStore, RoutesChanged, SqliteStore,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;
    let ephemeral = cli.ephemeral;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Prefs(cmd) => {
            Session::open(&config, ephemeral)?.run(|s| handle_prefs(&config, &mut s.prefs, cmd))
        }
        Command::Routes(cmd) => {
            Session::open(&config, ephemeral)?.run(|s| handle_routes(&mut s.routes, cmd))
        }
        Command::Destinations(cmd) => {
            Session::open(&config, ephemeral)?.run(|s| handle_destinations(&mut s.prefs, cmd))
        }
        Command::Navigate(cmd) => Session::open(&config, ephemeral)?
            .run(|s| handle_navigate(s.prefs.preferences(), &mut s.routes, cmd)),
        Command::Calibrate => Session::open(&config, ephemeral)?.run(|s| {
            handle_calibrate(s.prefs.preferences());
            Ok(())
        }),
    }
}

/// Both stores over one backend, with their change feeds.
struct Session {
    prefs: PreferencesStore,
    routes: RouteStore,
    pref_changes: Receiver<PreferenceChange>,
    route_changes: Receiver<RoutesChanged>,
}

impl Session {
    fn open(config: &Config, ephemeral: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let backend = open_backend(config, ephemeral)?;
        let prefs = PreferencesStore::load(Arc::clone(&backend))?;
        let routes = RouteStore::load(backend)?;
        let pref_changes = prefs.subscribe();
        let route_changes = routes.subscribe();
        Ok(Self {
            prefs,
            routes,
            pref_changes,
            route_changes,
        })
    }

    /// Run one command, then log whatever it changed.
    fn run(mut self, command: impl FnOnce(&mut Self) -> CliResult) -> CliResult {
        command(&mut self)?;

        for change in self.pref_changes.try_iter() {
            debug!("Preference changed: {}", change.key);
        }
        for change in self.route_changes.try_iter() {
            debug!("Saved routes changed ({} now)", change.len);
        }
        Ok(())
    }
}

fn open_backend(
    config: &Config,
    ephemeral: bool,
) -> Result<Arc<dyn KeyValueStore>, Box<dyn std::error::Error>> {
    if ephemeral {
        debug!("Using in-memory storage");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = SqliteStore::open(config.database_path(), config.storage.wal)?;
    Ok(Arc::new(store))
}

fn handle_prefs(
    config: &Config,
    prefs: &mut PreferencesStore,
    cmd: PrefsCommand,
) -> CliResult {
    match cmd {
        PrefsCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(prefs.preferences())?);
            } else {
                print_preferences(prefs.preferences());
            }
        }
        PrefsCommand::Set { field, value } => {
            let key: PreferenceKey = field.parse()?;
            prefs.set_parsed(key, &value)?;
            println!("{key} updated.");
        }
        PrefsCommand::Clear { yes } => {
            if yes {
                prefs.clear_all_data()?;
                println!("All preferences cleared.");
            } else {
                println!("This will reset all preferences to defaults.");
                println!("Use --yes to confirm.");
            }
        }
        PrefsCommand::Backup { output } => {
            let file = BackupFile::capture(prefs);
            let json = file.to_json(config.backup.pretty)?;
            match output {
                Some(path) if path.as_os_str() == "-" => println!("{json}"),
                Some(path) => write_backup(&path, &json)?,
                None => {
                    let path = config
                        .backup_dir()
                        .join(BackupFile::file_name(file.exported_at));
                    write_backup(&path, &json)?;
                }
            }
        }
        PrefsCommand::Restore { file } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("reading backup {}", file.display()))?;
            let snapshot = BackupFile::parse(&json)?;
            let applied = prefs.restore(&snapshot)?;
            println!("Restored {applied} preference(s) from {}.", file.display());
        }
    }
    Ok(())
}

fn write_backup(path: &Path, json: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating backup directory {}", parent.display()))?;
        }
    }
    fs::write(path, json).with_context(|| format!("writing backup {}", path.display()))?;
    println!("Backup written to {}", path.display());
    Ok(())
}

fn print_preferences(p: &Preferences) {
    println!("Preferences");
    println!("===========");
    println!();
    println!("[Accessibility]");
    println!("  Text size:             {}", p.text_size.label());
    println!("  High contrast mode:    {}", p.high_contrast_mode);
    println!("  Haptic feedback:       {}", p.haptic_feedback);
    println!("  Audio assistance:      {}", p.use_audio_assistance);
    println!("  Braille input:         {}", p.enable_braille_input);
    println!();
    println!("[Audio]");
    println!("  Mute voice guidance:   {}", p.mute_voice_guidance);
    println!();
    println!("[Navigation]");
    println!("  Preferred route type:  {}", p.preferred_route_type.label());
    println!("  Auto-save routes:      {}", p.auto_save_routes);
    println!(
        "  Frequent destinations: {}",
        p.frequent_destinations.len()
    );
}

fn handle_routes(routes: &mut RouteStore, cmd: RoutesCommand) -> CliResult {
    match cmd {
        RoutesCommand::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(routes.routes())?);
            } else if routes.is_empty() {
                println!("No saved routes yet.");
            } else {
                for (i, route) in routes.routes().iter().enumerate() {
                    println!("{i:>3}  From: {}", route.from);
                    println!("     To:   {}", route.to);
                }
            }
        }
        RoutesCommand::Add { from, to } => {
            let route = Route::new(from, to);
            let shown = route.to_string();
            routes.save_route(route)?;
            println!("Saved {shown}");
        }
        RoutesCommand::Delete { indices } => {
            let removed = routes.delete_routes(indices)?;
            println!("Deleted {removed} route(s).");
        }
        RoutesCommand::Clear { yes } => {
            if yes {
                routes.clear_all()?;
                println!("All saved routes cleared.");
            } else {
                println!("This will delete all {} saved route(s).", routes.len());
                println!("Use --yes to confirm.");
            }
        }
    }
    Ok(())
}

fn handle_destinations(
    prefs: &mut PreferencesStore,
    cmd: DestinationsCommand,
) -> CliResult {
    match cmd {
        DestinationsCommand::List => {
            if prefs.frequent_destinations().is_empty() {
                println!("No frequent destinations.");
            }
            for (i, label) in prefs.frequent_destinations().iter().enumerate() {
                println!("{i:>3}  {label}");
            }
        }
        DestinationsCommand::Add { label } => {
            if prefs.add_frequent_destination(&label)? {
                println!("Added \"{label}\".");
            } else {
                println!("Destination must not be empty.");
            }
        }
        DestinationsCommand::Remove { indices } => {
            let removed = prefs.remove_frequent_destinations(indices)?;
            println!("Removed {removed} destination(s).");
        }
    }
    Ok(())
}

fn handle_navigate(
    prefs: &Preferences,
    routes: &mut RouteStore,
    cmd: NavigateCommand,
) -> CliResult {
    if let Some(announcement) = braille_announcement(prefs, true) {
        println!("[Announcement] {announcement}");
    }

    let request = NavigationRequest {
        from: cmd.from,
        to: cmd.to,
        save_route: cmd.save,
    };
    let outcome = begin_navigation(&request, prefs, routes)?;

    match outcome.route {
        Some(route) => {
            println!("Navigating {route}");
            println!("  Route type: {}", prefs.preferred_route_type.label());
            if outcome.saved {
                println!("  Route saved.");
            }
        }
        None => println!("Enter both a starting location and a destination."),
    }
    Ok(())
}

fn handle_calibrate(prefs: &Preferences) {
    let prompt = calibration_prompt(prefs);
    println!("{}", prompt.text);
    if let Some(speech) = prompt.speech {
        println!("[Speak] {speech}");
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  WAL mode:           {}", config.storage.wal);
                println!();
                println!("[Backup]");
                println!("  Directory:          {}", config.backup_dir().display());
                println!("  Pretty JSON:        {}", config.backup.pretty);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
