//! `medsense` - CLI for medication reminders
//!
//! This binary manages the medication list and runs the reminder loop.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::{DateTime, Local, Utc};
use clap::Parser;

use medsense::cli::{
    AddCommand, CheckCommand, Cli, Command, ConfigCommand, NotificationsCommand, RunCommand,
};
use medsense::dispatch::recording::RecordingChannel;
use medsense::permission::{record_consent, recorded_consent, TerminalPrompt};
use medsense::scheduler::scheduled_at;
use medsense::{
    init_logging, platform, AlertDispatcher, Config, Medication, PermissionGate, PermissionState,
    RecordStore, ReminderService, ScheduleTime, Storage, SystemClock,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Run(cmd) => handle_run(&config, &cmd),
        Command::Add(cmd) => handle_add(&config, cmd),
        Command::List(cmd) => handle_list(&config, cmd.json),
        Command::Show(cmd) => handle_show(&config, &cmd.id, cmd.json),
        Command::Remove(cmd) => handle_remove(&config, &cmd.id),
        Command::Taken(cmd) => handle_taken(&config, &cmd.id),
        Command::Check(cmd) => handle_check(&config, &cmd),
        Command::Notifications(cmd) => handle_notifications(&config, cmd),
        Command::Export => handle_export(&config),
        Command::Import(cmd) => handle_import(&config, &cmd.file),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<RecordStore> {
    let path = config.database_path();
    let storage = Storage::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    Ok(RecordStore::open(storage, config.storage.slot_key.as_str())
        .with_dedupe_times(config.reminder.dedupe_times))
}

fn permission_state(config: &Config, storage: &Storage) -> anyhow::Result<PermissionState> {
    if !config.alerts.notifications_enabled {
        return Ok(PermissionState::Denied);
    }
    let consent = recorded_consent(storage).context("failed to read notification permission")?;
    Ok(PermissionState::resolve(
        platform::notifications_available(),
        consent,
    ))
}

fn find<'a>(store: &'a RecordStore, id: &str) -> anyhow::Result<&'a Medication> {
    store
        .get(id)
        .with_context(|| format!("no medication with id '{id}' (see 'medsense list')"))
}

fn format_local(when: DateTime<Utc>) -> String {
    when.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn handle_run(config: &Config, cmd: &RunCommand) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(interval) = cmd.interval {
        config.reminder.poll_interval_secs = interval;
        config.validate()?;
    }

    platform::init()?;
    let store = open_store(&config)?;
    let gate = PermissionGate::new(permission_state(&config, store.storage())?);
    let dispatcher = AlertDispatcher::from_config(&config.alerts);

    println!(
        "Watching {} medication(s) on {}. Press Ctrl-C to stop.",
        store.len(),
        platform::name()
    );

    let ask = !cmd.no_prompt
        && config.alerts.notifications_enabled
        && gate.needs_prompt()
        && std::io::stdin().is_terminal();
    let mut service = ReminderService::new(store, dispatcher, gate, SystemClock)
        .with_interval(config.poll_interval());
    if ask {
        service = service.with_prompt(Box::new(TerminalPrompt));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let stats = runtime.block_on(async {
        let handle = service.handle();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                handle.stop();
            }
        });
        service.run().await
    });
    // A permission prompt may still be waiting on stdin.
    runtime.shutdown_timeout(Duration::from_millis(100));

    println!(
        "Stopped after {} check(s); {} reminder(s) shown.",
        stats.polls, stats.delivered
    );
    Ok(())
}

fn handle_add(config: &Config, cmd: AddCommand) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let name = cmd.name.clone();
    let ids = store.add(vec![cmd.into()], Utc::now())?;
    for id in ids {
        println!("Added {name} ({id})");
    }
    Ok(())
}

fn handle_list(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(store.list())?);
        return Ok(());
    }

    if store.is_empty() {
        println!("No medications yet. Add one with 'medsense add'.");
        return Ok(());
    }

    let now = ScheduleTime::from_datetime(Local::now().naive_local());
    println!(
        "{:<32}  {:<20}  {:<12}  {:<16}  NEXT",
        "ID", "NAME", "DOSAGE", "TIMES"
    );
    for med in store.list() {
        let next = med
            .next_time_after(now)
            .map_or_else(|| "-".to_string(), |t| t.to_string());
        println!(
            "{:<32}  {:<20}  {:<12}  {:<16}  {next}",
            med.id,
            med.name,
            med.dosage,
            med.times.join(", ")
        );
    }
    Ok(())
}

fn handle_show(config: &Config, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let med = find(&store, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(med)?);
        return Ok(());
    }

    println!("{}", med.name);
    println!("{}", "=".repeat(med.name.chars().count().max(1)));
    println!("  Id:            {}", med.id);
    println!("  Dosage:        {}", med.dosage);
    if !med.frequency.is_empty() {
        println!("  Frequency:     {}", med.frequency);
    }
    println!("  Times:         {}", med.times.join(", "));
    if !med.explanation.is_empty() {
        println!("  What it's for: {}", med.explanation);
    }
    if !med.side_effects.is_empty() {
        println!("  Side effects:  {}", med.side_effects);
    }
    println!(
        "  Last taken:    {}",
        med.last_taken.map_or_else(|| "never".to_string(), format_local)
    );
    println!("  Added:         {}", format_local(med.created_at));
    Ok(())
}

fn handle_remove(config: &Config, id: &str) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    find(&store, id)?;
    let removed = store.remove(id)?;
    println!("Removed {}", removed.name);
    Ok(())
}

fn handle_taken(config: &Config, id: &str) -> anyhow::Result<()> {
    let mut store = open_store(config)?;
    let name = find(&store, id)?.name.clone();
    let now = Utc::now();
    store.mark_taken(id, now)?;
    println!("Marked {name} as taken at {}", format_local(now));
    Ok(())
}

fn handle_check(config: &Config, cmd: &CheckCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let now = Local::now().naive_local();
    let at = match cmd.at {
        Some(time) => now
            .date()
            .and_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)
            .context("invalid check time")?,
        None => now,
    };

    let due: Vec<_> = scheduled_at(at, store.list()).collect();
    let minute = ScheduleTime::from_datetime(at);
    if due.is_empty() {
        println!("Nothing due at {minute}.");
        return Ok(());
    }

    let notifications = PermissionGate::new(permission_state(config, store.storage())?)
        .notifications_enabled();
    let native = RecordingChannel::new("notification");
    let fallback = RecordingChannel::new("dialog");
    let dispatcher = AlertDispatcher::new(Box::new(native.clone()), Box::new(fallback.clone()));

    println!("Due at {minute}:");
    for (med, time) in due {
        dispatcher.dispatch(med, time, notifications);
    }
    for reminder in native.delivered() {
        println!("  [notification] {}: {}", reminder.title(), reminder.body());
    }
    for reminder in fallback.delivered() {
        println!("  [dialog] {}", reminder.fallback_text());
    }
    Ok(())
}

fn handle_notifications(config: &Config, cmd: NotificationsCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let storage = store.storage();
    let available = platform::notifications_available();

    match cmd {
        NotificationsCommand::Status => {
            let consent = recorded_consent(storage)?;
            let effective = permission_state(config, storage)?;
            println!("Platform:        {}", platform::name());
            println!("Backend:         {}", if available { "available" } else { "missing" });
            println!("Your choice:     {consent}");
            println!(
                "Configured:      {}",
                if config.alerts.notifications_enabled { "on" } else { "off" }
            );
            println!("Effective:       {effective}");
            if !available {
                println!();
                println!("{}", platform::notification_instructions());
            }
        }
        NotificationsCommand::Enable => {
            record_consent(storage, PermissionState::Granted)?;
            if available {
                println!("System notifications enabled.");
            } else {
                println!("Permission recorded, but no notification backend was found.");
                println!();
                println!("{}", platform::notification_instructions());
            }
            if !config.alerts.notifications_enabled {
                println!("Note: alerts.notifications_enabled is false in the configuration.");
            }
        }
        NotificationsCommand::Disable => {
            record_consent(storage, PermissionState::Denied)?;
            println!("System notifications disabled; reminders will use a dialog.");
        }
    }
    Ok(())
}

fn handle_export(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    println!("{}", store.export()?);
    Ok(())
}

fn handle_import(config: &Config, file: &std::path::Path) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut store = open_store(config)?;
    let count = store
        .import(&json)
        .with_context(|| format!("{} is not a medication list", file.display()))?;
    println!("Imported {count} medication(s).");
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let storage = store.storage();
    let stats = storage.stats()?;
    let updated = storage.slot_updated_at(&config.storage.slot_key)?;
    let permission = permission_state(config, storage)?;
    let audio = cfg!(feature = "audio");

    if json {
        let status = serde_json::json!({
            "platform": platform::name(),
            "database_path": storage.path(),
            "database_size_bytes": stats.db_size_bytes,
            "medications": store.len(),
            "last_saved": updated,
            "notifications": permission.as_str(),
            "tone": config.alerts.tone_enabled && audio,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("medsense status");
        println!("---------------");
        println!("Platform:      {}", platform::name());
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Medications:   {}", store.len());
        println!(
            "Last saved:    {}",
            updated.map_or_else(|| "never".to_string(), format_local)
        );
        println!("Notifications: {permission}");
        println!(
            "Tone:          {}",
            match (config.alerts.tone_enabled, audio) {
                (false, _) => "off",
                (true, true) => "on",
                (true, false) => "unavailable (built without audio)",
            }
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
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
                println!("  Slot key:           {}", config.storage.slot_key);
                println!();
                println!("[Reminder]");
                println!(
                    "  Poll interval:      {}s",
                    config.reminder.poll_interval_secs
                );
                println!("  Dedupe times:       {}", config.reminder.dedupe_times);
                println!();
                println!("[Alerts]");
                println!(
                    "  Notifications:      {}",
                    config.alerts.notifications_enabled
                );
                println!(
                    "  Icon:               {}",
                    config.alerts.notification_icon.as_deref().unwrap_or("-")
                );
                println!("  Tone:               {}", config.alerts.tone_enabled);
                println!(
                    "  Tone shape:         {} Hz, amplitude {}, {} ms",
                    config.alerts.tone_frequency_hz,
                    config.alerts.tone_amplitude,
                    config.alerts.tone_duration_ms
                );
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
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
