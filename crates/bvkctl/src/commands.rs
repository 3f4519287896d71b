//! Command implementations.
//!
//! Every command opens the store directly; no daemon required. The
//! database path comes from --db when given, otherwise the config file.

use anyhow::{anyhow, Result};
use chrono::Utc;
use console::Emoji;
use owo_colors::OwoColorize;
use std::path::PathBuf;

use bvk_common::config::{self, Config};
use bvk_common::levels::LevelProgress;
use bvk_common::store::NewUser;
use bvk_common::{auth, seed, Store};

const THIN_SEP: &str = "------------------------------------------------------------";

// Accents with plain-terminal fallbacks
static STAR: Emoji<'_, '_> = Emoji("⭐ ", "");
static FLAME: Emoji<'_, '_> = Emoji("🔥 ", "");

fn open_store(db: Option<String>) -> Result<Store> {
    let path = match db {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(&Config::load().database.path),
    };
    Store::open(&path)
}

/// Write the default config and create the database with its schema
/// and achievement catalog
pub fn init(db: Option<String>) -> Result<()> {
    let config_path = config::user_config_path();
    let path_str = config_path.to_string_lossy();
    if config_path.exists() {
        println!("Config already present at {}", path_str);
    } else {
        Config::save_default(&path_str)?;
        println!("Wrote default config to {}", path_str);
    }

    let store = open_store(db)?;
    let badges = store.achievement_catalog()?.len();
    println!("Database ready at {}", store.path().display());
    println!("Achievement catalog: {} badges", badges);
    println!();
    println!("  Use 'bvkctl seed' to install the demo content.");
    Ok(())
}

/// Install the demo learning path and scenario templates
pub fn seed(db: Option<String>) -> Result<()> {
    let store = open_store(db)?;
    let report = seed::install_demo_content(&store)?;

    if report.is_empty() {
        println!("Demo content already installed, nothing to do.");
        return Ok(());
    }

    println!("{}", "Demo content installed".bold());
    println!("  Paths:      {}", report.paths);
    println!("  Lessons:    {}", report.lessons);
    println!("  Quizzes:    {}", report.quizzes);
    println!("  Scenarios:  {}", report.scenarios);
    println!("  Products:   {}", report.products);
    println!("  Events:     {}", report.events);
    Ok(())
}

pub fn create_user(
    db: Option<String>,
    username: String,
    email: String,
    password: String,
    parent: bool,
    age: Option<i64>,
) -> Result<()> {
    let store = open_store(db)?;
    let password_hash = auth::hash_password(&password)?;
    let reg = store.register_user(
        NewUser {
            username,
            email,
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            age,
            parent_name: String::new(),
            parent_email: String::new(),
            parent_phone: String::new(),
            is_parent: parent,
        },
        Utc::now(),
    )?;

    let kind = if parent { "parent" } else { "child" };
    println!(
        "Created {} account {} (id {})",
        kind,
        reg.user.username.bold(),
        reg.user.id
    );
    Ok(())
}

pub fn link_child(db: Option<String>, parent: String, child: String) -> Result<()> {
    let store = open_store(db)?;
    let parent_user = store
        .get_user_by_username(&parent)?
        .ok_or_else(|| anyhow!("no such user: {}", parent))?;
    let child_user = store.add_child(parent_user.id, &child)?;
    println!(
        "Linked {} under {}",
        child_user.username.bold(),
        parent_user.username.bold()
    );
    Ok(())
}

/// Colored progression card for one user
pub fn stats(db: Option<String>, username: String) -> Result<()> {
    let store = open_store(db)?;
    let user = store
        .get_user_by_username(&username)?
        .ok_or_else(|| anyhow!("no such user: {}", username))?;
    let overview = store.profile_overview(user.id)?;
    let progress = LevelProgress::from_points(overview.profile.total_points);

    println!();
    println!("  {}{}", STAR, overview.user.display_name().bold());
    println!("{}", THIN_SEP);
    println!();

    println!("{}", "[PROGRESSION]".cyan());
    println!("  Level:    {}  {}", progress.level, level_bar(&progress));
    println!("  Points:   {}", progress.total_points);
    println!("  Coins:    {}", overview.profile.coins.yellow());
    match &overview.streak {
        Some(s) => println!(
            "  Streak:   {}{} days (best {})",
            FLAME, s.current_streak, s.longest_streak
        ),
        None => println!("  Streak:   no activity yet"),
    }
    println!();

    println!("{}", "[LEARNING]".cyan());
    println!(
        "  Lessons completed:    {}",
        overview.counts.completed_lessons
    );
    println!(
        "  Lessons in progress:  {}",
        overview.counts.in_progress_lessons
    );
    println!(
        "  Scenarios completed:  {}",
        overview.counts.completed_scenarios
    );
    println!("  Certificates:         {}", overview.counts.certificates);
    println!();

    println!("{}", "[BADGES]".cyan());
    if overview.earned.is_empty() {
        println!("  No badges yet.");
    } else {
        for earned in &overview.earned {
            println!(
                "  {} {} ({})",
                earned.achievement.icon,
                earned.achievement.name.bold(),
                earned.earned_at.format("%Y-%m-%d")
            );
        }
    }
    println!();
    println!("{}", THIN_SEP);
    println!();
    Ok(())
}

/// Twenty-slot progress bar for the current level band
fn level_bar(progress: &LevelProgress) -> String {
    const WIDTH: usize = 20;
    let filled = (progress.percent as usize * WIDTH) / 100;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(WIDTH - filled));
    match progress.next_level_at {
        Some(next) => format!("[{}] {}% to {}", bar.green(), progress.percent, next),
        None => format!("[{}] max level", bar.green()),
    }
}
