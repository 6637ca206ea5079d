use anyhow::{Context, Result};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use oneclick::{default_game_dir, installer, InstallReport, Installer, Status};
use std::path::PathBuf;
use std::time::Duration;

pub fn run(dir: Option<PathBuf>, slug: Option<String>) -> Result<()> {
    let config = super::load_config(slug)?;

    let game_dir = match dir {
        Some(dir) => dir,
        None => default_game_dir().context(
            "No launcher directory found for this system. Pass the game directory with --dir",
        )?,
    };
    if !game_dir.is_dir() {
        anyhow::bail!("Game directory does not exist: {}", game_dir.display());
    }

    let installer = Installer::from_config(&config)?;
    println!();
    println!(
        "📦 Installing {} into {}",
        installer.packages().slug(),
        game_dir.display()
    );
    println!();

    let handle = installer::spawn(installer, game_dir)?;
    let bar = create_progress_bar();

    let mut seen = 0;
    loop {
        match handle.status().wait_newer(seen, Duration::from_millis(100)) {
            Some(status) => {
                seen = status.seq;
                render(&bar, &status);
            }
            None if handle.is_finished() => break,
            None => {}
        }
    }

    match handle.join() {
        Ok(report) => {
            bar.finish_with_message(format!("✓ Installed {}", report.pack_name));
            print_summary(&report);
            Ok(())
        }
        Err(failure) => {
            bar.abandon_with_message(format!("✗ {}", failure));
            Err(failure.into())
        }
    }
}

fn create_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(1);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(
            style
                .progress_chars("=> ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn render(bar: &ProgressBar, status: &Status) {
    if status.total > 0 {
        bar.set_length(status.total);
        bar.set_position(status.current);
    }
    bar.set_message(status.message.clone());
}

fn print_summary(report: &InstallReport) {
    println!();
    println!("✅ {} {} is ready", report.pack_name, report.pack_version);
    println!(
        "   Minecraft {} with Fabric Loader {}",
        report.game_version, report.loader_version
    );
    println!(
        "   {} mod file(s) downloaded, {} server-only skipped",
        report.downloaded.len(),
        report.skipped.len()
    );
    println!("   {} downloaded", HumanBytes(report.downloaded_bytes));
    println!("   {} override file(s) unpacked", report.overrides.len());
    if report.has_pack_icon() {
        println!("   Icon: bundled icon.png");
    } else {
        println!("   Icon: {}", report.icon);
    }
    println!();
    println!(
        "Select the \"{}\" profile in the launcher to play.",
        report.pack_name
    );
    println!();
}
