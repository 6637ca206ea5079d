use anyhow::Result;
use oneclick::{loader, Installer};

/// Print what `install` would fetch. Nothing is written to disk.
pub fn run(slug: Option<String>) -> Result<()> {
    let config = super::load_config(slug)?;
    let installer = Installer::from_config(&config)?;

    let latest = installer.packages().latest_version()?;
    let loader_version = installer.loader().latest_loader_version();

    println!();
    println!("📦 {} ({})", latest.title, latest.slug);
    println!("   Version:        {}", latest.file.id);
    println!("   File:           {}", latest.file.filename);
    println!("   URL:            {}", latest.file.url);
    println!(
        "   Game versions:  {}",
        if latest.game_versions.is_empty() {
            "<none>".to_string()
        } else {
            latest.game_versions.join(", ")
        }
    );
    if let Some(icon) = &latest.icon_url {
        println!("   Icon:           {}", icon);
    }
    println!("   Loader:         {} {}", config.loader.name, loader_version);
    if let Ok(game_version) = latest.game_version() {
        println!(
            "   Profile:        {}",
            loader::profile_name(&config.loader.name, &loader_version, game_version)
        );
    }
    println!();
    println!("Latest = the first version listed by {}", config.hosts.package_url);
    println!();

    Ok(())
}
