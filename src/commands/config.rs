use anyhow::Result;
use oneclick::Config;

pub fn run(action: &crate::ConfigAction) -> Result<()> {
    use crate::ConfigAction;

    match action {
        ConfigAction::Show => show_config(),
        ConfigAction::Set { key, value } => set_config(key, value),
        ConfigAction::Path => {
            println!("{}", Config::default_path()?.display());
            Ok(())
        }
    }
}

const KEYS: &[&str] = &[
    "modpack.slug",
    "hosts.package_url",
    "hosts.loader_url",
    "loader.name",
    "loader.fallback_version",
    "download.attempts",
    "download.backoff_ms",
    "download.timeout_secs",
    "download.verify_hashes",
    "profile.java_args",
    "profile.fallback_icon",
];

fn show_config() -> Result<()> {
    let config = Config::load()?;
    let config_path = Config::default_path()?;

    println!();
    println!("OneClick Configuration");
    println!("  Config file: {}", config_path.display());
    println!();

    println!("[modpack]");
    println!(
        "  slug              {}",
        config.modpack.slug.as_deref().unwrap_or("<not set>")
    );
    println!();

    println!("[hosts]");
    println!("  package_url       {}", config.hosts.package_url);
    println!("  loader_url        {}", config.hosts.loader_url);
    println!();

    println!("[loader]");
    println!("  name              {}", config.loader.name);
    println!("  fallback_version  {}", config.loader.fallback_version);
    println!();

    println!("[download]");
    println!("  attempts          {}", config.download.attempts);
    println!("  backoff_ms        {}", config.download.backoff_ms);
    println!("  timeout_secs      {}", config.download.timeout_secs);
    println!(
        "  verify_hashes     {}",
        format_bool(config.download.verify_hashes)
    );
    println!();

    println!("[profile]");
    println!("  java_args         {}", config.profile.java_args);
    println!("  fallback_icon     {}", config.profile.fallback_icon);
    println!();

    println!("Modify settings:");
    println!("   oneclick config set <key> <value>");
    println!();

    Ok(())
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "enabled"
    } else {
        "disabled"
    }
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;

    if let Err(e) = config.set(key, value) {
        eprintln!("Available keys:");
        for key in KEYS {
            eprintln!("  • {}", key);
        }
        return Err(e.into());
    }

    config.save()?;
    println!("✓ {} = \"{}\"", key, value);
    println!("Configuration saved");

    Ok(())
}
