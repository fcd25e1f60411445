use anyhow::Result;

use bulletin_core::AppConfig;

pub fn path() -> Result<()> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

pub fn init(force: bool) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() && !force {
        println!("Config already exists: {}", path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    AppConfig::default().save()?;
    println!("Wrote default config to {}", path.display());
    println!("Secrets can stay in the environment: NEWS_API_KEY, EMAIL_USER, EMAIL_PASSWORD.");
    Ok(())
}
