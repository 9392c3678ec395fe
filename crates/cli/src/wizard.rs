//! Interactive setup wizard for eldocs configuration

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use eldocs_core::{save_config, ConfigFile, ElementsConfig, DEFAULT_ELEMENTS_URL};
use indicatif::{ProgressBar, ProgressStyle};

/// Run the interactive setup wizard
pub async fn run_init_wizard() -> Result<()> {
    println!("🚀 Welcome to eldocs setup!\n");

    println!("This wizard will guide you through the configuration process.");
    println!("You will need:");
    println!("  1. Your Cloud Elements user secret");
    println!("  2. Your organization secret");
    println!("  3. Optionally, an element instance token\n");

    // Step 1: API base URL
    let base_url = prompt_base_url()?;

    // Step 2: Secrets
    let user_secret = prompt_secret("User secret")?;
    let organization_secret = prompt_secret("Organization secret")?;

    // Step 3: Optional element token
    let element_token = prompt_element_token()?;

    // Summary
    println!("\n📋 Configuration summary:");
    println!("  Base URL: {}", base_url);
    let secret_prefix: String = user_secret.chars().take(4).collect();
    println!("  User secret: {}...", secret_prefix);
    println!(
        "  Element token: {}",
        if element_token.is_some() { "set" } else { "(none)" }
    );

    // Confirmation
    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(false)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    let config = ConfigFile {
        elements: ElementsConfig {
            base_url,
            user_secret: Some(user_secret),
            organization_secret: Some(organization_secret),
            element_token,
        },
        logging: None,
    };

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Saving configuration...");

    save_config(&config)?;

    pb.inc(1);
    pb.finish_with_message("✅ Configuration saved!");

    println!("\n🎉 Setup complete!");
    println!("\nConfiguration saved to: ~/.config/eldocs/config.toml");
    println!("\nYou can now use eldocs:");
    println!("  $ eldocs ping");
    println!("  $ eldocs ls /");
    println!("  $ eldocs upload report.pdf /reports/report.pdf");

    Ok(())
}

/// Prompt for the API base URL
fn prompt_base_url() -> Result<String> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt("API base URL")
        .default(DEFAULT_ELEMENTS_URL.to_string())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Err("Base URL cannot be empty")
            } else if !input.starts_with("http") {
                Err("Base URL must start with http:// or https://")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get base URL: {}", e))
}

/// Prompt for a required secret
fn prompt_secret(label: &str) -> Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt(label)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Err("Secret cannot be empty")
            } else if input.len() < 8 {
                Err("Secret seems too short")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get {}: {}", label, e))
}

/// Prompt for the optional element instance token
fn prompt_element_token() -> Result<Option<String>> {
    let wanted = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Configure an element instance token?")
        .default(false)
        .interact()?;

    if !wanted {
        return Ok(None);
    }

    let token = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Element token")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.is_empty() {
                Err("Element token cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get element token: {}", e))?;

    Ok(Some(token))
}
