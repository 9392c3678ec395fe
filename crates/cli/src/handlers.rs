//! Command handlers for the eldocs CLI

use crate::wizard::run_init_wizard;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use eldocs_core::{
    get_config_path, load_config, validate_config, CloudFile, ConfigFile, ElementsConnector,
    EntryKind, FileSpec,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tabled::{Table, Tabled};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

/// Handle init command
pub async fn handle_init() -> Result<()> {
    run_init_wizard().await
}

/// Connector wired from the configuration file
fn build_connector(config: &ConfigFile) -> Result<ElementsConnector> {
    let authorization = config.elements.authorization().ok_or_else(|| {
        anyhow::anyhow!("Secrets not configured (run 'eldocs init')")
    })?;
    let mut connector = ElementsConnector::with_base_url(config.elements.base_url.clone());
    connector.set_authorization(Some(authorization));
    Ok(connector)
}

/// Attach the vendor failure detail the connector captured, if any
fn api_error(connector: &ElementsConnector, err: eldocs_core::Error) -> anyhow::Error {
    let info = connector.last_failure_information();
    if info.is_empty() {
        anyhow::Error::new(err)
    } else {
        anyhow::anyhow!("{err} - {info}")
    }
}

/// Handle config commands
pub async fn handle_config(action: &str) -> Result<()> {
    match action {
        "show" => {
            println!("Current configuration:");
            println!();

            let config = load_config()?;

            println!("Elements:");
            println!("  Base URL: {}", config.elements.base_url);
            println!(
                "  User secret: {}",
                mask_secret(config.elements.user_secret.as_deref())
            );
            println!(
                "  Organization secret: {}",
                mask_secret(config.elements.organization_secret.as_deref())
            );
            println!(
                "  Element token: {}",
                mask_secret(config.elements.element_token.as_deref())
            );

            Ok(())
        }
        "validate" => {
            println!("Validating configuration...");

            let config = load_config()?;

            validate_config(&config)?;
            println!("  ✅ Valid configuration format");

            println!("  Testing hub connection...");
            let connector = build_connector(&config)?;
            let pong = connector
                .ping()
                .await
                .map_err(|e| api_error(&connector, e))?;

            println!("  ✅ Hub answered: {}", pong);
            Ok(())
        }
        "edit" => {
            println!("Opening editor...");
            println!("  File: ~/.config/eldocs/config.toml");
            println!();

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let config_path = get_config_path()?;

            let status = std::process::Command::new(editor)
                .arg(&config_path)
                .status()?;

            if status.success() {
                println!("  ✅ Configuration edited");

                // Validate after edit
                let config = load_config()?;
                validate_config(&config)?;
                println!("  ✅ Configuration valid");
            } else {
                println!("  ⚠️  Editor exited with error");
            }

            Ok(())
        }
        _ => {
            println!("Unknown action: {}", action);
            println!("Available actions: show, edit, validate");
            Ok(())
        }
    }
}

/// Handle ping command
pub async fn handle_ping() -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let pong = connector
        .ping()
        .await
        .map_err(|e| api_error(&connector, e))?;
    println!("{}", pong);

    Ok(())
}

/// Handle storage command
pub async fn handle_storage() -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let storage = connector
        .storage_available()
        .await
        .map_err(|e| api_error(&connector, e))?;

    println!("Storage quota:");
    println!("  Total:  {}", format_optional_bytes(storage.total));
    println!("  Used:   {}", format_optional_bytes(storage.used));
    println!("  Shared: {}", format_optional_bytes(storage.shared));

    Ok(())
}

/// Handle ls command
pub async fn handle_ls(path: &str, with_tags: bool) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let entries = connector
        .list_folder_contents(FileSpec::Path, path, with_tags)
        .await
        .map_err(|e| api_error(&connector, e))?;

    if entries.is_empty() {
        println!("  Empty folder");
    } else {
        #[derive(Tabled)]
        struct EntryRow {
            name: String,
            kind: String,
            size: String,
            modified: String,
            tags: String,
        }

        let rows: Vec<EntryRow> = entries
            .iter()
            .map(|e| EntryRow {
                name: e.name.clone().unwrap_or_default(),
                kind: match e.entry_kind() {
                    EntryKind::Folder => "folder".to_string(),
                    EntryKind::File => "file".to_string(),
                },
                size: e.size.map(format_bytes).unwrap_or_default(),
                modified: e
                    .modified_date
                    .as_deref()
                    .map(format_date)
                    .unwrap_or_default(),
                tags: e.tags.as_ref().map(|t| t.join(", ")).unwrap_or_default(),
            })
            .collect();

        println!("{}", Table::new(rows));
    }

    Ok(())
}

/// Handle mkdir command
pub async fn handle_mkdir(path: &str, tags: &[String]) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    println!("Creating folder '{}'...", path);
    let folder = connector
        .create_folder(path, tags)
        .await
        .map_err(|e| api_error(&connector, e))?;

    println!("  ✅ Folder created: {}", folder.path.unwrap_or_default());

    Ok(())
}

/// Handle rmdir command
pub async fn handle_rmdir(path: &str, empty_trash: bool) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    println!("⚠️  Warning: you are about to delete folder '{}'", path);
    connector
        .delete_folder(path, empty_trash)
        .await
        .map_err(|e| api_error(&connector, e))?;

    println!("  ✅ Folder deleted: {}", path);

    Ok(())
}

/// Handle rm command
pub async fn handle_rm(identifier: &str, by_id: bool, empty_trash: bool) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let spec = if by_id { FileSpec::Id } else { FileSpec::Path };

    println!("Deleting {}...", identifier);
    connector
        .delete_file(spec, identifier, empty_trash)
        .await
        .map_err(|e| api_error(&connector, e))?;

    println!("  ✅ File deleted");

    Ok(())
}

/// Handle cp command
pub async fn handle_cp(identifier: &str, target: &str, by_id: bool, folder: bool) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let spec = if by_id { FileSpec::Id } else { FileSpec::Path };
    let kind = if folder { EntryKind::Folder } else { EntryKind::File };

    println!("Copying {} -> {}...", identifier, target);
    let copied = connector
        .copy_entry(kind, spec, identifier, target)
        .await
        .map_err(|e| api_error(&connector, e))?;

    println!("  ✅ Copied to: {}", copied.path.unwrap_or_default());

    Ok(())
}

/// Handle meta command
pub async fn handle_meta(identifier: &str, by_id: bool, folder: bool, json: bool) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let spec = if by_id { FileSpec::Id } else { FileSpec::Path };
    let kind = if folder { EntryKind::Folder } else { EntryKind::File };

    let entry = connector
        .entry_metadata(kind, spec, identifier)
        .await
        .map_err(|e| api_error(&connector, e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_metadata(&entry);
    }

    Ok(())
}

fn print_metadata(entry: &CloudFile) {
    println!("  Name:     {}", entry.name.as_deref().unwrap_or("-"));
    println!("  Path:     {}", entry.path.as_deref().unwrap_or("-"));
    println!("  ID:       {}", entry.id.as_deref().unwrap_or("-"));
    println!(
        "  Size:     {}",
        entry.size.map(format_bytes).unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Created:  {}",
        entry
            .created_date
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "  Modified: {}",
        entry
            .modified_date
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string())
    );
    if let Some(tags) = &entry.tags {
        println!("  Tags:     {}", tags.join(", "));
    }
}

/// Handle links command
pub async fn handle_links(identifier: &str, by_id: bool) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let spec = if by_id { FileSpec::Id } else { FileSpec::Path };

    let links = connector
        .file_links(spec, identifier)
        .await
        .map_err(|e| api_error(&connector, e))?;

    println!("Links for {}:", identifier);
    if let Some(link) = &links.cloud_elements_link {
        println!("  Hub:      {}", link);
    }
    if let Some(link) = &links.provider_link {
        println!("  Provider: {}", link);
    }
    if let Some(link) = &links.provider_view_link {
        println!("  View:     {}", link);
    }
    if let Some(expires) = &links.expires {
        println!("  Expires:  {}", format_date(expires));
    }

    Ok(())
}

/// Handle upload command
pub async fn handle_upload(
    file: &str,
    remote_path: &str,
    description: Option<&str>,
    tags: &[String],
    overwrite: bool,
) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    let local = Path::new(file);
    if !local.exists() {
        return Err(anyhow::anyhow!("File not found: {}", file));
    }

    let file_size = local.metadata()?.len();

    println!("Uploading {} -> {}...", file, remote_path);
    println!("  Size: {}", format_bytes(file_size as i64));

    // Detect content type
    let content_type = mime_guess::from_path(local)
        .first_or_octet_stream()
        .to_string();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Uploading...");

    let source = tokio::fs::File::open(local).await?;
    let body = reqwest::Body::wrap_stream(ReaderStream::new(source));

    let uploaded = connector
        .upload_file(
            body,
            &content_type,
            remote_path,
            description,
            tags,
            overwrite,
            Some(file_size),
        )
        .await
        .map_err(|e| api_error(&connector, e))?;

    pb.finish_and_clear();
    println!("  ✅ Upload complete: {}", uploaded.path.unwrap_or_default());

    Ok(())
}

/// Handle download command
pub async fn handle_download(id: &str, dest: &str) -> Result<()> {
    let config = load_config()?;
    let connector = build_connector(&config)?;

    println!("Downloading {} -> {}...", id, dest);

    let content = connector
        .get_file(id)
        .await
        .map_err(|e| api_error(&connector, e))?;

    if let Some(name) = &content.file_name {
        println!("  Remote name: {}", name);
    }

    let pb = match content.content_length {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{bar:40.green} {bytes}/{total_bytes} {msg}")?,
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    // Create parent directories if needed
    let dest_path = Path::new(dest);
    if let Some(parent) = dest_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut out = tokio::fs::File::create(dest_path).await?;
    let mut stream = content.into_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        pb.inc(chunk.len() as u64);
        out.write_all(&chunk).await?;
    }
    out.flush().await?;

    pb.finish_and_clear();
    println!("  ✅ Download complete");

    Ok(())
}

/// Format ISO date string to readable format
fn format_date(iso_date: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(iso_date) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => iso_date.to_string(),
    }
}

/// Format bytes to human-readable size
fn format_bytes(bytes: i64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

fn format_optional_bytes(bytes: Option<i64>) -> String {
    bytes.map(format_bytes).unwrap_or_else(|| "-".to_string())
}

/// Mask a secret for display, keeping the first 4 chars
fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        Some(s) if s.chars().count() > 4 => {
            let prefix: String = s.chars().take(4).collect();
            format!("{}...", prefix)
        }
        Some(_) => "***".to_string(),
        None => "(not set)".to_string(),
    }
}

/// Handle shell completion generation
pub async fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    use std::io;

    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    generate(clap_shell, cmd, "eldocs", &mut io::stdout());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.00 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_date_falls_back_on_garbage() {
        assert_eq!(format_date("not-a-date"), "not-a-date");
        assert_eq!(format_date("2024-03-01T12:30:00Z"), "2024-03-01 12:30");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(Some("abcdefgh")), "abcd...");
        assert_eq!(mask_secret(Some("ab")), "***");
        assert_eq!(mask_secret(None), "(not set)");
    }

    #[test]
    fn test_mask_secret_multibyte() {
        // Prefix must cut on char boundaries, not bytes
        assert_eq!(mask_secret(Some("abcéf")), "abcé...");
        assert_eq!(mask_secret(Some("ééé")), "***");
    }
}
