use anyhow::Result;
use clap::{CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// eldocs - CLI for the Cloud Elements documents hub
#[derive(Parser, Debug)]
#[command(name = "eldocs")]
#[command(version = "0.1.0")]
#[command(about = "Manage cloud documents through the Cloud Elements hub API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Interactive configuration wizard
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Verify the hub endpoint answers
    Ping,

    /// Show the storage quota of the cloud account
    Storage,

    /// List the contents of a folder
    Ls {
        /// Folder path (must begin with a slash)
        path: String,
        /// Fetch tags for each entry
        #[arg(short, long)]
        tags: bool,
    },

    /// Create a folder
    Mkdir {
        /// Full folder path (must begin with a slash)
        path: String,
        /// Tags to attach to the new folder
        #[arg(short, long)]
        tags: Vec<String>,
    },

    /// Delete a folder
    Rmdir {
        /// Folder path
        path: String,
        /// Also empty the provider trash
        #[arg(long)]
        empty_trash: bool,
    },

    /// Delete a file
    Rm {
        /// File path, or ID with --id
        identifier: String,
        /// Treat the identifier as an opaque ID instead of a path
        #[arg(long)]
        id: bool,
        /// Also empty the provider trash
        #[arg(long)]
        empty_trash: bool,
    },

    /// Copy a file or folder to a target path
    Cp {
        /// Source path, or ID with --id
        identifier: String,
        /// Target path
        target: String,
        /// Treat the identifier as an opaque ID instead of a path
        #[arg(long)]
        id: bool,
        /// The source is a folder
        #[arg(long)]
        folder: bool,
    },

    /// Show metadata for a file or folder
    Meta {
        /// Path, or ID with --id
        identifier: String,
        /// Treat the identifier as an opaque ID instead of a path
        #[arg(long)]
        id: bool,
        /// The entry is a folder
        #[arg(long)]
        folder: bool,
        /// Print raw metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show credential-free download links for a file
    Links {
        /// File path, or ID with --id
        identifier: String,
        /// Treat the identifier as an opaque ID instead of a path
        #[arg(long)]
        id: bool,
    },

    /// Upload a local file
    Upload {
        /// Local file to upload
        file: String,
        /// Full remote path (must begin with a slash)
        path: String,
        /// Description stored with the file
        #[arg(short, long)]
        description: Option<String>,
        /// Tags to attach
        #[arg(short, long)]
        tags: Vec<String>,
        /// Overwrite an existing file at the path
        #[arg(long)]
        overwrite: bool,
    },

    /// Download a file by ID
    Download {
        /// File ID
        id: String,
        /// Local destination path
        dest: String,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Edit the configuration in $EDITOR
    Edit,
    /// Validate configuration and test the connection
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Init => handlers::handle_init().await,
        Commands::Config { action } => {
            let action_str = match action {
                ConfigAction::Show => "show",
                ConfigAction::Edit => "edit",
                ConfigAction::Validate => "validate",
            };
            handlers::handle_config(action_str).await
        }
        Commands::Ping => handlers::handle_ping().await,
        Commands::Storage => handlers::handle_storage().await,
        Commands::Ls { path, tags } => handlers::handle_ls(&path, tags).await,
        Commands::Mkdir { path, tags } => handlers::handle_mkdir(&path, &tags).await,
        Commands::Rmdir { path, empty_trash } => handlers::handle_rmdir(&path, empty_trash).await,
        Commands::Rm {
            identifier,
            id,
            empty_trash,
        } => handlers::handle_rm(&identifier, id, empty_trash).await,
        Commands::Cp {
            identifier,
            target,
            id,
            folder,
        } => handlers::handle_cp(&identifier, &target, id, folder).await,
        Commands::Meta {
            identifier,
            id,
            folder,
            json,
        } => handlers::handle_meta(&identifier, id, folder, json).await,
        Commands::Links { identifier, id } => handlers::handle_links(&identifier, id).await,
        Commands::Upload {
            file,
            path,
            description,
            tags,
            overwrite,
        } => handlers::handle_upload(&file, &path, description.as_deref(), &tags, overwrite).await,
        Commands::Download { id, dest } => handlers::handle_download(&id, &dest).await,
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command()).await
        }
    }
}
