//! # Tessera CLI Module
//!
//! This module implements the CLI interface for Tessera.
//!
//! ## Available Commands
//!
//! - `status` - Show store status
//! - `init` - Initialize a new store file
//! - `insert` - Insert a record into a collection
//! - `find` - Query a collection with criteria
//! - `get` - Fetch a single record by id
//! - `update` - Patch all records matching criteria
//! - `delete` - Delete all records matching criteria
//! - `role-add` - Register a relation role
//! - `relate` / `unrelate` - Add or remove a (subject, role, object) fact
//! - `roleset` - Directional neighbor query
//! - `tags` / `tagged` - Tag queries in both directions
//! - `groups` / `members` - Group membership queries
//! - `subgroups` / `supergroups` - Group nesting, optionally transitive
//! - `new` / `object` / `drop-class` - Class-qualified object operations
//! - `export` / `import` - Move store contents through JSON

mod commands;

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tessera_core::StoreError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tessera - Embeddable Object Store
///
/// A deterministic in-memory object store with collections, ternary
/// relations, and cycle-safe transitive group queries, persisted between
/// invocations as a snapshot file.
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the store snapshot file
    #[arg(short = 'D', long, global = true)]
    pub store: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show store status
    Status,

    /// Initialize a new empty store file
    Init {
        /// Force initialization even if the store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Insert a record into a collection
    Insert {
        /// Collection name
        #[arg(short, long)]
        collection: String,

        /// Record as a JSON object
        #[arg(short, long)]
        record: String,
    },

    /// Query a collection
    Find {
        /// Collection name
        #[arg(short, long)]
        collection: String,

        /// Criteria as a JSON object (omit to match everything)
        #[arg(short = 'q', long)]
        criteria: Option<String>,

        /// Comma-separated field names to project
        #[arg(short, long)]
        project: Option<String>,

        /// Comma-separated field names to sort by
        #[arg(short, long)]
        order_by: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Return matching ids only
        #[arg(long)]
        ids_only: bool,
    },

    /// Fetch a single record by id
    Get {
        /// Collection name
        #[arg(short, long)]
        collection: String,

        /// Record id
        #[arg(short, long)]
        id: String,
    },

    /// Patch all records matching criteria
    Update {
        /// Collection name
        #[arg(short, long)]
        collection: String,

        /// Criteria as a JSON object
        #[arg(short = 'q', long)]
        criteria: String,

        /// Patch as a JSON object (id field is ignored)
        #[arg(short, long)]
        patch: String,
    },

    /// Delete all records matching criteria
    Delete {
        /// Collection name
        #[arg(short, long)]
        collection: String,

        /// Criteria as a JSON object
        #[arg(short = 'q', long)]
        criteria: String,
    },

    /// Register a relation role
    RoleAdd {
        /// Role name
        #[arg(short, long)]
        name: String,
    },

    /// Record a (subject, role, object) fact
    Relate {
        /// Subject object id
        #[arg(short, long)]
        subject: String,

        /// Role name
        #[arg(short, long)]
        role: String,

        /// Object id
        #[arg(short, long)]
        object: String,
    },

    /// Remove a (subject, role, object) fact
    Unrelate {
        /// Subject object id
        #[arg(short, long)]
        subject: String,

        /// Role name
        #[arg(short, long)]
        role: String,

        /// Object id
        #[arg(short, long)]
        object: String,
    },

    /// Directional neighbor query
    Roleset {
        /// Anchor object id
        #[arg(short, long)]
        anchor: String,

        /// Role name
        #[arg(short, long)]
        role: String,

        /// Anchor on the object side instead of the subject side
        #[arg(long)]
        reverse: bool,
    },

    /// List the tags applied to an object
    Tags {
        /// Object id
        #[arg(short, long)]
        object: String,
    },

    /// List the objects carrying a tag
    Tagged {
        /// Tag id
        #[arg(short, long)]
        tag: String,
    },

    /// List the groups an object belongs to
    Groups {
        /// Object id
        #[arg(short, long)]
        object: String,
    },

    /// List the member objects of a group
    Members {
        /// Group id
        #[arg(short, long)]
        group: String,
    },

    /// List the groups contained in a group
    Subgroups {
        /// Group id
        #[arg(short, long)]
        group: String,

        /// Follow containment transitively
        #[arg(short, long)]
        recursive: bool,
    },

    /// List the groups containing a group
    Supergroups {
        /// Group id
        #[arg(short, long)]
        group: String,

        /// Follow containment transitively
        #[arg(short, long)]
        recursive: bool,
    },

    /// Create a class-qualified object
    New {
        /// Class name
        #[arg(short, long)]
        class: String,

        /// Record as a JSON object (id is generated)
        #[arg(short, long)]
        record: String,
    },

    /// Fetch a class-qualified object by id
    Object {
        /// Qualified object id (class.token)
        #[arg(short, long)]
        id: String,
    },

    /// Drop every instance of a class
    DropClass {
        /// Class name
        #[arg(short, long)]
        class: String,
    },

    /// Export store contents as JSON
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import store contents from JSON
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), StoreError> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    // CLI flag wins over config file; fall back to a local default.
    let store_path = cli
        .store
        .or(config.store.path)
        .unwrap_or_else(|| PathBuf::from("tessera.db"));
    let prefix = config.ids.prefix.as_deref();
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Status) => cmd_status(&store_path, prefix, json_mode),
        Some(Commands::Init { force }) => cmd_init(&store_path, prefix, force),
        Some(Commands::Insert { collection, record }) => {
            cmd_insert(&store_path, prefix, json_mode, &collection, &record)
        }
        Some(Commands::Find {
            collection,
            criteria,
            project,
            order_by,
            limit,
            ids_only,
        }) => cmd_find(
            &store_path,
            prefix,
            &collection,
            criteria.as_deref(),
            project.as_deref(),
            order_by.as_deref(),
            limit,
            ids_only,
        ),
        Some(Commands::Get { collection, id }) => cmd_get(&store_path, prefix, &collection, &id),
        Some(Commands::Update {
            collection,
            criteria,
            patch,
        }) => cmd_update(&store_path, prefix, json_mode, &collection, &criteria, &patch),
        Some(Commands::Delete {
            collection,
            criteria,
        }) => cmd_delete(&store_path, prefix, json_mode, &collection, &criteria),
        Some(Commands::RoleAdd { name }) => cmd_role_add(&store_path, prefix, json_mode, &name),
        Some(Commands::Relate {
            subject,
            role,
            object,
        }) => cmd_relate(&store_path, prefix, json_mode, &subject, &role, &object),
        Some(Commands::Unrelate {
            subject,
            role,
            object,
        }) => cmd_unrelate(&store_path, prefix, json_mode, &subject, &role, &object),
        Some(Commands::Roleset {
            anchor,
            role,
            reverse,
        }) => cmd_roleset(&store_path, prefix, &anchor, &role, reverse),
        Some(Commands::Tags { object }) => cmd_tags(&store_path, prefix, &object),
        Some(Commands::Tagged { tag }) => cmd_tagged(&store_path, prefix, &tag),
        Some(Commands::Groups { object }) => cmd_groups(&store_path, prefix, &object),
        Some(Commands::Members { group }) => cmd_members(&store_path, prefix, &group),
        Some(Commands::Subgroups { group, recursive }) => {
            cmd_subgroups(&store_path, prefix, &group, recursive)
        }
        Some(Commands::Supergroups { group, recursive }) => {
            cmd_supergroups(&store_path, prefix, &group, recursive)
        }
        Some(Commands::New { class, record }) => {
            cmd_new(&store_path, prefix, json_mode, &class, &record)
        }
        Some(Commands::Object { id }) => cmd_object(&store_path, prefix, &id),
        Some(Commands::DropClass { class }) => {
            cmd_drop_class(&store_path, prefix, json_mode, &class)
        }
        Some(Commands::Export { output }) => cmd_export(&store_path, prefix, &output),
        Some(Commands::Import { input }) => cmd_import(&store_path, prefix, &input),
        None => {
            // No subcommand - show status by default
            cmd_status(&store_path, prefix, json_mode)
        }
    }
}
