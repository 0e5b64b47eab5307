//! CLI module - Command-line interface for animeshelf
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// animeshelf - Anime collection tracker
/// Organise anime into collections and track what you watch
#[derive(Parser)]
#[command(name = "animeshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Sign in with email and password, or with an external provider
    Login {
        #[arg(long, conflicts_with = "provider")]
        email: Option<String>,
        #[arg(long, requires = "email")]
        password: Option<String>,
        /// google or github
        #[arg(long)]
        provider: Option<String>,
    },

    /// Create an account
    #[command(alias = "signup")]
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Search anime by title
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Anime airing this season
    Seasonal {
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show details about an anime
    #[command(alias = "i")]
    Show {
        /// MyAnimeList id
        mal_id: i32,
    },

    /// Manage collections
    #[command(alias = "c")]
    Collections {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// List the anime in a collection
    #[command(alias = "ls")]
    Entries {
        collection_id: String,
        /// Only show titles containing this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// Add an anime to a collection
    #[command(alias = "a")]
    Add {
        /// MyAnimeList id
        mal_id: i32,
        #[arg(long)]
        collection: Option<String>,
        /// watching, completed or plan_to_watch
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        score: Option<u8>,
        #[arg(long, default_value = "0")]
        progress: u32,
        /// YYYY-MM-DD
        #[arg(long)]
        started: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        finished: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CollectionCommands {
    /// List your collections
    #[command(alias = "ls")]
    List,
    /// Create a collection
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Preview image URL (up to 3)
        #[arg(long = "image")]
        images: Vec<String>,
    },
    /// Edit a collection
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replace the preview images (up to 3)
        #[arg(long = "image")]
        images: Vec<String>,
        /// Remove all preview images
        #[arg(long, conflicts_with = "images")]
        clear_images: bool,
    },
    /// Delete a collection
    #[command(alias = "rm")]
    Delete { id: String },
}

pub use commands::*;
