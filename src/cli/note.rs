//! Note CLI subcommands.

use clap::Subcommand;

/// Note management commands.
#[derive(Subcommand, Debug, Clone)]
pub enum NoteCommand {
    /// Create a note.
    Add {
        /// Note title
        title: String,

        /// Note text
        content: String,

        /// Comma-separated tags
        #[arg(short, long, default_value = "")]
        tags: String,
    },

    /// List the most recent notes.
    List {
        /// Maximum number of notes to show
        #[arg(short, long, default_value_t = crate::tasks::DEFAULT_NOTE_LIMIT)]
        limit: usize,
    },
}
