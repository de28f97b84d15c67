//! Connection CLI subcommands.

use clap::Subcommand;

/// Connection monitor commands.
#[derive(Subcommand, Debug, Clone)]
pub enum ConnectionsCommand {
    /// List tracked clients.
    List {
        /// Filter: all, active, idle or disconnected
        #[arg(short, long, default_value = "all")]
        status: String,
    },

    /// Show client and request counts.
    Stats,

    /// Show one client.
    Show {
        /// Client identifier
        client_id: String,
    },

    /// Forget disconnected clients not seen for a number of days.
    Cleanup {
        /// Age in days
        #[arg(short, long, default_value_t = 7)]
        days: i64,
    },
}
