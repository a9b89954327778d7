use clap::Subcommand;
use uuid::Uuid;

use crate::types::ReputationAction;

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCmd {
    #[command(about = "Print a profile as JSON")]
    Show {
        #[arg(long, value_name = "UUID")]
        id: Uuid,
    },
    #[command(
        about = "Apply a reputation action",
        long_about = "Apply a reputation action to a profile, honouring the daily cap and one-time rules, and print the points granted."
    )]
    Award {
        #[arg(long, value_name = "UUID")]
        id: Uuid,
        #[arg(
            long,
            value_name = "ACTION",
            help = "link_github, link_linkedin, team_created, joined_team, matched, star_received or message_received"
        )]
        action: ReputationAction,
    },
}
