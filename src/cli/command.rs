use clap::Subcommand;

use crate::cli::profile_cmd::ProfileCmd;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Print the reputation leaderboard",
        long_about = "Print the reputation leaderboard as JSON. Equal reputation shares a rank."
    )]
    Leaderboard {
        #[arg(long, value_name = "N", help = "Number of entries (1-100, default 10)")]
        limit: Option<u32>,
        #[arg(long, value_name = "COLLEGE", help = "Only rank students of this college")]
        college: Option<String>,
    },
    #[command(
        about = "Profile administration",
        long_about = "Inspect profiles and apply reputation actions by hand."
    )]
    Profile {
        #[command(subcommand)]
        cmd: ProfileCmd,
    },
}
