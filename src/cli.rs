use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "privacy-preference prediction backend")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the backend server
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Predict unrated items for a panel respondent (demonstration)
    Predict {
        /// Position of the respondent within the panel
        #[arg(short, long)]
        respondent: usize,
        /// Single target item id; when omitted, every item the
        /// respondent has not rated is predicted
        #[arg(short, long)]
        item: Option<String>,
    },
}
