use crate::provider::Provider;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "smart-commit",
    version,
    about = "Propose a conventional commit message for your staged changes",
    long_about = "Reads the staged diff, asks a hosted language model for a conventional commit message, and lets you commit, edit, regenerate, or quit."
)]
pub struct Args {
    #[arg(long, value_name = "TEXT", help = "Model to use (deprecated names are remapped)")]
    pub model: Option<String>,

    #[arg(long, value_enum, help = "Generation provider [default: groq]")]
    pub provider: Option<Provider>,

    #[arg(long, help = "Show the message and commit without asking")]
    pub auto_commit: bool,

    #[arg(long, help = "Skip the preview and commit immediately")]
    pub no_preview: bool,

    #[arg(short, long, help = "Log pipeline steps to stderr")]
    pub verbose: bool,
}
