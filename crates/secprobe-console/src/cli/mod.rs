/*
[INPUT]:  Parsed clap arguments from main
[OUTPUT]: Subcommand implementations and interactive prompts
[POS]:    CLI layer - binary-only modules
[UPDATE]: When adding subcommands
*/

pub mod commands;
pub mod init;
pub mod interactive;
