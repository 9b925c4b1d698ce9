use clap::{Arg, ArgAction, Command, arg};

pub const COMBINE_CMD: &str = "combine";

pub fn create_combine_cli() -> Command {
    Command::new(COMBINE_CMD)
        .about("Merge per-sample callable blocks into one project-wide analysis split.")
        .arg(arg!(--reference <FASTA> "Reference fasta, with a .dict or .fai next to it").required(true))
        .arg(
            Arg::new("work-dir")
                .long("work-dir")
                .required(true)
                .help("Directory for analysis_blocks.bed and noanalysis_blocks.bed"),
        )
        .arg(
            Arg::new("blocks")
                .long("blocks")
                .required(true)
                .num_args(1..)
                .action(ArgAction::Append)
                .help("Callable blocks BED file, one per sample"),
        )
        .arg(arg!(--config <CONFIG> "Run configuration (.yaml, .yml or .toml)").required(false))
}
