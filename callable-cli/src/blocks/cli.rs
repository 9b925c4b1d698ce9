use clap::{Arg, ArgAction, Command, arg};

pub const BLOCKS_CMD: &str = "blocks";

pub fn create_blocks_cli() -> Command {
    Command::new(BLOCKS_CMD)
        .about("Compute callable blocks for one sample: the reference minus large stretches without coverage.")
        .arg(arg!(--bam <BAM> "Aligned reads of the sample").required(true))
        .arg(arg!(--reference <FASTA> "Reference fasta, with a .dict or .fai next to it").required(true))
        .arg(arg!(--config <CONFIG> "Run configuration (.yaml, .yml or .toml)").required(false))
        .arg(arg!(--output <OUTPUT> "Output BED file (default: stdout)").required(false))
        .arg(
            Arg::new("progress")
                .long("progress")
                .action(ArgAction::SetTrue)
                .help("Show a progress bar while contigs are classified"),
        )
}
