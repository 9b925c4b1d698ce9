use clap::{Arg, Command, arg, value_parser};

pub const NBLOCKS_CMD: &str = "nblocks";

pub fn create_nblocks_cli() -> Command {
    Command::new(NBLOCKS_CMD)
        .about("Extract no-coverage and reference-N blocks from a coverage classification file.")
        .arg(arg!(--input <CLASSIFIED_BED> "Classification output (contig, start, end, category)").required(true))
        .arg(
            Arg::new("min-n-size")
                .long("min-n-size")
                .required(false)
                .value_parser(value_parser!(u32))
                .default_value("2000")
                .help("Keep only blocks longer than this many bases"),
        )
        .arg(arg!(--output <OUTPUT> "Output BED file (default: stdout)").required(false))
}
