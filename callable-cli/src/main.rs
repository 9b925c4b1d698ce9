mod blocks;
mod combine;
mod common;
mod nblocks;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "callable";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Find callable regions of a genome from aligned reads and combine them across samples for parallel variant calling.")
        .subcommand_required(true)
        .subcommand(blocks::cli::create_blocks_cli())
        .subcommand(nblocks::cli::create_nblocks_cli())
        .subcommand(combine::cli::create_combine_cli())
}

fn main() -> Result<()> {
    callable_loci::init_tracing();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // CALLABLE BLOCKS FOR ONE SAMPLE
        //
        Some((blocks::cli::BLOCKS_CMD, matches)) => {
            blocks::handlers::run_blocks(matches)?;
        }

        //
        // NBLOCKS FROM A CLASSIFICATION FILE
        //
        Some((nblocks::cli::NBLOCKS_CMD, matches)) => {
            nblocks::handlers::run_nblocks(matches)?;
        }

        //
        // MULTI-SAMPLE COMBINE
        //
        Some((combine::cli::COMBINE_CMD, matches)) => {
            combine::handlers::run_combine(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    fn test_parser_is_consistent() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_subcommand_required() {
        let result = build_parser().try_get_matches_from([consts::BIN_NAME]);
        assert!(result.is_err());
    }
}
