//! texbake - Command-line tool for baking source images into compressed ETC2 textures

use std::process::ExitCode;

use texbake::cli;

fn main() -> ExitCode {
    cli::run()
}
