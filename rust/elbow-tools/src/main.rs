// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use clap::Parser;
use elbow_tools::cli::ElbowToolsArgs;
use elbow_tools::util::install_panic_handler;

pub fn main() -> Result<(), elbow_core::Error> {
    env_logger::init();

    // Install global panic handler
    install_panic_handler();

    // Parse arguments from command line
    let args = ElbowToolsArgs::parse();

    args.run(&mut std::io::stdout())
}
