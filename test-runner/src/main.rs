//! flvm-run: execute a program image

use anyhow::Result;
use test_runner::{demo_image, load_image, parse_args, run_image, save_image, Command, USAGE};

fn main() -> Result<()> {
    // Program output goes to the log; RUST_LOG overrides the level
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    match parse_args(std::env::args().skip(1))? {
        Command::Help => println!("{USAGE}"),
        Command::Demo { out } => {
            let image = demo_image(flvm_program_runtime::ByteOrder::native());
            save_image(&image, &out)?;
            println!("wrote demo image to {}", out.display());
        }
        Command::Run { path, options } => {
            let mut image = load_image(&path)?;
            if options.disasm {
                print!("{}", image.disassemble());
            }
            let report = run_image(&mut image, &options)?;
            println!("{report}");
        }
    }
    Ok(())
}
