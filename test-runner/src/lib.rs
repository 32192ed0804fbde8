//! Runner for flvm program images
//!
//! Loads a bincode-encoded [`ProgramImage`], wires the reference syscalls
//! and executes it. The `flvm-run` binary is a thin shell around
//! [`parse_args`] and [`run_image`].

use anyhow::{bail, Context, Result};
use flvm_program_runtime::{ByteOrder, Config, Engine, HaltReason, ProgramImage, SyscallTable};
use flvm_sdk::{DataBuilder, ProgramBuilder};
use flvm_syscalls::{register_return_data, register_syscalls, syscall_numbers, ReturnData};
use std::{fmt, fs, path::Path, path::PathBuf};

/// Usage text printed by `--help`
pub const USAGE: &str = "\
Usage: flvm-run [OPTIONS] <IMAGE>
       flvm-run --demo <OUT>

Options:
      --stack <BYTES>           Operand stack capacity (default 512)
      --max-instructions <N>    Abort after N instructions
      --big-endian              Decode immediates and data as big-endian
      --little-endian           Decode immediates and data as little-endian
      --no-width-check          Allow pops of a different width than pushed
      --disasm                  Print the disassembly before running
      --demo <OUT>              Write the demo image to OUT and exit
  -h, --help                    Print this help";

/// Options for a single run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Engine configuration; the byte order is taken from the image unless
    /// `byte_order` overrides it
    pub config: Config,
    /// Forced byte order
    pub byte_order: Option<ByteOrder>,
    /// Print the disassembly before running
    pub disasm: bool,
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the image at `path`
    Run {
        /// Image file
        path: PathBuf,
        /// Run options
        options: RunOptions,
    },
    /// Write the demo image to `out`
    Demo {
        /// Output file
        out: PathBuf,
    },
    /// Print usage
    Help,
}

/// Parse command-line arguments, program name excluded
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut options = RunOptions::default();
    let mut path = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "--stack" => {
                let value = args.next().context("--stack needs a value")?;
                options.config.stack_capacity = value
                    .parse()
                    .with_context(|| format!("invalid stack capacity '{value}'"))?;
            }
            "--max-instructions" => {
                let value = args.next().context("--max-instructions needs a value")?;
                options.config.max_instructions = Some(
                    value
                        .parse()
                        .with_context(|| format!("invalid instruction limit '{value}'"))?,
                );
            }
            "--big-endian" => options.byte_order = Some(ByteOrder::Big),
            "--little-endian" => options.byte_order = Some(ByteOrder::Little),
            "--no-width-check" => options.config.check_widths = false,
            "--disasm" => options.disasm = true,
            "--demo" => {
                let out = args.next().context("--demo needs an output path")?;
                return Ok(Command::Demo { out: out.into() });
            }
            flag if flag.starts_with('-') => bail!("unknown option '{flag}'\n\n{USAGE}"),
            _ => {
                if path.replace(PathBuf::from(&arg)).is_some() {
                    bail!("more than one image given");
                }
            }
        }
    }

    let path = path.with_context(|| format!("no image given\n\n{USAGE}"))?;
    Ok(Command::Run { path, options })
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Why execution stopped
    pub halt: HaltReason,
    /// Instructions retired
    pub instructions: u64,
    /// Bytes left on the operand stack
    pub stack_bytes: usize,
    /// Value handed back through the return data syscalls
    pub return_data: Option<Vec<u8>>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} instructions, {} bytes left on stack",
            self.halt, self.instructions, self.stack_bytes
        )?;
        if let Some(data) = &self.return_data {
            write!(f, ", returned {:02x?}", data)?;
        }
        Ok(())
    }
}

/// Read and decode an image file
pub fn load_image(path: &Path) -> Result<ProgramImage> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let image = ProgramImage::from_bytes(&bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    log::debug!(
        "loaded {}: {} code bytes, {} data bytes, {}",
        path.display(),
        image.code.len(),
        image.data.len(),
        image.byte_order
    );
    Ok(image)
}

/// Encode `image` and write it to `path`
pub fn save_image(image: &ProgramImage, path: &Path) -> Result<()> {
    let bytes = image.to_bytes()?;
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

/// Run `image` with the reference syscalls registered
///
/// The image's data segment is handed to the engine mutably, so stores are
/// visible in `image.data` afterwards.
pub fn run_image(image: &mut ProgramImage, options: &RunOptions) -> Result<RunReport> {
    let mut syscalls = SyscallTable::new();
    register_syscalls(&mut syscalls)?;
    let ret = ReturnData::new();
    register_return_data(&mut syscalls, &ret)?;

    let config = Config {
        byte_order: options.byte_order.unwrap_or(image.byte_order),
        ..options.config.clone()
    };

    let mut engine = Engine::with_config(config)?;
    engine.load_code(&image.code)?;
    engine.load_data(Some(&mut image.data));
    engine.load_syscalls(&syscalls);

    let halt = engine
        .exec()
        .with_context(|| format!("execution failed at pc {}", engine.pc()))?;

    Ok(RunReport {
        halt,
        instructions: engine.instruction_count(),
        stack_bytes: engine.stack().len(),
        return_data: ret.get(),
    })
}

/// The demo program: load an `f32` from data and log it
pub fn demo_image(order: ByteOrder) -> ProgramImage {
    let mut data = DataBuilder::new(order);
    let value = data.offset();
    data.f32(0.122);

    let mut program = ProgramBuilder::new(order);
    program
        .address(value)
        .load32()
        .syscall(syscall_numbers::LOG_F32)
        .syscall(syscall_numbers::DUMP_STACK)
        .halt();
    program.into_image(data)
}
