use std::process;

use clap::{Parser, Subcommand};
use nativemem_core::dump::format_hexdump;
use nativemem_core::text::{self, Charset, Termination};
use nativemem_core::{AccessorKind, ElementKind, Memory, MemoryConfig, MemoryResult, OwnedBuffer};
use nativemem_utils::{debug, info, init_logging};

/// Inspect how text and memory cross the native boundary.
#[derive(Parser, Debug)]
#[command(name = "nativemem")]
#[command(version)]
#[command(about = "Diagnostics for the nativemem memory bridging layer", long_about = None)]
struct Cli
{
    /// Memory accessor to prefer (overrides NATIVEMEM_ACCESSOR)
    #[arg(long, global = true)]
    accessor: Option<AccessorKind>,

    /// Force precondition checks on or off (overrides NATIVEMEM_CHECKED)
    #[arg(long, global = true)]
    checked: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Show the selected accessor, page size, pointer size, checked mode and element widths
    Info,
    /// Encode text and print a hexdump of the resulting buffer
    Encode
    {
        /// Text to encode
        text: String,
        /// Charset name (e.g. UTF-8, US-ASCII, ISO-8859-1, UTF-16, UTF-16BE)
        #[arg(short, long, default_value = "UTF-8")]
        charset: String,
        /// Do not append a terminator
        #[arg(long, default_value_t = false)]
        unterminated: bool,
        /// Bytes per hexdump row (8 to 32)
        #[arg(short, long, default_value_t = 16)]
        width: usize,
    },
    /// Encode text with a terminator, then find its length with a null-terminated scan
    Scan
    {
        /// Text to encode and scan
        text: String,
        /// Use UTF-16 and scan for a zero 16-bit unit
        #[arg(long, default_value_t = false)]
        wide: bool,
    },
}

fn main()
{
    // Initialize logging (reads from RUST_LOG env var)
    // Defaults to INFO level and Pretty format if not set
    let _guard = match init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    let cli = Cli::parse();

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> MemoryResult<()>
{
    let mut config = MemoryConfig::from_env();
    if let Some(kind) = cli.accessor {
        config = config.with_preferred(kind);
    }
    if let Some(checked) = cli.checked {
        config = config.with_checked(checked);
    }
    let memory = Memory::with_config(&config)?.install()?;

    match cli.command {
        Commands::Info => {
            print_memory_info(memory);
            Ok(())
        }
        Commands::Encode {
            text: input,
            charset,
            unterminated,
            width,
        } => {
            let charset = Charset::for_name(&charset)?;
            let termination = Termination::from(!unterminated);
            let buffer = encode_with(&input, charset, termination)?;
            info!(charset = %charset, bytes = buffer.len(), "Encoded text");

            println!("{} bytes of {} at {}", buffer.len(), charset, buffer.address());
            print!("{}", format_hexdump(buffer.address(), buffer.as_slice(), width));
            Ok(())
        }
        Commands::Scan { text: input, wide } => {
            let decoded = if wide {
                let buffer = text::encode_utf16(&input, Termination::NullTerminated)?;
                // SAFETY: the buffer ends with a zero unit and outlives the view.
                let view = unsafe { memory.byte_view_nt2(buffer.address())? };
                let length = view.as_ref().map_or(0, |view| view.capacity());
                println!("Scanned {} bytes (UTF-16) at {}", length, buffer.address());
                text::decode_utf16(view.as_ref())
            } else {
                let buffer = text::encode_utf8(&input, Termination::NullTerminated)?;
                // SAFETY: the buffer ends with a zero byte and outlives the view.
                let view = unsafe { memory.byte_view_nt1(buffer.address())? };
                let length = view.as_ref().map_or(0, |view| view.capacity());
                println!("Scanned {} bytes (UTF-8) at {}", length, buffer.address());
                text::decode_utf8(view.as_ref())?
            };

            println!("Decoded: {:?}", decoded.unwrap_or_default());
            Ok(())
        }
    }
}

/// Encode through the direct fast paths where one exists.
fn encode_with(input: &str, charset: Charset, termination: Termination) -> MemoryResult<OwnedBuffer>
{
    if charset == Charset::UsAscii {
        debug!("Using ASCII fast path");
        text::encode_ascii(input, termination)
    } else if charset == Charset::UTF_16 {
        debug!("Using native UTF-16 fast path");
        text::encode_utf16(input, termination)
    } else {
        text::encode(input, charset, termination)
    }
}

fn print_memory_info(memory: &Memory)
{
    println!("Native Memory Information:");
    println!("  Accessor: {}", memory.accessor_name());
    println!("  Page Size: {} bytes", memory.page_size());
    println!("  Pointer Size: {} bytes", memory.pointer_size());
    println!("  Checked: {}", memory.is_checked());
    println!("  Pinned Objects: {}", memory.pinned_count());
    println!("  Element Widths:");
    for kind in ElementKind::ALL {
        println!("    {}: {} bytes", kind, memory.element_width(kind));
    }
}
