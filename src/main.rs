//! gate16 Emulator - CLI Entry Point
//!
//! Commands:
//! - `gate16-emu run <program>` - Run an image or ASM file
//! - `gate16-emu debug <program>` - Interactive debugger
//! - `gate16-emu asm <source>` - Assemble to an image
//! - `gate16-emu disasm <image>` - Disassemble an image

use clap::{Parser, Subcommand};
use gate16::Word;
use gate16::cpu::dump::DEFAULT_DUMP_WORDS;

#[derive(Parser)]
#[command(name = "gate16-emu")]
#[command(version)]
#[command(about = "A gate-level emulator of a 16-bit register machine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the image or ASM file to execute
        program: String,
        /// Maximum number of steps to run
        #[arg(short, long, default_value = "100000")]
        max_steps: u64,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        json: bool,
        /// Number of memory words in the final dump
        #[arg(long, default_value_t = DEFAULT_DUMP_WORDS)]
        dump_words: usize,
    },
    /// Interactive debugger
    #[cfg(feature = "tui")]
    Debug {
        /// Path to the image or ASM file to debug
        program: String,
    },
    /// Assemble source to an image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an image to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Some(Commands::Run { trace: true, .. }));
    let default_level = if trace { "trace" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match cli.command {
        Some(Commands::Run { program, max_steps, json, dump_words, .. }) => {
            run_program(&program, max_steps, json, dump_words);
        }
        #[cfg(feature = "tui")]
        Some(Commands::Debug { program }) => {
            debug_program(&program);
        }
        Some(Commands::Asm { source, output }) => {
            assemble_file(&source, output);
        }
        Some(Commands::Disasm { image }) => {
            disassemble_file(&image);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("gate16 Emulator v{}", env!("CARGO_PKG_VERSION"));
            println!("A gate-level 16-bit CPU emulator");
            println!();
            println!("Use --help for available commands");
            println!();
            demo_alu_table();
        }
    }
}

/// Load program words from an `.asm` source or an image file.
fn load_words(path: &str) -> Vec<Word> {
    use gate16::{assemble, load_image};

    let words = if path.ends_with(".asm") {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        };

        match assemble(&source) {
            Ok(words) => {
                println!("📝 Assembled {} words", words.len());
                words
            }
            Err(e) => {
                eprintln!("❌ Assembly error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match load_image(path) {
            Ok(image) => {
                println!("📂 Loaded {} words", image.len());
                image.words
            }
            Err(e) => {
                eprintln!("❌ Failed to load image: {}", e);
                std::process::exit(1);
            }
        }
    };

    if words.is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }

    words
}

fn run_program(path: &str, max_steps: u64, json: bool, dump_words: usize) {
    use gate16::{Cpu, Snapshot};
    use gate16::cpu::dump::{dump_memory, dump_registers};

    println!("🔧 Running: {}", path);
    let words = load_words(path);

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&words) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    println!();
    println!("━━━ Execution ━━━");

    let outcome = cpu.run_limited(max_steps);
    println!();

    if json {
        match Snapshot::capture(&cpu).to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("❌ Failed to serialize state: {}", e),
        }
    } else {
        println!("━━━ Result ━━━");
        println!("Instructions: {}", cpu.cycles);
        println!("State: {:?}", cpu.state);
        print!("{}", dump_registers(&cpu.regs));
        print!("{}", dump_memory(&cpu, dump_words));
    }

    match outcome {
        Ok(Some(reason)) if reason.is_fault() => {
            eprintln!("❌ CPU stopped: {}", reason);
            std::process::exit(2);
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            println!();
            println!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", max_steps);
        }
        Err(e) => {
            eprintln!("❌ CPU error at IP={}: {}", cpu.regs.ip.wrapping_sub(1), e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use gate16::run_debugger;

    println!("🔍 Loading: {}", path);
    let words = load_words(path);

    println!("🚀 Launching debugger...");
    println!();

    if let Err(e) = run_debugger(words) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

fn assemble_file(source_path: &str, output: Option<String>) {
    use gate16::{assemble, save_image, ImageFile};

    let out_path = output.unwrap_or_else(|| {
        source_path.replace(".asm", ".hex")
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("❌ Failed to read file: {}", e);
            std::process::exit(1);
        }
    };

    let words = match assemble(&source) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("❌ Assembly error: {}", e);
            std::process::exit(1);
        }
    };

    println!("✓ Assembled {} words", words.len());

    if let Err(e) = save_image(&out_path, &ImageFile::new(words)) {
        eprintln!("❌ Failed to save image: {}", e);
        std::process::exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(image_path: &str) {
    use gate16::{disassemble, load_image};

    println!("📖 Disassembling: {}", image_path);
    println!();

    let image = match load_image(image_path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("❌ Failed to load image: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", disassemble(&image.words));
}

fn demo_alu_table() {
    use gate16::AluFunction;
    use gate16::alu::compute;

    let (x, y) = (1000, 37);
    println!("━━━ ALU functions for x={}, y={} ━━━", x, y);
    println!();

    for function in AluFunction::ALL {
        match compute(x, y, function.control()) {
            Ok(out) => println!(
                "  {:06b}  {:<4} = {:>6}  zr={} ng={} ov={} cy={}",
                function.code(),
                function.symbol(),
                out.result,
                out.status.zr as u8,
                out.status.ng as u8,
                out.status.ov as u8,
                out.status.cy as u8,
            ),
            Err(e) => println!("  {:06b}  {}", function.code(), e),
        }
    }
}

fn run_self_test() {
    use gate16::{assemble, encode, decode_fields, AluFunction, Cpu, HaltReason, Opcode};
    use gate16::alu::compute;
    use gate16::cpu::decode::Fields;

    println!("━━━ gate16 Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    let mut check = |name: &str, ok: bool| {
        if ok {
            println!("{}... ✓", name);
            passed += 1;
        } else {
            println!("{}... ✗", name);
            failed += 1;
        }
    };

    // Test 1: ripple-carry adder against native addition
    let mut ok = true;
    for (x, y) in [(0u16, 0u16), (1, 1), (0x7FFF, 1), (0xFFFF, 1), (0x8000, 0x8000), (12345, 54321)] {
        match compute(x, y, AluFunction::Add.control()) {
            Ok(out) => {
                let (sum, carry) = x.overflowing_add(y);
                ok &= out.result == sum && out.status.cy == carry;
            }
            Err(_) => ok = false,
        }
    }
    check("ALU add matches native addition", ok);

    // Test 2: every datapath code yields its named function
    let ok = compute(9, 4, AluFunction::SubXY.control()).map(|o| o.result) == Ok(5)
        && compute(9, 4, AluFunction::Or.control()).map(|o| o.result) == Ok(13)
        && compute(9, 4, AluFunction::IncX.control()).map(|o| o.result) == Ok(10);
    check("ALU datapath functions", ok);

    // Test 3: encoder/decoder round trip
    let word = encode(Opcode::Store as u8, 3, 5, 42);
    check(
        "Encode/decode round trip",
        decode_fields(word) == Fields { opcode: 14, reg1: 3, reg2: 5, imm: 42 },
    );

    // Test 4: MOV/ADD/HALT program
    let mut cpu = Cpu::with_output(Vec::<u8>::new());
    let program = [
        encode(Opcode::Mov as u8, 0, 0, 5),
        encode(Opcode::Add as u8, 0, 0, 3),
        encode(Opcode::Halt as u8, 0, 0, 0),
    ];
    let ok = cpu.load_program(&program).is_ok()
        && cpu.run() == Ok(HaltReason::Halt)
        && cpu.regs.gpr[0] == 8;
    check("CPU MOV/ADD/HALT", ok);

    // Test 5: CALL/RET and the output port
    let source = "MOV r1, 32\nCALL print\nHALT\nprint: MOV r0, '!'\nSTORE r0, r1\nRET";
    let mut cpu = Cpu::with_output(Vec::<u8>::new());
    let ok = match assemble(source) {
        Ok(words) => {
            cpu.load_program(&words).is_ok()
                && cpu.run() == Ok(HaltReason::Halt)
                && cpu.output().as_slice() == b"!"
                && cpu.depth == 1
        }
        Err(_) => false,
    };
    check("CPU CALL/RET with port output", ok);

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
