use std::cell::RefCell;
use std::io::Read;

use clap::Parser;

use just_tcl::interp::{Code, Interp};
use just_tcl::tcl::{Tcl, TclOptions};
use just_tcl::value::Value;

#[derive(Parser)]
#[command(name = "just-tcl")]
#[command(about = "An embeddable Tcl-style command interpreter")]
#[command(version)]
struct Cli {
    /// Execute the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Output results as JSON (result, output, code)
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

thread_local! {
    /// Output captured from the CLI-registered `puts`.
    static OUTPUT: RefCell<String> = const { RefCell::new(String::new()) };
}

/// JSON envelope for `--json` mode.
#[derive(serde::Serialize)]
struct JsonOutcome<'a> {
    result: &'a str,
    output: &'a str,
    code: i64,
    #[serde(rename = "errorInfo")]
    error_info: Option<&'a str>,
}

/// `puts ?-nonewline? string` for the shell: the core registers no I/O
/// commands, so the binary provides one that appends to a buffer.
fn cmd_puts(interp: &mut Interp, argv: &[Value]) -> Code {
    let (text, newline) = match argv.len() {
        2 => (argv[1].as_str().to_string(), true),
        3 if argv[1].as_str() == "-nonewline" => (argv[2].as_str().to_string(), false),
        _ => return interp.error("wrong # args: should be \"puts ?-nonewline? string\""),
    };
    OUTPUT.with(|out| {
        let mut out = out.borrow_mut();
        out.push_str(&text);
        if newline {
            out.push('\n');
        }
    });
    interp.ok(Value::empty())
}

fn main() {
    let cli = Cli::parse();

    // Determine script source: -c, file, or stdin.
    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: Cannot read script file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!(
                "Error: No script provided. Use -c 'script', provide a script file, or pipe via stdin."
            );
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let mut tcl = Tcl::new(TclOptions::default());
    tcl.interp().register("puts", cmd_puts);

    let outcome = tcl.eval(&script);
    let output = OUTPUT.with(|out| out.borrow().clone());

    if cli.json {
        let envelope = JsonOutcome {
            result: &outcome.result,
            output: &output,
            code: outcome.code.to_int(),
            error_info: outcome.error_info.as_deref(),
        };
        println!("{}", serde_json::to_string(&envelope).expect("serializable"));
    } else {
        if !output.is_empty() {
            print!("{}", output);
        }
        match outcome.code {
            Code::Ok => {
                if !outcome.result.is_empty() {
                    println!("{}", outcome.result);
                }
            }
            _ => {
                eprintln!("{}", outcome.error_info.unwrap_or(outcome.result));
            }
        }
    }
    std::process::exit(if outcome.code == Code::Ok { 0 } else { 1 });
}
