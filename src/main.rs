//! `crossplane`: a CLI over the lexer, parser, builder, and formatter
//! (§4.9). Subcommands mirror the library's entry points one-to-one.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use serde::Serialize;

use nginx_crossplane::{
    builder, catalog, formatter, lex, parser::ParseOptions, parser::Parser as ConfigParser,
    ExtensionRegistry, ParsedPayload,
};

/// Missing input file.
const EXIT_MISSING_INPUT: u8 = 1;
/// Input file exists but could not be read (permissions, not UTF-8, ...).
const EXIT_UNREADABLE_INPUT: u8 = 2;
/// `build`'s input file was not a valid JSON payload.
const EXIT_INVALID_JSON: u8 = 3;
/// Output already exists and `--force` was not given.
const EXIT_REFUSE_OVERWRITE: u8 = 4;

#[derive(ClapParser)]
#[command(name = "crossplane")]
#[command(author, version, about = "Lex, parse, validate, and build nginx configuration files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tokenize a file and print its token stream as JSON.
    Lex {
        file: PathBuf,
        /// Include each token's source line in the output.
        #[arg(long)]
        line_numbers: bool,
        #[arg(long, default_value_t = 4)]
        indent: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parse a file (and everything it `include`s) and print the payload as JSON.
    Parse {
        file: PathBuf,
        #[arg(long)]
        combine: bool,
        #[arg(long)]
        single_file: bool,
        #[arg(long)]
        include_comments: bool,
        #[arg(long)]
        strict: bool,
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,
        #[arg(long)]
        no_catch: bool,
        /// Record an opaque "traceback" string alongside each recorded error.
        #[arg(long)]
        tb_onerror: bool,
        #[arg(long, default_value_t = 4)]
        indent: usize,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build nginx config text from a JSON payload (the shape `parse` prints).
    Build {
        file: PathBuf,
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        force: bool,
        #[arg(long, default_value_t = 4)]
        indent: usize,
        #[arg(long)]
        tabs: bool,
        #[arg(long)]
        no_headers: bool,
        #[arg(long)]
        stdout: bool,
    },
    /// Parse then rebuild a file with canonical formatting.
    Format {
        file: PathBuf,
        #[arg(long, default_value_t = 4)]
        indent: usize,
        #[arg(long)]
        tabs: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parse then rebuild a file with all non-essential whitespace stripped.
    Minify {
        file: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Lex {
            file,
            line_numbers,
            indent,
            out,
        } => run_lex(&file, line_numbers, indent, out.as_deref()),
        Command::Parse {
            file,
            combine,
            single_file,
            include_comments,
            strict,
            ignore,
            no_catch,
            tb_onerror,
            indent,
            out,
        } => run_parse(
            &file,
            combine,
            single_file,
            include_comments,
            strict,
            ignore,
            no_catch,
            tb_onerror,
            indent,
            out.as_deref(),
        ),
        Command::Build {
            file,
            dir,
            force,
            indent,
            tabs,
            no_headers,
            stdout,
        } => run_build(&file, dir.as_deref(), force, indent, tabs, no_headers, stdout),
        Command::Format {
            file,
            indent,
            tabs,
            out,
        } => run_format(&file, indent, tabs, out.as_deref()),
        Command::Minify { file, out } => run_minify(&file, out.as_deref()),
    }
}

fn read_input(file: &Path) -> Result<String, ExitCode> {
    std::fs::read_to_string(file).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            eprintln!("{}: {e}", file.display());
            ExitCode::from(EXIT_MISSING_INPUT)
        } else {
            eprintln!("{}: {e}", file.display());
            ExitCode::from(EXIT_UNREADABLE_INPUT)
        }
    })
}

fn write_output(out: Option<&Path>, content: &str) -> ExitCode {
    let result = match out {
        Some(path) => std::fs::write(path, content),
        None => {
            print!("{content}");
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_UNREADABLE_INPUT)
        }
    }
}

fn pretty_json<T: Serialize>(value: &T, indent: usize) -> String {
    let indent_bytes = " ".repeat(indent);
    let mut buf = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(indent_bytes.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
    value.serialize(&mut ser).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

#[derive(Serialize)]
struct TokenOut {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    quoted: bool,
    kind: &'static str,
}

fn run_lex(file: &Path, line_numbers: bool, indent: usize, out: Option<&Path>) -> ExitCode {
    let input = match read_input(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let extensions = ExtensionRegistry::with_builtins();
    let name = file.display().to_string();
    let tokens = match lex(&input, name, &extensions) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_UNREADABLE_INPUT);
        }
    };
    let out_tokens: Vec<TokenOut> = tokens
        .into_iter()
        .map(|t| TokenOut {
            text: t.text,
            line: line_numbers.then_some(t.line),
            quoted: t.quoted,
            kind: match t.kind {
                nginx_crossplane::TokenKind::Word => "word",
                nginx_crossplane::TokenKind::Comment => "comment",
                nginx_crossplane::TokenKind::OpenBrace => "open_brace",
                nginx_crossplane::TokenKind::CloseBrace => "close_brace",
                nginx_crossplane::TokenKind::Semicolon => "semicolon",
            },
        })
        .collect();
    write_output(out, &pretty_json(&out_tokens, indent))
}

#[allow(clippy::too_many_arguments)]
fn run_parse(
    file: &Path,
    combine: bool,
    single_file: bool,
    include_comments: bool,
    strict: bool,
    ignore: Vec<String>,
    no_catch: bool,
    tb_onerror: bool,
    indent: usize,
    out: Option<&Path>,
) -> ExitCode {
    if std::fs::metadata(file).is_err() {
        eprintln!("{}: No such file or directory", file.display());
        return ExitCode::from(EXIT_MISSING_INPUT);
    }

    let catalog = catalog::seed_catalog();
    let extensions = ExtensionRegistry::with_builtins();
    let options = ParseOptions {
        on_error: tb_onerror.then_some(|kind: &nginx_crossplane::ParseErrorKind| {
            serde_json::json!({ "traceback": kind.to_string() })
        }),
        catch_errors: !no_catch,
        ignore: ignore.into_iter().collect(),
        single_file,
        comments: include_comments,
        strict,
        combine,
        check_ctx: true,
        check_args: true,
    };
    let parser = ConfigParser::new(&catalog, &extensions, options);
    match parser.parse(&file.display().to_string()) {
        Ok(payload) => write_output(out, &pretty_json(&payload, indent)),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_UNREADABLE_INPUT)
        }
    }
}

fn run_build(
    file: &Path,
    dir: Option<&Path>,
    force: bool,
    indent: usize,
    tabs: bool,
    no_headers: bool,
    to_stdout: bool,
) -> ExitCode {
    let input = match read_input(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let payload: ParsedPayload = match serde_json::from_str(&input) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("invalid JSON input: {e}");
            return ExitCode::from(EXIT_INVALID_JSON);
        }
    };

    let extensions = ExtensionRegistry::with_builtins();
    let header = (!no_headers).then(|| format!("generated by crossplane from {}", file.display()));
    let options = builder::BuildOptions {
        indent,
        tabs,
        compact: false,
        header,
    };
    let root_dir = dir.map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    if to_stdout {
        for report in &payload.config {
            print!("{}", builder::build(&report.parsed, &extensions, &options));
        }
        return ExitCode::SUCCESS;
    }

    if !force {
        for report in &payload.config {
            let target = nginx_crossplane::resolve_target(&report.file, &root_dir);
            if target.exists() {
                eprintln!("refusing to overwrite existing file: {}", target.display());
                return ExitCode::from(EXIT_REFUSE_OVERWRITE);
            }
        }
    }

    match builder::build_files(&payload, &root_dir, &extensions, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_UNREADABLE_INPUT)
        }
    }
}

/// Parses `input` the way [`formatter::format`] does, but with the
/// caller's own indent/tabs rather than the formatter's fixed 4-space
/// default — `format`'s canonical options (§4.8) are a convenience for
/// callers who don't need to choose, not a ceiling on what the CLI can
/// expose.
fn render_formatted(input: &str, options: &builder::BuildOptions) -> Result<String, nginx_crossplane::Error> {
    let catalog = catalog::seed_catalog();
    let extensions = ExtensionRegistry::with_builtins();
    let parse_options = ParseOptions {
        comments: true,
        single_file: true,
        ..ParseOptions::default()
    };
    let parser = ConfigParser::new(&catalog, &extensions, parse_options);
    let payload = parser.parse_text(input, "<input>")?;
    let nodes = payload.config.first().map(|report| report.parsed.as_slice()).unwrap_or_default();
    Ok(builder::build(nodes, &extensions, options))
}

fn run_format(file: &Path, indent: usize, tabs: bool, out: Option<&Path>) -> ExitCode {
    let input = match read_input(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let options = builder::BuildOptions {
        indent,
        tabs,
        ..builder::BuildOptions::default()
    };
    match render_formatted(&input, &options) {
        Ok(text) => write_output(out, &text),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_UNREADABLE_INPUT)
        }
    }
}

fn run_minify(file: &Path, out: Option<&Path>) -> ExitCode {
    let input = match read_input(file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match formatter::minify(&input) {
        Ok(text) => write_output(out, &text),
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_UNREADABLE_INPUT)
        }
    }
}
