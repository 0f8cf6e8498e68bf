//! pastedown CLI - convert an HTML payload to Markdown

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use pastedown::{gfm, CodeBlockStyle, Converter, HeadingStyle, LinkStyle, Options};

#[derive(Parser)]
#[command(name = "pastedown")]
#[command(version)]
#[command(about = "Convert pasted HTML to Markdown", long_about = None)]
struct Cli {
    /// Input HTML file (reads stdin if not specified)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Disable extended syntax (tables, strikethrough, task lists)
    #[arg(long)]
    no_extended: bool,

    /// Heading style
    #[arg(long, value_enum, default_value = "atx")]
    heading_style: HeadingStyleArg,

    /// Bullet list marker
    #[arg(long, default_value = "-")]
    bullet: char,

    /// Code block style
    #[arg(long, value_enum, default_value = "fenced")]
    code_blocks: CodeBlockStyleArg,

    /// Emphasis delimiter
    #[arg(long, default_value = "*")]
    em: char,

    /// Link style
    #[arg(long, value_enum, default_value = "inlined")]
    links: LinkStyleArg,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum HeadingStyleArg {
    /// `# Heading`
    Atx,
    /// Underlined with `=` or `-`
    Setext,
}

impl From<HeadingStyleArg> for HeadingStyle {
    fn from(style: HeadingStyleArg) -> Self {
        match style {
            HeadingStyleArg::Atx => HeadingStyle::Atx,
            HeadingStyleArg::Setext => HeadingStyle::Setext,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CodeBlockStyleArg {
    /// Triple-backtick fences
    Fenced,
    /// Four-space indentation
    Indented,
}

impl From<CodeBlockStyleArg> for CodeBlockStyle {
    fn from(style: CodeBlockStyleArg) -> Self {
        match style {
            CodeBlockStyleArg::Fenced => CodeBlockStyle::Fenced,
            CodeBlockStyleArg::Indented => CodeBlockStyle::Indented,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LinkStyleArg {
    /// `[text](url)`
    Inlined,
    /// `[text][label]` with definitions after the body
    Referenced,
}

impl From<LinkStyleArg> for LinkStyle {
    fn from(style: LinkStyleArg) -> Self {
        match style {
            LinkStyleArg::Inlined => LinkStyle::Inlined,
            LinkStyleArg::Referenced => LinkStyle::Referenced,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let payload = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    log::debug!("read {} bytes of input", payload.len());

    let options = Options {
        heading_style: cli.heading_style.into(),
        bullet_list_marker: cli.bullet,
        code_block_style: cli.code_blocks.into(),
        em_delimiter: cli.em,
        link_style: cli.links.into(),
        ..Options::default()
    };
    let mut converter = Converter::with_options(options);
    if !cli.no_extended {
        converter.use_plugin(gfm);
    }

    let markdown = converter.convert(&payload)?;
    print!("{}", markdown);

    Ok(())
}
