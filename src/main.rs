//! textmode - render ANSI art from the command line
//!
//! Decodes an ANSI stream into a screen buffer, then optionally dumps the
//! text, writes a PPM image of the blink-on phase, or reports the frame
//! layout of the blink animation and scroller.
//!
//! # Quick Start
//!
//! ```text
//! textmode art.ans --dump            # Print the decoded grid as UTF-8
//! textmode art.ans --ppm art.ppm     # Render with ~/.textmode/fonts/ibm_vga.bin
//! cat art.ans | textmode - --frames  # Animation frame counts
//! textmode --list-fonts              # Known SAUCE font names
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context};
use clap::Parser;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::tty::IsTty;
use crossterm::{cursor, queue};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use textmode::chargen::catalog;
use textmode::config::LetterSpacing;
use textmode::diagnostics::CollectingSink;
use textmode::render::BlinkPhase;
use textmode::{Compositor, Config, DiagnosticSink, ScreenBuffer};

const PROGRESS_WIDTH: usize = 40;

#[derive(Debug, Parser)]
#[command(name = "textmode", version, about = "Render ANSI art to raster images")]
struct Cli {
    /// Input file, `-` for stdin
    input: Option<PathBuf>,

    /// Configuration file (default: ~/.textmode/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Font ROM file or known font name
    #[arg(short, long)]
    font: Option<String>,

    /// Cell size of a ROM file, as WxH
    #[arg(long, value_parser = parse_size)]
    font_size: Option<(usize, usize)>,

    /// Render with VGA nine pixel letter spacing
    #[arg(long)]
    nine_pixel: bool,

    /// Double the resolution with rounded diagonals
    #[arg(long)]
    smooth: bool,

    /// Initial screen width in columns
    #[arg(long)]
    width: Option<usize>,

    /// Initial screen height in rows
    #[arg(long)]
    height: Option<usize>,

    /// Scroll at the bottom instead of growing the buffer
    #[arg(long)]
    no_auto_expand: bool,

    /// Draw blinking cells with a bright background
    #[arg(long)]
    no_blink: bool,

    /// Extra pixels between glyphs
    #[arg(long)]
    padding: Option<usize>,

    /// Print the decoded grid as UTF-8
    #[arg(long)]
    dump: bool,

    /// Write the rendered image as binary PPM
    #[arg(long, value_name = "FILE")]
    ppm: Option<PathBuf>,

    /// Report blink animation and scroller frame counts
    #[arg(long)]
    frames: bool,

    /// List known font names and exit
    #[arg(long)]
    list_fonts: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// No progress bar or summary
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {:?}", s))?;
    let w = w.trim().parse::<usize>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<usize>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err("font size must be non-zero".to_string());
    }
    Ok((w, h))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_tty())
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Command line settings override the configuration file.
fn apply_overrides(cli: &Cli, config: &mut Config) {
    if let Some(font) = &cli.font {
        let path = PathBuf::from(font);
        if path.is_file() {
            config.font.path = Some(path);
        } else {
            config.font.path = None;
            config.font.name = Some(font.clone());
        }
    }
    if let Some((w, h)) = cli.font_size {
        config.font.width = w;
        config.font.height = h;
    }
    if cli.nine_pixel {
        config.font.letter_spacing = LetterSpacing::NinePixel;
    }
    if cli.smooth {
        config.font.smooth = true;
    }
    if let Some(width) = cli.width {
        config.screen.width = width;
    }
    if let Some(height) = cli.height {
        config.screen.height = height;
    }
    if cli.no_auto_expand {
        config.screen.auto_expand = false;
    }
    if cli.no_blink {
        config.render.disable_blink = true;
    }
    if let Some(padding) = cli.padding {
        config.render.padding = padding;
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default().context("Failed to load default config")?,
    };
    apply_overrides(cli, &mut config);
    Ok(config)
}

fn open_input(input: &Path) -> anyhow::Result<Box<dyn Read>> {
    if input.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Draw a progress bar on stderr: red below a third, yellow below two
/// thirds, green after.
fn draw_progress(fraction: f64) {
    let fraction = fraction.clamp(0.0, 1.0);
    let filled = (fraction * PROGRESS_WIDTH as f64).round() as usize;
    let color = if fraction < 1.0 / 3.0 {
        Color::Red
    } else if fraction < 2.0 / 3.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    let bar = format!(
        "[{}{}] {:3.0}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled),
        fraction * 100.0
    );
    let mut stderr = io::stderr();
    let _ = queue!(
        stderr,
        cursor::MoveToColumn(0),
        SetForegroundColor(color),
        Print(bar),
        ResetColor
    );
    if fraction >= 1.0 {
        let _ = queue!(stderr, Print("\n"));
    }
    let _ = stderr.flush();
}

fn list_fonts(out: &mut impl Write) -> io::Result<()> {
    for info in catalog::FONTS {
        writeln!(
            out,
            "{:<32} {:>2}x{:<2} {}",
            info.name, info.size.x, info.size.y, info.rom
        )?;
    }
    for (alias, name) in catalog::ALIASES {
        writeln!(out, "{:<32} -> {}", alias, name)?;
    }
    out.flush()
}

fn render(
    cli: &Cli,
    config: &Config,
    screen: &ScreenBuffer,
    sink: Rc<dyn DiagnosticSink>,
) -> anyhow::Result<()> {
    let font = config.font.load_font().context("Failed to load font")?;
    let size = font.size();
    info!("Font cell {}x{}, {} glyphs", size.x, size.y, font.character_count());

    let mut compositor = Compositor::with_diagnostics(font, sink);
    if !cli.quiet && io::stderr().is_tty() {
        compositor.on_progress(draw_progress);
    }

    if let Some(path) = &cli.ppm {
        let image = compositor.render(screen, BlinkPhase::On);
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        image
            .write_ppm(BufWriter::new(file))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}: {}x{} pixels, {} colors",
                path.display(),
                image.width(),
                image.height(),
                image.palette().len()
            );
        }
    }

    if cli.frames {
        let blink = compositor.animate(screen, config.render.delay);
        let scroller =
            compositor.scroller(screen, config.render.delay, config.render.viewport_rows);
        println!(
            "blink: {} frames, {}x{}, {} cs",
            blink.frame_count(),
            blink.width(),
            blink.height(),
            blink.duration()
        );
        println!(
            "scroller: {} frames, {}x{}, {} cs",
            scroller.frame_count(),
            scroller.width(),
            scroller.height(),
            scroller.duration()
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_fonts {
        list_fonts(&mut io::stdout().lock()).context("Failed to write font list")?;
        return Ok(());
    }

    let config = load_config(&cli)?;
    if cli.print_config {
        print!("{}", config.to_toml().context("Failed to serialize config")?);
        return Ok(());
    }

    let Some(input) = &cli.input else {
        bail!("No input given. Use --help for usage information");
    };

    let collected = Rc::new(CollectingSink::new());
    let sink: Rc<dyn DiagnosticSink> = collected.clone();

    let reader = open_input(input)?;
    let screen = textmode::decode_with_diagnostics(reader, &config, Rc::clone(&sink))
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    debug!("Decoded {}x{} cells", screen.width(), screen.height());

    if cli.dump {
        print!("{}", screen);
    }

    if cli.ppm.is_some() || cli.frames {
        render(&cli, &config, &screen, sink)?;
    }

    let diagnostics = collected.take();
    for diagnostic in &diagnostics {
        debug!("{}", diagnostic);
    }
    if !diagnostics.is_empty() {
        warn!(
            "{} sequences skipped or approximated (use -v for details)",
            diagnostics.len()
        );
    }
    if !cli.quiet {
        eprintln!(
            "{}: {}x{} cells",
            input.display(),
            screen.width(),
            screen.height()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("8x16"), Ok((8, 16)));
        assert_eq!(parse_size("9X14"), Ok((9, 14)));
        assert!(parse_size("8").is_err());
        assert!(parse_size("0x16").is_err());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_list_fonts() {
        let mut out = Vec::new();
        list_fonts(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), catalog::FONTS.len() + catalog::ALIASES.len());

        let err = list_fonts(&mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "textmode",
            "art.ans",
            "--font",
            "topaz",
            "--nine-pixel",
            "--width",
            "132",
            "--no-blink",
        ]);
        let mut config = Config::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(config.font.name.as_deref(), Some("topaz"));
        assert_eq!(config.font.letter_spacing, LetterSpacing::NinePixel);
        assert_eq!(config.screen.width, 132);
        assert!(config.render.disable_blink);
        assert!(config.screen.auto_expand);
    }
}
