//! gabctk - convert gabc chant scores to MIDI, LilyPond, ABC, lyrics and
//! tablature.
//!
//! ```text
//! gabctk score.gabc                   # writes score.mid and score.ly
//! gabctk -i score.gabc -c score.abc   # ABC only
//! gabctk score.gabc -l - -d -3        # LilyPond on stdout, 3 semitones down
//! ```

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gabc::{lyrics, pitch_name, FeedbackLevel, Score, Transposition};

mod config;
mod templates;

use config::GabctkConfig;

#[derive(Parser)]
#[command(name = "gabctk")]
#[command(about = "Convert gabc chant scores to MIDI, LilyPond and ABC")]
#[command(version)]
struct Cli {
    /// gabc input file (`-` for stdin)
    #[arg(short, long, value_name = "FILE")]
    input: Option<String>,

    /// MIDI output file
    #[arg(short = 'o', long, value_name = "FILE")]
    midi: Option<String>,

    /// LilyPond output file
    #[arg(short, long, value_name = "FILE")]
    lily: Option<String>,

    /// ABC output file
    #[arg(short = 'c', long, value_name = "FILE")]
    abc: Option<String>,

    /// Plain lyrics output file
    #[arg(short = 'e', long, value_name = "FILE")]
    export: Option<String>,

    /// Tablature output file
    #[arg(short = 'b', long, value_name = "FILE")]
    tab: Option<String>,

    /// Tempo in eighth notes per minute
    #[arg(short, long)]
    tempo: Option<u16>,

    /// Transposition in semitones (automatic when omitted)
    #[arg(short = 'd', long, allow_negative_numbers = true)]
    transposition: Option<i32>,

    /// Title, overriding the `name` header
    #[arg(short = 'n', long)]
    title: Option<String>,

    /// Text to look for in the lyrics (repeatable)
    #[arg(short = 'a', long = "alert", value_name = "TEXT")]
    alerts: Vec<String>,

    /// Print the lyrics, range and transposition, and log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Config file, replacing ./gabctk.toml
    #[arg(long, env = "GABCTK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input file, then an optional output whose extension (.mid, .ly,
    /// .abc) picks its format
    #[arg(value_name = "FILE", num_args = 0..=2)]
    files: Vec<String>,
}

/// Where each requested output goes. `-` means stdout.
#[derive(Debug, Default, PartialEq)]
struct Outputs {
    midi: Option<String>,
    lily: Option<String>,
    abc: Option<String>,
    export: Option<String>,
    tab: Option<String>,
}

impl Outputs {
    fn is_empty(&self) -> bool {
        *self == Outputs::default()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (config, sources) = GabctkConfig::load_with_sources_from(cli.config.as_deref())?;
    debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    run(&cli, &config)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn run(cli: &Cli, config: &GabctkConfig) -> Result<()> {
    let (input, outputs) = plan(cli)?;

    let source = read_input(&input)?;
    let mut options = config.parse_options();
    options.title = cli.title.clone();
    options.transposition = cli.transposition;

    let result = gabc::parse_with(&source, &options)
        .with_context(|| format!("Failed to parse {}", input))?;
    let warnings = result
        .feedback
        .iter()
        .filter(|f| f.level == FeedbackLevel::Warning)
        .count();
    info!(input = %input, warnings, "score ready");
    let score = &result.value;

    let mut midi_params = config.midi_params();
    if let Some(tempo) = cli.tempo {
        midi_params.tempo = tempo;
    }

    let text = score.lyrics();
    for alert in lyrics::find_alerts(&text, &cli.alerts) {
        eprintln!("!!! {} !!!", alert);
    }
    if cli.verbose {
        report(score, &text);
    }

    // The score is immutable from here on; renderers share it.
    let (midi, (lily, (abc, tab))) = rayon::join(
        || outputs.midi.as_ref().map(|_| gabc::to_midi(score, &midi_params)),
        || {
            rayon::join(
                || {
                    outputs
                        .lily
                        .as_ref()
                        .map(|_| templates::lilypond(&score.title, &gabc::to_lilypond(score)))
                },
                || {
                    rayon::join(
                        || {
                            outputs.abc.as_ref().map(|_| {
                                let tune = gabc::to_abc(score);
                                templates::abc(&score.title, midi_params.tempo, &tune)
                            })
                        },
                        || outputs.tab.as_ref().map(|_| gabc::to_tab(score) + "\n"),
                    )
                },
            )
        },
    );

    if let (Some(path), Some(bytes)) = (&outputs.midi, midi) {
        write_output(path, &bytes)?;
    }
    if let (Some(path), Some(doc)) = (&outputs.lily, lily) {
        write_output(path, doc.as_bytes())?;
    }
    if let (Some(path), Some(doc)) = (&outputs.abc, abc) {
        write_output(path, doc.as_bytes())?;
    }
    if let (Some(path), Some(doc)) = (&outputs.tab, tab) {
        write_output(path, doc.as_bytes())?;
    }
    if let Some(path) = &outputs.export {
        write_output(path, format!("{}\n", text).as_bytes())?;
    }

    Ok(())
}

/// Resolve the input and the outputs from flags and positional files.
fn plan(cli: &Cli) -> Result<(String, Outputs)> {
    let mut files = cli.files.iter();
    let input = match (&cli.input, files.next()) {
        (Some(input), _) => input.clone(),
        (None, Some(input)) => input.clone(),
        (None, None) => bail!("No input file given (use -i FILE or - for stdin)"),
    };

    let mut outputs = Outputs {
        midi: cli.midi.clone(),
        lily: cli.lily.clone(),
        abc: cli.abc.clone(),
        export: cli.export.clone(),
        tab: cli.tab.clone(),
    };

    // With -i, the first positional is already an output.
    let positional_output = if cli.input.is_some() {
        cli.files.first()
    } else {
        files.next()
    };
    if let Some(path) = positional_output {
        let slot = match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("mid") | Some("midi") => &mut outputs.midi,
            Some("ly") => &mut outputs.lily,
            Some("abc") => &mut outputs.abc,
            _ => bail!("Cannot tell the output format of {} (expected .mid, .ly or .abc)", path),
        };
        *slot = Some(path.clone());
    }

    if outputs.is_empty() {
        if input == "-" {
            warn!("No output requested");
        } else {
            let base = Path::new(&input);
            outputs.midi = Some(base.with_extension("mid").to_string_lossy().into_owned());
            outputs.lily = Some(base.with_extension("ly").to_string_lossy().into_owned());
        }
    }

    Ok((input, outputs))
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read gabc from stdin")?;
        Ok(source)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    if path == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes).context("Failed to write to stdout")?;
        stdout.flush().context("Failed to write to stdout")?;
    } else {
        fs::write(path, bytes).with_context(|| format!("Failed to write {}", path))?;
        info!(path = %path, bytes = bytes.len(), "written");
    }
    Ok(())
}

fn report(score: &Score, text: &str) {
    eprintln!("{}", score.title);
    eprintln!("{}\n", text);
    if let Some(range) = score.tessitura() {
        eprintln!(
            "Tessitura: {} - {}",
            pitch_name(range.min),
            pitch_name(range.max)
        );
    }
    match score.transposition {
        Transposition::Manual(t) => eprintln!("Transposition: {:+} (manual)", t),
        Transposition::Automatic(t) => eprintln!("Transposition: {:+} (automatic)", t),
    }
}
