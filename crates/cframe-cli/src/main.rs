//! cframe: symmetric encryption of text and files
//!
//! Commands:
//!   keygen [--bits N]          - print a fresh base64 key
//!   encrypt-text <text>        - encrypt a string, print the encoded frame
//!   decrypt-text <text>        - decrypt an encoded frame, print the string
//!   encrypt-file <src> <dst>   - stream-encrypt a file
//!   decrypt-file <src> <dst>   - stream-decrypt a file
//!   config show                - display the effective configuration
//!
//! Engine settings come from the config file and are overridden by
//! `--mode`, `--key`, `--encoding` and `--password`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

use cframe_core::config::CframeConfig;
use cframe_core::{CframeResult, Mode, TextEncoding};
use cframe_crypto::{generate_key, Engine, StreamSummary};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cframe",
    version,
    about = "Symmetric encryption of text and files",
    long_about = "cframe: encrypt and decrypt text and files into versioned gcm or cbc frames"
)]
struct Cli {
    /// Path to cframe.toml configuration file
    #[arg(long, short = 'c', env = "CFRAME_CONFIG", default_value = "cframe.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log].level
    #[arg(long, env = "CFRAME_LOG")]
    log: Option<String>,

    /// Log format; overrides [log].format
    #[arg(long, env = "CFRAME_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Cipher mode (gcm, cbc); overrides [engine].mode
    #[arg(long, short = 'm', global = true)]
    mode: Option<Mode>,

    /// Base64 key; overrides [engine].key
    #[arg(long, short = 'k', global = true, hide_env_values = true, env = "CFRAME_KEY")]
    key: Option<String>,

    /// Text encoding (base64, hex); overrides [engine].encoding
    #[arg(long, short = 'e', global = true)]
    encoding: Option<TextEncoding>,

    /// Default password bound into gcm frames; overrides [engine].password
    #[arg(long, short = 'p', global = true, hide_env_values = true, env = "CFRAME_PASSWORD")]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a random key and print it in base64
    Keygen {
        /// Key size in bits (128, 192 or 256; cbc needs 256)
        #[arg(long, short = 'b', default_value_t = 256)]
        bits: usize,
    },

    /// Encrypt a string and print the encoded frame
    #[command(name = "encrypt-text")]
    EncryptText {
        text: String,
    },

    /// Decrypt an encoded frame and print the string
    #[command(name = "decrypt-text")]
    DecryptText {
        text: String,
    },

    /// Encrypt a file chunk by chunk
    ///
    /// gcm output is a sequence of independent frames, one per buffer;
    /// cbc output is a single frame.
    #[command(name = "encrypt-file")]
    EncryptFile {
        src: PathBuf,
        dst: PathBuf,
    },

    /// Decrypt a file produced by `encrypt-file` with the same settings
    #[command(name = "decrypt-file")]
    DecryptFile {
        src: PathBuf,
        dst: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration (file + command-line overrides)
    Show,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    apply_overrides(&cli, &mut config);

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match &cli.log_format {
        Some(format) => format.clone(),
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("invalid [log].format: {e}"))?,
    };
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        mode = %config.engine.mode,
        "cframe starting"
    );
    log_config_source(&cli.config);

    match cli.command {
        Commands::Keygen { bits } => cmd_keygen(bits),
        Commands::EncryptText { text } => cmd_encrypt_text(&config, &text),
        Commands::DecryptText { text } => cmd_decrypt_text(&config, &text),
        Commands::EncryptFile { src, dst } => cmd_encrypt_file(&config, &src, &dst),
        Commands::DecryptFile { src, dst } => cmd_decrypt_file(&config, &src, &dst),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout carries command output.
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// The `[log]` section picks the subscriber, so the file is read before
/// logging exists; [`log_config_source`] reports the outcome afterwards.
fn load_config(path: &Path) -> Result<CframeConfig> {
    if path.exists() {
        CframeConfig::load(path).with_context(|| format!("loading config: {}", path.display()))
    } else {
        Ok(CframeConfig::default())
    }
}

fn log_config_source(path: &Path) {
    if path.exists() {
        tracing::debug!(config = %path.display(), "config loaded");
    } else {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            path.display()
        );
    }
}

/// Command-line engine settings win over the config file.
fn apply_overrides(cli: &Cli, config: &mut CframeConfig) {
    if let Some(mode) = cli.mode {
        config.engine.mode = mode;
    }
    if let Some(key) = &cli.key {
        config.engine.key = Some(key.clone());
    }
    if let Some(encoding) = cli.encoding {
        config.engine.encoding = encoding;
    }
    if let Some(password) = &cli.password {
        config.engine.password = Some(password.clone());
    }
}

fn build_engine(config: &CframeConfig) -> Result<Engine> {
    Engine::from_config(config).with_context(|| {
        format!(
            "configuring {} engine (set --password or [engine].password for gcm)",
            config.engine.mode
        )
    })
}

// ── `cframe keygen` ───────────────────────────────────────────────────────────

fn cmd_keygen(bits: usize) -> Result<()> {
    let key = generate_key(bits).with_context(|| format!("generating {bits}-bit key"))?;
    println!("{key}");
    Ok(())
}

// ── `cframe encrypt-text` / `decrypt-text` ────────────────────────────────────

fn cmd_encrypt_text(config: &CframeConfig, text: &str) -> Result<()> {
    let engine = build_engine(config)?;
    let ciphertext = engine.encrypt_text(text, "").context("encrypting text")?;
    println!("{ciphertext}");
    Ok(())
}

fn cmd_decrypt_text(config: &CframeConfig, text: &str) -> Result<()> {
    let engine = build_engine(config)?;
    let plaintext = engine.decrypt_text(text, "").context("decrypting text")?;
    println!("{plaintext}");
    Ok(())
}

// ── `cframe encrypt-file` / `decrypt-file` ────────────────────────────────────

fn cmd_encrypt_file(config: &CframeConfig, src: &Path, dst: &Path) -> Result<()> {
    let engine = build_engine(config)?;
    let summary = stream_file(src, dst, |input, output| {
        engine.encrypt_stream(input, output, "")
    })
    .with_context(|| format!("encrypting {} → {}", src.display(), dst.display()))?;
    print_summary("Encrypted", &summary, dst);
    Ok(())
}

fn cmd_decrypt_file(config: &CframeConfig, src: &Path, dst: &Path) -> Result<()> {
    let engine = build_engine(config)?;
    let summary = stream_file(src, dst, |input, output| {
        engine.decrypt_stream(input, output, "")
    })
    .with_context(|| format!("decrypting {} → {}", src.display(), dst.display()))?;
    print_summary("Decrypted", &summary, dst);
    Ok(())
}

/// Open `src`, create `dst`, and run `op` between them.
///
/// `dst` is only touched once `src` has opened, and is removed again only
/// when `op` fails after this call created it.
fn stream_file<F>(src: &Path, dst: &Path, op: F) -> Result<StreamSummary>
where
    F: FnOnce(&mut File, &mut File) -> CframeResult<StreamSummary>,
{
    let mut input =
        File::open(src).with_context(|| format!("opening source: {}", src.display()))?;
    if dst.exists() && src.canonicalize()? == dst.canonicalize()? {
        anyhow::bail!("source and destination are the same file: {}", src.display());
    }
    let mut output =
        File::create(dst).with_context(|| format!("creating destination: {}", dst.display()))?;

    match op(&mut input, &mut output) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            drop(output);
            if let Err(rm) = std::fs::remove_file(dst) {
                tracing::warn!(dst = %dst.display(), "removing partial output: {rm}");
            }
            Err(e.into())
        }
    }
}

fn print_summary(verb: &str, summary: &StreamSummary, dst: &Path) {
    println!("{verb} {}", dst.display());
    println!("  chunks:  {}", summary.chunks);
    println!("  read:    {}", fmt_bytes(summary.bytes_in));
    println!("  written: {}", fmt_bytes(summary.bytes_out));
}

// ── `cframe config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &CframeConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();

    let mut shown = config.clone();
    if shown.engine.key.is_some() {
        shown.engine.key = Some("<redacted>".into());
    }
    if shown.engine.password.is_some() {
        shown.engine.password = Some("<redacted>".into());
    }
    let rendered = shown.to_toml().context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "cframe",
            "--mode",
            "cbc",
            "--encoding",
            "hex",
            "--key",
            "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=",
            "encrypt-text",
            "hi",
        ])
        .unwrap();
        let mut config = CframeConfig::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(config.engine.mode, Mode::Cbc);
        assert_eq!(config.engine.encoding, TextEncoding::Hex);
        assert!(config.engine.key.is_some());
        assert!(Engine::from_config(&config).is_ok());
    }

    #[test]
    fn test_mode_alias_accepted() {
        let cli = Cli::try_parse_from(["cframe", "--mode", "aead", "keygen"]).unwrap();
        assert_eq!(cli.mode, Some(Mode::Gcm));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["cframe", "--mode", "ecb", "keygen"]).is_err());
    }

    #[test]
    fn test_keygen_default_bits() {
        let cli = Cli::try_parse_from(["cframe", "keygen"]).unwrap();
        assert!(matches!(cli.command, Commands::Keygen { bits: 256 }));
    }

    #[test]
    fn test_fmt_bytes() {
        assert_eq!(fmt_bytes(512), "512 B");
        assert_eq!(fmt_bytes(2048), "2.0 KB");
        assert_eq!(fmt_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    // ── file commands ──────────────────────────────────────────────────────

    fn gcm_config() -> CframeConfig {
        let mut config = CframeConfig::default();
        config.engine.password = Some("pw".into());
        config
    }

    #[test]
    fn test_file_commands_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("plain.txt");
        let enc = dir.path().join("plain.txt.enc");
        let dec = dir.path().join("plain.txt.dec");
        std::fs::write(&src, b"file contents for the cli").unwrap();

        let config = gcm_config();
        cmd_encrypt_file(&config, &src, &enc).unwrap();
        cmd_decrypt_file(&config, &enc, &dec).unwrap();
        assert_eq!(std::fs::read(&dec).unwrap(), b"file contents for the cli");
    }

    #[test]
    fn test_missing_source_keeps_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let dst = dir.path().join("important.bin");
        std::fs::write(&dst, b"existing user data").unwrap();

        assert!(cmd_encrypt_file(&gcm_config(), &missing, &dst).is_err());
        assert_eq!(std::fs::read(&dst).unwrap(), b"existing user data");

        assert!(cmd_decrypt_file(&gcm_config(), &missing, &dst).is_err());
        assert_eq!(std::fs::read(&dst).unwrap(), b"existing user data");
    }

    #[test]
    fn test_failed_decrypt_removes_created_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("garbage.enc");
        let dst = dir.path().join("out.txt");
        std::fs::write(&src, vec![0x42u8; 200]).unwrap();

        assert!(cmd_decrypt_file(&gcm_config(), &src, &dst).is_err());
        assert!(!dst.exists());
    }

    #[test]
    fn test_same_source_and_destination_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"do not truncate me").unwrap();

        assert!(cmd_encrypt_file(&gcm_config(), &path, &path).is_err());
        assert_eq!(std::fs::read(&path).unwrap(), b"do not truncate me");
    }

    // ── logging ────────────────────────────────────────────────────────────

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_config_warning_reaches_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("cframe.toml");

        let config = load_config(&missing).unwrap();
        assert_eq!(config.engine.mode, Mode::Gcm);

        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || log_config_source(&missing));

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("config file not found"), "{out}");
    }
}
