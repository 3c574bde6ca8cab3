use bytepair_rs::{decode_into, encode, Error};
use clap::{CommandFactory, Parser};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "bytepair", about = "Byte-pair grammar compressor", version)]
struct Cli {
    /// Encode a single file
    #[arg(short = 'e', num_args = 2, value_names = ["SOURCE", "DEST"])]
    encode: Option<Vec<PathBuf>>,

    /// Decode a single file
    #[arg(short = 'd', num_args = 2, value_names = ["SOURCE", "DEST"], conflicts_with = "encode")]
    decode: Option<Vec<PathBuf>>,

    /// Encode every file in a directory to <name>.bits
    #[arg(short = 'f', value_name = "DIR", conflicts_with_all = ["encode", "decode"])]
    folder: Option<PathBuf>,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn encode_file(source: &Path, dest: &Path) -> Result<(), Error> {
    let start = Instant::now();
    println!("Reading file: {}", source.display());
    let data = std::fs::read(source)?;

    let sink = BufWriter::new(File::create(dest)?);
    encode(&data, sink)?;

    let encoded_len = std::fs::metadata(dest)?.len();
    println!(
        "Encoded {} bytes to {} bytes ({:.1}%)",
        data.len(),
        encoded_len,
        if data.is_empty() {
            100.0
        } else {
            encoded_len as f64 / data.len() as f64 * 100.0
        }
    );
    println!("Encoding done in: {:.3} seconds", start.elapsed().as_secs_f64());
    Ok(())
}

fn decode_file(source: &Path, dest: &Path) -> Result<(), Error> {
    let start = Instant::now();
    let reader = BufReader::new(File::open(source)?);
    let mut sink = BufWriter::new(File::create(dest)?);
    decode_into(reader, &mut sink)?;
    println!("Decoding done in: {:.3} seconds", start.elapsed().as_secs_f64());
    Ok(())
}

fn encode_folder(dir: &Path) -> Result<(), Error> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_bits = path.extension().is_some_and(|e| e == "bits");
        if path.is_file() && !is_bits {
            let mut dest = path.clone().into_os_string();
            dest.push(".bits");
            encode_file(&path, Path::new(&dest))?;
        }
    }
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match (&cli.encode, &cli.decode, &cli.folder) {
        (Some(paths), None, None) => encode_file(&paths[0], &paths[1]),
        (None, Some(paths), None) => decode_file(&paths[0], &paths[1]),
        (None, None, Some(dir)) => encode_folder(dir),
        _ => {
            Cli::command().print_help().expect("help text");
            return;
        }
    };

    if let Err(error) = result {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
