use orthrus_reader::{OrthrusVolume, SECTOR_SIZE};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args.len() > 4 {
        eprintln!("Usage: {} <card-1-dump> <card-2-dump> [output-file]", args[0]);
        eprintln!("Writes the reconstructed plaintext to the output file, or to stdout.");
        std::process::exit(1);
    }

    let card1 = open_card(&args[1]);
    let card2 = open_card(&args[2]);

    let mut volume = match OrthrusVolume::open(card1, card2) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("Volume format: {:?}", volume.format_version());
    eprintln!("Volume ID:     {}", hex::encode(volume.volume_id()));

    // Plaintext goes to the named file, or to stdout so the output can
    // be piped into another tool for inspection.
    let stdout = io::stdout();
    let mut sink: Box<dyn Write> = match args.get(3) {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => {
                eprintln!("ERROR: cannot create {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Box::new(stdout.lock()),
    };

    match volume.decrypt_to(&mut sink) {
        Ok(sectors) => {
            if let Err(e) = sink.flush() {
                eprintln!("ERROR: flushing output failed: {}", e);
                std::process::exit(1);
            }
            eprintln!(
                "Decrypted {} sectors ({} bytes).",
                sectors,
                sectors * SECTOR_SIZE as u64
            );
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

fn open_card(path: &str) -> BufReader<File> {
    match File::open(path) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            eprintln!("ERROR: cannot open {}: {}", path, e);
            std::process::exit(1);
        }
    }
}
