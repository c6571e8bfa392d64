
use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Opens a file for reading, transparently decoding gzip when the extension is ".gz"
fn open_reader(filename: &Path) -> std::io::Result<Box<dyn std::io::Read>> {
    let file = File::open(filename)?;
    if filename.extension().unwrap_or_default() == "gz" {
        Ok(Box::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Creates a file for writing, transparently encoding gzip when the extension is ".gz"
fn create_writer(filename: &Path) -> std::io::Result<Box<dyn std::io::Write>> {
    let file = File::create(filename)?;
    if filename.extension().unwrap_or_default() == "gz" {
        Ok(Box::new(flate2::write::GzEncoder::new(file, flate2::Compression::best())))
    } else {
        Ok(Box::new(file))
    }
}

/// Helper function that loads a JSON file into some deserializable type.
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let reader = BufReader::new(
        open_reader(filename)
            .with_context(|| format!("Error while opening {filename:?}:"))?
    );
    let result: T = serde_json::from_reader(reader)
        .with_context(|| format!("Error while deserializing {filename:?}:"))?;
    Ok(result)
}

/// This will save a generic serializable struct to pretty-printed JSON.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - user provided path to write to
/// # Errors
/// * if opening or writing to the file throw errors
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(
        create_writer(out_filename)
            .with_context(|| format!("Error while creating {out_filename:?}:"))?
    );
    serde_json::to_writer_pretty(&mut writer, data)
        .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
    // end the file with a newline so downstream text tooling behaves
    writeln!(writer)
        .with_context(|| format!("Error while writing to {out_filename:?}:"))?;
    writer.flush()
        .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    Ok(())
}
