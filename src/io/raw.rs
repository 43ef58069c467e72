//! Read / write float arrays as raw little-endian binary, the format expected
//! by external volume viewers

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::{Error, Result};

pub fn write(data: impl IntoIterator<Item = f32>, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io_at(path, e))?;
    let mut buf = BufWriter::new(file);
    for datum in data {
        buf.write_all(&datum.to_le_bytes())?;
    }
    buf.flush()?;
    Ok(())
}

/// Every value in the file. A trailing partial value is an error.
pub fn read(path: &Path) -> Result<Vec<f32>> {
    let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
    let mut bytes = vec![];
    BufReader::new(file).read_to_end(&mut bytes)?;
    if bytes.len() % 4 != 0 {
        return Err(Error::geometry(format!(
            "`{}` holds {} bytes, not a whole number of f32", path.display(), bytes.len())))
    }
    Ok(bytes
       .chunks_exact(4)
       .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
       .collect())
}
