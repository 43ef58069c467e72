//! Cone tables as comma-separated text, one cone per line, in the column
//! order of `HEADER`.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use geometry::{Point, Vector};

use crate::cone::{ComptonCone, Frame};
use crate::{Error, Result};

pub const HEADER: &str = "EventID,Apex_X,Apex_Y,Apex_Z,Direction_X,Direction_Y,Direction_Z,cosT,error";

pub fn write_cones(cones: &[ComptonCone], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io_at(path, e))?;
    let mut out = BufWriter::new(file);
    write_table(cones, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn write_table(cones: &[ComptonCone], out: &mut impl Write) -> Result<()> {
    writeln!(out, "{HEADER}")?;
    for &ComptonCone { event_id, apex: a, direction: d, cos_theta, error_flag, .. } in cones {
        writeln!(out, "{event_id},{},{},{},{},{},{},{cos_theta},{error_flag}", a.x, a.y, a.z, d.x, d.y, d.z)?;
    }
    Ok(())
}

/// Read a cone table. The table does not record the cones' frame, so the
/// caller must supply it. A table without cones is an error.
pub fn read_cones(path: &Path, frame: Frame) -> Result<Vec<ComptonCone>> {
    let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
    read_table(BufReader::new(file), frame)
}

pub fn read_table(input: impl BufRead, frame: Frame) -> Result<Vec<ComptonCone>> {
    let mut lines = input.lines().enumerate().map(|(n, line)| (n + 1, line));
    let header = match lines.next() {
        Some((_, header)) => header?,
        None              => String::new(),
    };
    if header.trim() != HEADER {
        return Err(Error::Parse { line: 1, message: format!("expected header `{HEADER}`") })
    }
    let mut cones = vec![];
    for (line, text) in lines {
        let text = text?;
        if text.trim().is_empty() { continue }
        let cone = parse_row(&text, frame).map_err(|message| Error::Parse { line, message })?;
        cones.push(cone);
    }
    if cones.is_empty() { return Err(Error::EmptyInput { stage: "cones" }) }
    Ok(cones)
}

fn parse_row(text: &str, frame: Frame) -> std::result::Result<ComptonCone, String> {
    let fields: Vec<_> = text.split(',').map(str::trim).collect();
    let [id, ax, ay, az, dx, dy, dz, cos_theta, error_flag] = fields[..] else {
        return Err(format!("expected 9 columns, found {}", fields.len()))
    };
    let float = |s: &str| s.parse::<f32>().map_err(|e| format!("`{s}`: {e}"));
    let event_id = id.parse().map_err(|e| format!("event id `{id}`: {e}"))?;
    let apex = Point::new(float(ax)?, float(ay)?, float(az)?);
    let direction = Vector::new(float(dx)?, float(dy)?, float(dz)?);
    let cos_theta = float(cos_theta)?;
    let error_flag = float(error_flag)?;

    if !apex.is_finite() { return Err("apex is not finite".into()) }
    if !((direction.norm() - 1.0).abs() < 1e-3) {
        return Err(format!("direction ({dx}, {dy}, {dz}) is not a unit vector"))
    }
    if !(-1.0..=1.0).contains(&cos_theta) {
        return Err(format!("cosT {cos_theta} outside [-1, 1]"))
    }
    Ok(ComptonCone { event_id, apex, direction, cos_theta, error_flag, frame })
}
