//! Binary mesh-dump primitives and rank-file helpers.
//!
//! The per-PE mesh dump is a pinned little-endian format: a scalar is the
//! raw bytes of its native representation; a vector is a `u64` length,
//! the packed payload, and a single `\n` terminator; a string is written
//! like a byte vector; a ragged container is its begin-index vector,
//! end-index vector, and data vector, in that order. Compound records
//! (neighbor lists, subsets, entity families) frame themselves out of
//! these primitives in their own modules.
//!
//! Reading is the exact inverse, and `read(write(x)) == x` bitwise.
//! There is no versioned schema: dumps are round-trip compatible within
//! a single build only.

use crate::mesh::Mesh;
use crate::ragged::Ragged;
use crate::vec3::Vec3;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A fixed-size element of the wire format.
pub trait WireElem: Sized + Copy + Default {
    /// Encoded size in bytes.
    const SIZE: usize;
    /// Encode into exactly [`Self::SIZE`] bytes.
    fn put_le(&self, buf: &mut [u8]);
    /// Decode from exactly [`Self::SIZE`] bytes.
    fn get_le(buf: &[u8]) -> Self;
}

macro_rules! wire_prim {
    ($($t:ty),*) => {$(
        impl WireElem for $t {
            const SIZE: usize = std::mem::size_of::<$t>();
            fn put_le(&self, buf: &mut [u8]) {
                buf.copy_from_slice(&self.to_le_bytes());
            }
            fn get_le(buf: &[u8]) -> Self {
                <$t>::from_le_bytes(buf.try_into().expect("wire element size"))
            }
        }
    )*};
}

wire_prim!(i16, i32, u64, f64);

impl WireElem for Vec3 {
    const SIZE: usize = 24;
    fn put_le(&self, buf: &mut [u8]) {
        for i in 0..3 {
            self.0[i].put_le(&mut buf[i * 8..(i + 1) * 8]);
        }
    }
    fn get_le(buf: &[u8]) -> Self {
        Vec3::new(
            f64::get_le(&buf[0..8]),
            f64::get_le(&buf[8..16]),
            f64::get_le(&buf[16..24]),
        )
    }
}

/// Write one scalar, raw.
pub fn write_scalar<T: WireElem, W: Write>(w: &mut W, v: T) -> Result<()> {
    let mut buf = [0u8; 24];
    v.put_le(&mut buf[..T::SIZE]);
    w.write_all(&buf[..T::SIZE])?;
    Ok(())
}

/// Read one scalar, raw.
pub fn read_scalar<T: WireElem, R: BufRead>(r: &mut R) -> Result<T> {
    let mut buf = [0u8; 24];
    r.read_exact(&mut buf[..T::SIZE])
        .context("short read in binary scalar")?;
    Ok(T::get_le(&buf[..T::SIZE]))
}

/// Consume the rest of the current line, including the `\n`.
pub fn skip_line<R: BufRead>(r: &mut R) -> Result<()> {
    let mut sink = Vec::new();
    r.read_until(b'\n', &mut sink)?;
    Ok(())
}

pub(crate) fn write_terminator<W: Write>(w: &mut W) -> Result<()> {
    w.write_all(b"\n")?;
    Ok(())
}

/// Write a vector: `u64` length, packed payload, `\n`.
pub fn write_vec<T: WireElem, W: Write>(w: &mut W, data: &[T]) -> Result<()> {
    write_scalar(w, data.len() as u64)?;
    if !data.is_empty() {
        let mut payload = vec![0u8; data.len() * T::SIZE];
        for (i, v) in data.iter().enumerate() {
            v.put_le(&mut payload[i * T::SIZE..(i + 1) * T::SIZE]);
        }
        w.write_all(&payload)?;
    }
    write_terminator(w)
}

/// Read a vector written by [`write_vec`].
pub fn read_vec<T: WireElem, R: BufRead>(r: &mut R) -> Result<Vec<T>> {
    let len = read_scalar::<u64, R>(r)? as usize;
    let mut data = Vec::with_capacity(len);
    if len > 0 {
        let mut payload = vec![0u8; len * T::SIZE];
        r.read_exact(&mut payload)
            .context("short read in binary vector")?;
        for i in 0..len {
            data.push(T::get_le(&payload[i * T::SIZE..(i + 1) * T::SIZE]));
        }
    }
    skip_line(r)?;
    Ok(data)
}

/// Write a string as a byte vector.
pub fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    write_scalar(w, s.len() as u64)?;
    if !s.is_empty() {
        w.write_all(s.as_bytes())?;
    }
    write_terminator(w)
}

/// Read a string written by [`write_string`].
pub fn read_string<R: BufRead>(r: &mut R) -> Result<String> {
    let len = read_scalar::<u64, R>(r)? as usize;
    let mut bytes = vec![0u8; len];
    r.read_exact(&mut bytes)
        .context("short read in binary string")?;
    skip_line(r)?;
    String::from_utf8(bytes).context("binary string is not UTF-8")
}

/// Write a ragged container: begin indices, end indices, data.
///
/// Row indices go onto the wire as 32-bit ints.
pub fn write_ragged<T: WireElem + Clone, W: Write>(w: &mut W, rag: &Ragged<T>) -> Result<()> {
    let (begin, end, data) = rag.raw_parts();
    let begin32: Vec<i32> = begin.iter().map(|&v| v as i32).collect();
    let end32: Vec<i32> = end.iter().map(|&v| v as i32).collect();
    write_vec(w, &begin32)?;
    write_vec(w, &end32)?;
    write_vec(w, data)
}

/// Read a ragged container written by [`write_ragged`].
pub fn read_ragged<T: WireElem + Clone, R: BufRead>(r: &mut R) -> Result<Ragged<T>> {
    let begin: Vec<i32> = read_vec(r)?;
    let end: Vec<i32> = read_vec(r)?;
    let data: Vec<T> = read_vec(r)?;
    Ok(Ragged::from_raw_parts(
        begin.into_iter().map(|v| v as usize).collect(),
        end.into_iter().map(|v| v as usize).collect(),
        data,
    ))
}

/// The canonical dump name for one rank of a decomposed mesh.
pub fn rank_file_name(basename: &str, pe: i32) -> String {
    format!("{basename}.{pe}.ume")
}

/// Enumerate the per-rank dump files for `basename`, sorted by PE.
///
/// Matches `<basename>.<pe>.ume` in the basename's directory; files
/// without a numeric rank component are ignored.
pub fn discover_rank_files(basename: &str) -> Result<Vec<(i32, PathBuf)>> {
    let pattern = format!("{basename}.*.ume");
    let rank_re = regex::Regex::new(r"\.([0-9]+)\.ume$").expect("rank file pattern");
    let mut found = Vec::new();
    for entry in glob::glob(&pattern).context("bad rank-file pattern")? {
        let path = entry?;
        let name = path.to_string_lossy().into_owned();
        if let Some(caps) = rank_re.captures(&name) {
            let pe: i32 = caps[1].parse()?;
            found.push((pe, path));
        }
    }
    if found.is_empty() {
        bail!("no rank files matching {pattern}");
    }
    found.sort_by_key(|&(pe, _)| pe);
    Ok(found)
}

/// Read one rank's mesh dump.
pub fn read_mesh<P: AsRef<Path>>(path: P, comm: Rc<dyn crate::comm::Transport>) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut r = BufReader::new(file);
    Mesh::read_bin(&mut r, comm).with_context(|| format!("reading {}", path.display()))
}

/// Write one rank's mesh dump.
pub fn write_mesh<P: AsRef<Path>>(path: P, mesh: &Mesh) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    mesh.write_bin(&mut w)?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip_vec<T: WireElem + Clone + PartialEq + std::fmt::Debug>(data: &[T]) {
        let mut buf = Vec::new();
        write_vec(&mut buf, data).unwrap();
        let back: Vec<T> = read_vec(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn scalar_roundtrips_bitwise() {
        let mut buf = Vec::new();
        write_scalar(&mut buf, -12345i32).unwrap();
        write_scalar(&mut buf, 7u64).unwrap();
        write_scalar(&mut buf, -2i16).unwrap();
        write_scalar(&mut buf, 0.1f64).unwrap();
        let mut r = Cursor::new(&buf);
        assert_eq!(read_scalar::<i32, _>(&mut r).unwrap(), -12345);
        assert_eq!(read_scalar::<u64, _>(&mut r).unwrap(), 7);
        assert_eq!(read_scalar::<i16, _>(&mut r).unwrap(), -2);
        assert_eq!(
            read_scalar::<f64, _>(&mut r).unwrap().to_bits(),
            0.1f64.to_bits()
        );
    }

    #[test]
    fn vectors_roundtrip_for_every_element_kind() {
        roundtrip_vec::<i16>(&[1, -2, 3]);
        roundtrip_vec::<i32>(&[]);
        roundtrip_vec::<i32>(&[i32::MIN, 0, i32::MAX]);
        roundtrip_vec::<f64>(&[0.0, -0.0, 1.5e-300, f64::MAX]);
        roundtrip_vec::<Vec3>(&[Vec3::new(1.0, 2.0, 3.0), Vec3::zero()]);
    }

    #[test]
    fn vector_payload_can_contain_newlines() {
        // 0x0a bytes inside the payload must not confuse the framing.
        roundtrip_vec::<i32>(&[0x0a, 0x0a0a, 10]);
    }

    #[test]
    fn strings_roundtrip() {
        for s in ["", "points", "a longer tag with spaces"] {
            let mut buf = Vec::new();
            write_string(&mut buf, s).unwrap();
            assert_eq!(read_string(&mut Cursor::new(&buf)).unwrap(), s);
        }
    }

    #[test]
    fn ragged_roundtrips_with_orphaned_rows() {
        let mut rag: Ragged<f64> = Ragged::new(3);
        rag.assign(0, &[1.0, 2.0]);
        rag.assign(2, &[3.0]);
        rag.assign(0, &[4.0]); // orphans the first row-0 block
        let mut buf = Vec::new();
        write_ragged(&mut buf, &rag).unwrap();
        let back: Ragged<f64> = read_ragged(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back, rag);
    }

    #[test]
    fn rank_file_names() {
        assert_eq!(rank_file_name("mesh/box", 3), "mesh/box.3.ume");
    }
}
