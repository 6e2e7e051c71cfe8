//! Shared plumbing for the entity family modules.

use crate::datastore::Datastore;
use crate::io::{read_string, read_vec, write_string, write_vec};
use anyhow::{bail, Result};
use std::io::{BufRead, Write};

/// Write the named int-vector maps in order.
pub(crate) fn write_maps<W: Write>(ds: &Datastore, names: &[&str], w: &mut W) -> Result<()> {
    for name in names {
        write_vec(w, &ds.caccess_intv(name))?;
    }
    Ok(())
}

/// Read the named int-vector maps in order.
pub(crate) fn read_maps<R: BufRead>(ds: &Datastore, names: &[&str], r: &mut R) -> Result<()> {
    for name in names {
        *ds.access_intv(name) = read_vec(r)?;
    }
    Ok(())
}

/// Resize the named int-vector maps to `total`.
pub(crate) fn resize_maps(ds: &Datastore, names: &[&str], total: usize) {
    for name in names {
        ds.access_intv(name).resize(total, 0);
    }
}

/// Compare the named maps across two datastores.
pub(crate) fn maps_eq(ds: &Datastore, other: &Datastore, names: &[&str]) -> bool {
    names
        .iter()
        .all(|name| *ds.caccess_intv(name) == *other.caccess_intv(name))
}

/// Read a family tag string and fail on mismatch.
pub(crate) fn expect_tag<R: BufRead>(r: &mut R, want: &str) -> Result<()> {
    let tag = read_string(r)?;
    if tag != want {
        bail!("unexpected entity tag {tag:?}, wanted {want:?}");
    }
    Ok(())
}

/// Write a family tag string.
pub(crate) fn write_tag<W: Write>(w: &mut W, tag: &str) -> Result<()> {
    write_string(w, tag)
}
