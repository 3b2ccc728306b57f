//! Plain text reports on registry contents.

use std::io::Write;

use crate::error::{Error, Result};
use crate::refdb::{PointEntry, ReferenceStore};

const RULE_WIDTH: usize = 80;
const INFO_TEXT_WIDTH: usize = 80;

/// Report every point known as `ident`.
///
/// Identifier records are tried first, then the internal point id.
pub fn point_report<W: Write>(store: &ReferenceStore, ident: &str, out: &mut W) -> Result<()> {
    let mut points = store.points_by_ident(ident);
    if points.is_empty() {
        points.extend(store.point(ident));
    }
    if points.is_empty() {
        return Err(Error::PointNotFound {
            ident: ident.to_string(),
        });
    }

    let n = points.len();
    for (i, point) in points.into_iter().enumerate() {
        write_point(store, point, ident, i + 1, n, out)?;
    }
    Ok(())
}

fn write_point<W: Write>(
    store: &ReferenceStore,
    point: &PointEntry,
    ident: &str,
    i: usize,
    n: usize,
    out: &mut W,
) -> Result<()> {
    let rule = "-".repeat(RULE_WIDTH);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, " PUNKT {ident} ({i}/{n})")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "  FIRE ID             :  {}", point.id)?;
    writeln!(out, "  Oprettelsesdato     :  {}", point.created)?;
    writeln!(out)?;

    writeln!(out, "--- PUNKTINFO ---")?;
    for info in point.info.iter().filter(|info| info.valid_to.is_none()) {
        let text: String = info
            .text
            .as_deref()
            .unwrap_or("")
            .replace(['\n', '\r'], "")
            .chars()
            .take(INFO_TEXT_WIDTH)
            .collect();
        let number = info.number.map(|v| v.to_string()).unwrap_or_default();
        writeln!(out, "  {:20}:  {}{}", info.infotype, text, number)?;
    }
    writeln!(out)?;

    writeln!(out, "--- KOORDINATER ---")?;
    let srid_name = |sridid: i64| {
        store
            .srid_by_id(sridid)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| sridid.to_string())
    };
    let mut history: Vec<_> = point
        .coordinates
        .iter()
        .map(|coord| (srid_name(coord.sridid), coord))
        .collect();
    history.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, coord) in history {
        let date: String = coord.t.chars().take(10).collect();
        let name: String = name.chars().take(15).collect();
        let line = format!(
            "{}   {:<15} {}, {}, {}",
            date,
            name,
            fmt_optional(coord.x),
            fmt_optional(coord.y),
            fmt_optional(coord.z)
        );
        if coord.is_current() {
            writeln!(out, "   * {line}")?;
        } else {
            writeln!(out, "     {line}")?;
        }
    }
    writeln!(out)?;

    writeln!(out, "--- OBSERVATIONER ---")?;
    writeln!(out, "Antal observationer til:  {}", point.observations_to.len())?;
    writeln!(out, "Antal observationer fra:  {}", point.observations_from.len())?;
    // ISO timestamps order correctly as text
    let registered = point
        .observations_to
        .iter()
        .chain(&point.observations_from)
        .map(|obs| obs.registered.as_str());
    if let (Some(oldest), Some(newest)) = (registered.clone().min(), registered.max()) {
        writeln!(out, "Ældste observation     :  {oldest}")?;
        writeln!(out, "Nyeste observation     :  {newest}")?;
    }
    writeln!(out)?;
    Ok(())
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "None".to_string(), |v| v.to_string())
}

pub fn srid_report<W: Write>(store: &ReferenceStore, code: &str, out: &mut W) -> Result<()> {
    let srid = store.srid(code).ok_or_else(|| Error::ReferenceSystemNotFound {
        code: code.to_string(),
    })?;
    writeln!(out, "--- SRID ---")?;
    writeln!(out, " Name:       :  {}", srid.name)?;
    writeln!(out, " Description :  {}", srid.description)?;
    Ok(())
}

pub fn infotype_report<W: Write>(store: &ReferenceStore, name: &str, out: &mut W) -> Result<()> {
    let infotype = store.infotype(name).ok_or_else(|| Error::InfoTypeNotFound {
        name: name.to_string(),
    })?;
    writeln!(out, "--- PUNKTINFOTYPE ---")?;
    writeln!(out, "  Name        :  {}", infotype.name)?;
    writeln!(out, "  Description :  {}", infotype.description)?;
    writeln!(out, "  Type        :  {}", infotype.usage)?;
    Ok(())
}
