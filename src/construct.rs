//! Bulk construction of a [`StackEngine`] from the three tabular text
//! inputs: superpixel bounds, superpixel-to-segment map, segment-to-body
//! map.

use std::collections::{BTreeMap, HashMap, HashSet};

use stack_table::{Table, EMPTY};

use crate::engine::{StackEngine, NUM_SEGMENT_COLUMNS, NUM_SUPERPIXEL_COLUMNS};
use crate::error::ConstructError;
use crate::verify::verify;

const BOUNDS_Z: u32 = 0;
const BOUNDS_SPID: u32 = 1;
const BOUNDS_X: u32 = 2;
const BOUNDS_VOLUME: u32 = 6;

const SEGMENTS_Z: u32 = 0;
const SEGMENTS_SPID: u32 = 1;
const SEGMENTS_SEGID: u32 = 2;

const BODIES_SEGID: u32 = 0;
const BODIES_BODYID: u32 = 1;

const SP_SEGID: u32 = 5;

/// Per-category counts and bodies synthesized while absorbing illegally
/// zero-segment-mapped superpixels, reported back to the caller after a
/// successful [`construct`].
#[derive(Debug, Clone, Default)]
pub struct ConstructReport {
    pub orphans: u32,
    pub phantoms: u32,
    pub empty_segments: u32,
    pub empty_bodies: u32,
    pub remapped_zero_superpixels: u32,
    pub new_bodies: Vec<u32>,
}

struct SegmentRow {
    z: u32,
    spid: u32,
    segid: u32,
}

/// Build a [`StackEngine`] from the three ingest tables, then run
/// [`crate::verify::verify`] before handing it back.
///
/// `bounds` is 7 columns (`z, spid, x, y, width, height, volume`),
/// `segments` is 3 columns (`z, spid, segid`), `bodies` is 2 columns
/// (`segid, bodyid`).
pub fn construct(
    bounds: &Table,
    segments: &Table,
    bodies: &Table,
) -> Result<(StackEngine, ConstructReport), ConstructError> {
    let mut report = ConstructReport::default();

    let mut segment_rows: Vec<SegmentRow> = (0..segments.rows())
        .map(|i| {
            Ok(SegmentRow {
                z: segments.get(i, SEGMENTS_Z)?,
                spid: segments.get(i, SEGMENTS_SPID)?,
                segid: segments.get(i, SEGMENTS_SEGID)?,
            })
        })
        .collect::<Result<_, ConstructError>>()?;

    let mut body_rows: Vec<(u32, u32)> = (0..bodies.rows())
        .map(|i| Ok((bodies.get(i, BODIES_SEGID)?, bodies.get(i, BODIES_BODYID)?)))
        .collect::<Result<_, ConstructError>>()?;

    remap_zero_superpixels(&mut segment_rows, &mut body_rows, &mut report);

    if bounds.rows() == 0 {
        return Err(ConstructError::EmptyBounds);
    }

    let mut zmin = u32::MAX;
    let mut zmax = 0u32;
    let mut max_spid: BTreeMap<u32, u32> = BTreeMap::new();
    let mut bound_set: HashSet<(u32, u32)> = HashSet::with_capacity(bounds.rows() as usize);

    for i in 0..bounds.rows() {
        let z = bounds.get(i, BOUNDS_Z)?;
        let spid = bounds.get(i, BOUNDS_SPID)?;
        zmin = zmin.min(z);
        zmax = zmax.max(z);
        bound_set.insert((z, spid));
        max_spid
            .entry(z)
            .and_modify(|m| *m = (*m).max(spid))
            .or_insert(spid);
    }

    for z in zmin..=zmax {
        if !max_spid.contains_key(&z) {
            return Err(ConstructError::NonContiguousPlanes { zmin, zmax, missing: z });
        }
    }

    let mut seg_present: HashSet<(u32, u32)> = HashSet::with_capacity(segment_rows.len());
    for row in &segment_rows {
        seg_present.insert((row.z, row.spid));
    }

    let mut superpixels: BTreeMap<u32, Table> = max_spid
        .iter()
        .map(|(&z, &highest)| (z, Table::new(highest + 1, NUM_SUPERPIXEL_COLUMNS)))
        .collect();

    for i in 0..bounds.rows() {
        let z = bounds.get(i, BOUNDS_Z)?;
        let spid = bounds.get(i, BOUNDS_SPID)?;

        if !seg_present.contains(&(z, spid)) {
            let volume = bounds.get(i, BOUNDS_VOLUME)?;
            tracing::warn!(z, spid, volume, "orphan superpixel: bounds with no segment mapping");
            report.orphans += 1;
            continue;
        }

        let table = superpixels.get_mut(&z).expect("plane table sized from max_spid");
        for col in BOUNDS_X..=BOUNDS_VOLUME {
            let value = bounds.get(i, col)?;
            table.set(spid, col - BOUNDS_X, value)?;
        }
    }

    let mut max_segid = 0u32;
    for row in &segment_rows {
        if !bound_set.contains(&(row.z, row.spid)) {
            tracing::warn!(
                z = row.z,
                spid = row.spid,
                segid = row.segid,
                "phantom superpixel: segment mapping with no bounds"
            );
            report.phantoms += 1;
            continue;
        }

        let table = superpixels
            .get_mut(&row.z)
            .expect("plane table sized from max_spid");
        table.set(row.spid, SP_SEGID, row.segid)?;
        max_segid = max_segid.max(row.segid);
    }

    let mut segments_table = Table::new(max_segid + 1, NUM_SEGMENT_COLUMNS);
    let mut segment_plane: HashMap<u32, u32> = HashMap::new();

    for (&z, table) in &superpixels {
        for spid in 0..table.rows() {
            let segid = table.get(spid, SP_SEGID)?;
            if segid == EMPTY {
                continue;
            }

            if segid == 0 {
                // The zero segment legitimately spans every plane.
                continue;
            }

            match segment_plane.get(&segid) {
                Some(&existing) if existing != z => {
                    return Err(ConstructError::SegmentSpansMultiplePlanes {
                        segid,
                        first_plane: existing,
                        second_plane: z,
                    });
                }
                _ => {
                    segment_plane.insert(segid, z);
                }
            }
        }
    }

    for (&segid, &z) in &segment_plane {
        segments_table.set(segid, 0, z)?;
    }

    let mut unique_segments: HashSet<u32> = HashSet::with_capacity(body_rows.len());
    let mut segs_in_body: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    let mut pending_bodies: HashSet<u32> = HashSet::new();

    for &(segid, bodyid) in &body_rows {
        if !unique_segments.insert(segid) {
            return Err(ConstructError::DuplicateSegmentBody { segid });
        }

        if !segment_plane.contains_key(&segid) && segid != 0 {
            tracing::warn!(segid, "empty segment: mapped to a body but has no superpixels");
            report.empty_segments += 1;
            pending_bodies.insert(bodyid);
            continue;
        }

        segments_table.set(segid, 1, bodyid)?;
        segs_in_body.entry(bodyid).or_default().push(segid);
    }

    for bodyid in pending_bodies {
        if !segs_in_body.contains_key(&bodyid) {
            tracing::warn!(bodyid, "empty body: every mapped segment was dropped");
            report.empty_bodies += 1;
        }
    }

    let max_bodyid = segs_in_body.keys().copied().max().unwrap_or(0);
    let mut body_index = Table::new(max_bodyid + 1, 1);

    // Materialize the two arenas: per-segment superpixel lists in
    // plane-sweep order, then per-body segment lists.
    let mut spids_by_segment: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (&z, table) in &superpixels {
        for spid in 0..table.rows() {
            let segid = table.get(spid, SP_SEGID)?;
            if segid == EMPTY {
                continue;
            }
            let _ = z;
            spids_by_segment.entry(segid).or_default().push(spid);
        }
    }

    let mut segment_superpixels = stack_table::Arena::new();
    for (&segid, spids) in &spids_by_segment {
        let index = segment_superpixels.append_list(spids)?;
        segments_table.set(segid, 2, index)?;
    }

    let mut body_segments = stack_table::Arena::new();
    for (&bodyid, segids) in &segs_in_body {
        let index = body_segments.append_list(segids)?;
        body_index.set(bodyid, 0, index)?;
    }

    let mut engine = StackEngine::from_parts(
        superpixels,
        segments_table,
        segment_superpixels,
        body_index,
        body_segments,
    );

    verify(&mut engine, false)?;

    Ok((engine, report))
}

fn remap_zero_superpixels(
    segment_rows: &mut [SegmentRow],
    body_rows: &mut Vec<(u32, u32)>,
    report: &mut ConstructReport,
) {
    let mut max_segid = segment_rows.iter().map(|r| r.segid).max().unwrap_or(0);
    let mut max_bodyid = body_rows.iter().map(|&(_, b)| b).max().unwrap_or(0);

    for row in segment_rows.iter_mut() {
        if row.spid == 0 || row.segid != 0 {
            continue;
        }

        max_segid += 1;
        max_bodyid += 1;

        tracing::warn!(
            z = row.z,
            spid = row.spid,
            new_segid = max_segid,
            new_bodyid = max_bodyid,
            "remapped zero-segment superpixel"
        );

        row.segid = max_segid;
        body_rows.push((max_segid, max_bodyid));
        report.new_bodies.push(max_bodyid);
        report.remapped_zero_superpixels += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{read_bodies, read_bounds, read_segments};

    #[test]
    fn boundary_single_zero_segment_remap() {
        let bounds = read_bounds("0 1 0 0 2 2 4\n").unwrap();
        let segments = read_segments("0 1 0\n").unwrap();
        let bodies = read_bodies("").unwrap();

        let (engine, report) = construct(&bounds, &segments, &bodies).unwrap();

        assert_eq!(report.new_bodies, vec![1]);
        assert_eq!(engine.segment_of(0, 1).unwrap(), 1);
        assert_eq!(engine.body_of(1).unwrap(), 1);
    }

    #[test]
    fn drops_orphans_and_phantoms() {
        // spid=2 has bounds but no segment mapping (orphan).
        // spid=3 has a segment mapping but no bounds (phantom).
        let bounds = read_bounds("0 1 0 0 2 2 4\n0 2 0 0 2 2 4\n").unwrap();
        let segments = read_segments("0 1 5\n0 3 5\n").unwrap();
        let bodies = read_bodies("5 9\n").unwrap();

        let (engine, report) = construct(&bounds, &segments, &bodies).unwrap();

        assert_eq!(report.orphans, 1);
        assert_eq!(report.phantoms, 1);
        assert!(engine.has_superpixel(0, 1));
        assert!(!engine.has_superpixel(0, 3));
        assert_eq!(engine.superpixels_in_segment(5).unwrap(), vec![1]);
    }

    #[test]
    fn duplicate_segment_in_bodies_is_fatal() {
        let bounds = read_bounds("0 1 0 0 2 2 4\n").unwrap();
        let segments = read_segments("0 1 3\n").unwrap();
        let bodies = read_bodies("3 10\n3 11\n").unwrap();

        assert!(matches!(
            construct(&bounds, &segments, &bodies),
            Err(ConstructError::DuplicateSegmentBody { segid: 3 })
        ));
    }

    #[test]
    fn non_contiguous_planes_are_rejected() {
        let bounds = read_bounds("0 1 0 0 2 2 4\n2 1 0 0 2 2 4\n").unwrap();
        let segments = read_segments("0 1 3\n2 1 3\n").unwrap();
        let bodies = read_bodies("3 10\n").unwrap();

        assert!(matches!(
            construct(&bounds, &segments, &bodies),
            Err(ConstructError::NonContiguousPlanes { zmin: 0, zmax: 2, missing: 1 })
        ));
    }
}
