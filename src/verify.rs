//! Consistency verification and optional repair of a [`StackEngine`]'s
//! cross-references.

use stack_table::EMPTY;

use crate::engine::StackEngine;
use crate::error::EngineError;

/// Bound on the number of discrepancies a single [`verify`] call records.
pub const MAX_ERRORS: usize = 30;

/// One consistency discrepancy found by [`verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// A segment row has some but not all of `z`/`bodyid`/`spindex` set to
    /// `EMPTY` — it should be either fully live or fully blank. Segment 0 is
    /// exempt from the `z` leg of this check: it spans every plane, so its
    /// `z` column stays `EMPTY` even while it's live.
    SegmentPartiallyEmpty { segid: u32 },
    /// A superpixel in a live segment's list does not point back to that
    /// segment.
    SuperpixelNotInSegmentList { segid: u32, z: u32, spid: u32 },
    /// A live segment's `bodyid` does not refer to a live body.
    SegmentBodyMissing { segid: u32, bodyid: u32 },
    /// A live segment does not appear in its own body's segment list.
    SegmentNotInBodyList { segid: u32, bodyid: u32 },
    /// A live superpixel has no segment assigned.
    SuperpixelMissingSegid { z: u32, spid: u32 },
}

/// Result of a [`verify`] pass: up to [`MAX_ERRORS`] issues, plus whether
/// more were found than fit.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub issues: Vec<Issue>,
    pub truncated: bool,
    pub repaired: u32,
}

impl VerifyReport {
    fn push(&mut self, issue: Issue) {
        if self.issues.len() >= MAX_ERRORS {
            self.truncated = true;
        } else {
            self.issues.push(issue);
        }
    }
}

/// Walk every cross-reference in `engine` and report discrepancies.
///
/// With `repair: true`, every live superpixel with no segment assigned is
/// fixed by creating a fresh body and segment for it, on its own plane —
/// the one repairable class the original tool supports.
pub fn verify(engine: &mut StackEngine, repair: bool) -> Result<VerifyReport, EngineError> {
    let mut report = VerifyReport::default();

    for g in 0..engine.segments.rows() {
        let z = engine.segments.get(g, 0)?;
        let bodyid = engine.segments.get(g, 1)?;
        let spindex = engine.segments.get(g, 2)?;

        // Segment 0 spans every plane, so its z column stays EMPTY by
        // design even while it's live — only bodyid/spindex need to agree.
        if g == 0 {
            if (bodyid == EMPTY) != (spindex == EMPTY) {
                report.push(Issue::SegmentPartiallyEmpty { segid: g });
            }
        } else {
            let empty_count = [z, bodyid, spindex].iter().filter(|&&v| v == EMPTY).count();
            if empty_count != 0 && empty_count != 3 {
                report.push(Issue::SegmentPartiallyEmpty { segid: g });
            }
        }

        if spindex == EMPTY {
            continue;
        }

        let spids = engine.segment_superpixels.read_list(spindex)?;
        if let Some(plane) = engine.superpixels.get(&z) {
            for &s in &spids {
                let segid_back = plane.get(s, 5).unwrap_or(EMPTY);
                if segid_back != g {
                    report.push(Issue::SuperpixelNotInSegmentList { segid: g, z, spid: s });
                }
            }
        }

        if bodyid == EMPTY {
            continue;
        }
        let body_has_row = bodyid < engine.body_index.rows()
            && engine.body_index.get(bodyid, 0)? != EMPTY;
        if !body_has_row {
            report.push(Issue::SegmentBodyMissing { segid: g, bodyid });
            continue;
        }

        let body_index_value = engine.body_index.get(bodyid, 0)?;
        let segs = engine.body_segments.read_list(body_index_value)?;
        if !segs.contains(&g) {
            report.push(Issue::SegmentNotInBodyList { segid: g, bodyid });
        }
    }

    let mut missing_segid: Vec<(u32, u32)> = Vec::new();
    for (&z, table) in &engine.superpixels {
        for s in 0..table.rows() {
            if table.get(s, 0)? == EMPTY {
                continue;
            }
            if table.get(s, 5)? == EMPTY {
                report.push(Issue::SuperpixelMissingSegid { z, spid: s });
                missing_segid.push((z, s));
            }
        }
    }

    if repair {
        for (z, s) in missing_segid {
            let b = engine.create_body()?;
            let g = engine.create_segment()?;
            engine.add_segments(&[g], b)?;
            engine.add_superpixel(z, s, g)?;
            report.repaired += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NUM_SUPERPIXEL_COLUMNS;
    use stack_table::Table;

    #[test]
    fn clean_engine_has_no_issues() {
        let mut engine = StackEngine::new();
        engine
            .superpixels
            .insert(0, Table::new(0, NUM_SUPERPIXEL_COLUMNS));
        let report = verify(&mut engine, false).unwrap();
        assert!(report.issues.is_empty());
        assert!(!report.truncated);
    }

    #[test]
    fn missing_segid_is_reported_and_repairable() {
        let mut engine = StackEngine::new();
        engine
            .superpixels
            .insert(0, Table::new(0, NUM_SUPERPIXEL_COLUMNS));
        let s = engine.create_superpixel(0).unwrap();
        engine
            .set_bounds_and_volume(
                0,
                s,
                crate::engine::Bounds {
                    x: 0,
                    y: 0,
                    width: 1,
                    height: 1,
                },
                1,
            )
            .unwrap();

        let report = verify(&mut engine, false).unwrap();
        assert_eq!(
            report.issues,
            vec![Issue::SuperpixelMissingSegid { z: 0, spid: s }]
        );

        let repaired = verify(&mut engine, true).unwrap();
        assert_eq!(repaired.repaired, 1);
        assert!(engine.segment_of(0, s).unwrap() != EMPTY);

        let clean = verify(&mut engine, false).unwrap();
        assert!(clean.issues.is_empty());
    }

    #[test]
    fn zero_segment_is_not_flagged_partially_empty() {
        let mut engine = StackEngine::new();
        engine
            .superpixels
            .insert(0, Table::new(1, NUM_SUPERPIXEL_COLUMNS));

        let zero_segment = engine.create_segment().unwrap();
        assert_eq!(zero_segment, 0);

        let _unused_zero_body = engine.create_body().unwrap();
        let body = engine.create_body().unwrap();
        engine.add_segments(&[zero_segment], body).unwrap();

        let report = verify(&mut engine, false).unwrap();
        assert!(report.issues.is_empty());
    }
}
