//! The three-level superpixel/segment/body mapping engine.
//!
//! A [`StackEngine`] owns every table and arena involved in the mapping: a
//! per-plane superpixel table, the segment table, the body-index table, and
//! the two list-of-lists arenas that back the segment→superpixels and
//! body→segments relationships. Nothing here is shared across instances.

use std::collections::BTreeMap;

use stack_table::{Arena, ContainerReader, ContainerWriter, EMPTY, Table};

use crate::error::EngineError;

const SP_X: u32 = 0;
const SP_Y: u32 = 1;
const SP_WIDTH: u32 = 2;
const SP_HEIGHT: u32 = 3;
const SP_VOLUME: u32 = 4;
const SP_SEGID: u32 = 5;
pub(crate) const NUM_SUPERPIXEL_COLUMNS: u32 = 6;

const SEG_Z: u32 = 0;
const SEG_BODYID: u32 = 1;
const SEG_SPINDEX: u32 = 2;
pub(crate) const NUM_SEGMENT_COLUMNS: u32 = 3;

/// Axis-aligned bounding box of a superpixel, in plane-local pixel
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The in-memory superpixel/segment/body mapping and its cross-references.
#[derive(Debug, Clone)]
pub struct StackEngine {
    pub(crate) superpixels: BTreeMap<u32, Table>,
    pub(crate) segments: Table,
    pub(crate) segment_superpixels: Arena,
    pub(crate) body_index: Table,
    pub(crate) body_segments: Arena,
}

impl StackEngine {
    /// An engine with no planes, segments or bodies.
    pub fn new() -> Self {
        Self {
            superpixels: BTreeMap::new(),
            segments: Table::new(0, NUM_SEGMENT_COLUMNS),
            segment_superpixels: Arena::new(),
            body_index: Table::new(0, 1),
            body_segments: Arena::new(),
        }
    }

    /// Build an engine directly from its five constituent tables, e.g. after
    /// reconstructing them from a bulk ingest or a container load.
    pub(crate) fn from_parts(
        superpixels: BTreeMap<u32, Table>,
        segments: Table,
        segment_superpixels: Arena,
        body_index: Table,
        body_segments: Arena,
    ) -> Self {
        Self {
            superpixels,
            segments,
            segment_superpixels,
            body_index,
            body_segments,
        }
    }

    fn plane_table(&self, z: u32) -> Result<&Table, EngineError> {
        self.superpixels.get(&z).ok_or(EngineError::AbsentPlane(z))
    }

    fn plane_table_mut(&mut self, z: u32) -> Result<&mut Table, EngineError> {
        self.superpixels
            .get_mut(&z)
            .ok_or(EngineError::AbsentPlane(z))
    }

    /// Raw segment plane column, without the "zero segment has no plane"
    /// special case `plane_of` enforces. Used to prune a multi-plane body's
    /// segments by plane, mirroring the original's direct column reads.
    fn raw_segment_plane(&self, g: u32) -> Result<u32, EngineError> {
        if !self.has_segment(g) {
            return Err(EngineError::AbsentSegment(g));
        }
        Ok(self.segments.get(g, SEG_Z)?)
    }

    // ---- queries ----------------------------------------------------

    pub fn zmin(&self) -> Option<u32> {
        self.superpixels.keys().next().copied()
    }

    pub fn zmax(&self) -> Option<u32> {
        self.superpixels.keys().next_back().copied()
    }

    pub fn has_superpixel(&self, z: u32, s: u32) -> bool {
        self.superpixels
            .get(&z)
            .is_some_and(|table| s < table.rows() && table.get(s, SP_X).unwrap_or(EMPTY) != EMPTY)
    }

    pub fn has_segment(&self, g: u32) -> bool {
        g < self.segments.rows() && self.segments.get(g, SEG_SPINDEX).unwrap_or(EMPTY) != EMPTY
    }

    pub fn has_body(&self, b: u32) -> bool {
        b < self.body_index.rows() && self.body_index.get(b, 0).unwrap_or(EMPTY) != EMPTY
    }

    pub fn bounds(&self, z: u32, s: u32) -> Result<Bounds, EngineError> {
        if !self.has_superpixel(z, s) {
            return Err(EngineError::AbsentSuperpixel { z, spid: s });
        }

        let table = self.plane_table(z)?;
        Ok(Bounds {
            x: table.get(s, SP_X)?,
            y: table.get(s, SP_Y)?,
            width: table.get(s, SP_WIDTH)?,
            height: table.get(s, SP_HEIGHT)?,
        })
    }

    pub fn volume(&self, z: u32, s: u32) -> Result<u32, EngineError> {
        if !self.has_superpixel(z, s) {
            return Err(EngineError::AbsentSuperpixel { z, spid: s });
        }
        Ok(self.plane_table(z)?.get(s, SP_VOLUME)?)
    }

    pub fn segment_of(&self, z: u32, s: u32) -> Result<u32, EngineError> {
        if !self.has_superpixel(z, s) {
            return Err(EngineError::AbsentSuperpixel { z, spid: s });
        }
        Ok(self.plane_table(z)?.get(s, SP_SEGID)?)
    }

    pub fn plane_of(&self, g: u32) -> Result<u32, EngineError> {
        if g == 0 {
            return Err(EngineError::ZeroSegmentHasNoPlane);
        }
        if !self.has_segment(g) {
            return Err(EngineError::AbsentSegment(g));
        }
        Ok(self.segments.get(g, SEG_Z)?)
    }

    pub fn body_of(&self, g: u32) -> Result<u32, EngineError> {
        if !self.has_segment(g) {
            return Err(EngineError::AbsentSegment(g));
        }
        Ok(self.segments.get(g, SEG_BODYID)?)
    }

    pub fn superpixels_in_segment(&self, g: u32) -> Result<Vec<u32>, EngineError> {
        if !self.has_segment(g) {
            return Err(EngineError::AbsentSegment(g));
        }
        let index = self.segments.get(g, SEG_SPINDEX)?;
        Ok(self.segment_superpixels.read_list(index)?)
    }

    pub fn segments_in_body(&self, b: u32) -> Result<Vec<u32>, EngineError> {
        if !self.has_body(b) {
            return Err(EngineError::AbsentBody(b));
        }
        let index = self.body_index.get(b, 0)?;
        Ok(self.body_segments.read_list(index)?)
    }

    pub fn superpixels_in_plane(&self, z: u32) -> Result<Vec<u32>, EngineError> {
        let table = self.plane_table(z)?;
        Ok((0..table.rows())
            .filter(|&s| table.get(s, SP_X).unwrap_or(EMPTY) != EMPTY)
            .collect())
    }

    pub fn superpixel_bodies_in_plane(&self, z: u32) -> Result<Vec<u32>, EngineError> {
        let table = self.plane_table(z)?;
        let mut result = Vec::new();
        for s in 0..table.rows() {
            if table.get(s, SP_X)? == EMPTY {
                continue;
            }
            let segid = table.get(s, SP_SEGID)?;
            result.push(self.body_of(segid)?);
        }
        Ok(result)
    }

    pub fn superpixels_in_body(&self, b: u32) -> Result<Vec<(u32, u32)>, EngineError> {
        let mut result = Vec::new();
        for g in self.segments_in_body(b)? {
            let z = self.raw_segment_plane(g)?;
            for s in self.superpixels_in_segment(g)? {
                result.push((z, s));
            }
        }
        Ok(result)
    }

    pub fn superpixels_in_body_in_plane(&self, b: u32, z: u32) -> Result<Vec<u32>, EngineError> {
        let mut result = Vec::new();
        for g in self.segments_in_body(b)? {
            if self.raw_segment_plane(g)? != z {
                continue;
            }
            result.extend(self.superpixels_in_segment(g)?);
        }
        Ok(result)
    }

    pub fn num_bodies(&self) -> u32 {
        (0..self.body_index.rows())
            .filter(|&b| self.body_index.get(b, 0).unwrap_or(EMPTY) != EMPTY)
            .count() as u32
    }

    pub fn num_bodies_nonzero(&self) -> u32 {
        (1..self.body_index.rows())
            .filter(|&b| self.body_index.get(b, 0).unwrap_or(EMPTY) != EMPTY)
            .count() as u32
    }

    pub fn num_segments(&self) -> u32 {
        (0..self.segments.rows())
            .filter(|&g| self.segments.get(g, SEG_SPINDEX).unwrap_or(EMPTY) != EMPTY)
            .count() as u32
    }

    pub fn all_segments(&self) -> Vec<u32> {
        (0..self.segments.rows())
            .filter(|&g| self.segments.get(g, SEG_SPINDEX).unwrap_or(EMPTY) != EMPTY)
            .collect()
    }

    pub fn all_bodies(&self) -> Vec<u32> {
        (0..self.body_index.rows())
            .filter(|&b| self.body_index.get(b, 0).unwrap_or(EMPTY) != EMPTY)
            .collect()
    }

    pub fn num_superpixels_in_plane(&self, z: u32) -> Result<u32, EngineError> {
        Ok(self.superpixels_in_plane(z)?.len() as u32)
    }

    pub fn num_superpixels_in_body(&self, b: u32) -> Result<u32, EngineError> {
        Ok(self.superpixels_in_body(b)?.len() as u32)
    }

    pub fn max_superpixel_id(&self, z: u32) -> Result<u32, EngineError> {
        Ok(self.plane_table(z)?.rows().saturating_sub(1))
    }

    pub fn plane_limits(&self, b: u32) -> Result<(u32, u32), EngineError> {
        let mut zmin = u32::MAX;
        let mut zmax = 0u32;
        for g in self.segments_in_body(b)? {
            if g == 0 {
                continue;
            }
            let z = self.raw_segment_plane(g)?;
            zmin = zmin.min(z);
            zmax = zmax.max(z);
        }
        if zmin > zmax {
            return Ok((0, 0));
        }
        Ok((zmin, zmax))
    }

    pub fn all_plane_limits(&self) -> Result<Vec<(u32, (u32, u32))>, EngineError> {
        self.all_bodies()
            .into_iter()
            .filter(|&b| b != 0)
            .map(|b| Ok((b, self.plane_limits(b)?)))
            .collect()
    }

    pub fn body_volume(&self, b: u32) -> Result<u64, EngineError> {
        let mut total = 0u64;
        for (z, s) in self.superpixels_in_body(b)? {
            total += self.volume(z, s)? as u64;
        }
        Ok(total)
    }

    pub fn body_bounds(&self, b: u32) -> Result<Vec<(u32, Bounds)>, EngineError> {
        self.superpixels_in_body(b)?
            .into_iter()
            .map(|(z, s)| Ok((z, self.bounds(z, s)?)))
            .collect()
    }

    // ---- mutations ----------------------------------------------------

    pub fn create_superpixel(&mut self, z: u32) -> Result<u32, EngineError> {
        Ok(self.plane_table_mut(z)?.append_rows(1)?)
    }

    pub fn set_bounds_and_volume(
        &mut self,
        z: u32,
        s: u32,
        bounds: Bounds,
        volume: u32,
    ) -> Result<(), EngineError> {
        let table = self.plane_table_mut(z)?;
        table.set(s, SP_X, bounds.x)?;
        table.set(s, SP_Y, bounds.y)?;
        table.set(s, SP_WIDTH, bounds.width)?;
        table.set(s, SP_HEIGHT, bounds.height)?;
        table.set(s, SP_VOLUME, volume)?;
        Ok(())
    }

    pub fn add_superpixel(&mut self, z: u32, s: u32, g: u32) -> Result<(), EngineError> {
        if g == 0 {
            return Err(EngineError::ZeroSegmentAssignment);
        }
        if !self.has_segment(g) {
            return Err(EngineError::AbsentSegment(g));
        }

        let mut spids = self.superpixels_in_segment(g)?;
        if !spids.is_empty() {
            let segment_plane = self.raw_segment_plane(g)?;
            if segment_plane != z {
                return Err(EngineError::PlaneMismatch {
                    segment_plane,
                    attempted_plane: z,
                });
            }
        }

        self.plane_table_mut(z)?.set(s, SP_SEGID, g)?;

        if !spids.contains(&s) {
            spids.push(s);
            self.set_superpixels(g, z, &spids)?;
        }

        Ok(())
    }

    pub fn set_segment_id(&mut self, z: u32, s: u32, g: u32) -> Result<(), EngineError> {
        if g == 0 {
            return Err(EngineError::ZeroSegmentAssignment);
        }
        self.plane_table_mut(z)?.set(s, SP_SEGID, g)?;
        Ok(())
    }

    pub fn create_segment(&mut self) -> Result<u32, EngineError> {
        let g = self.segments.append_rows(1)?;
        self.set_superpixels(g, EMPTY, &[])?;
        Ok(g)
    }

    pub fn set_superpixels(&mut self, g: u32, z: u32, spids: &[u32]) -> Result<(), EngineError> {
        if g >= self.segments.rows() {
            return Err(EngineError::AbsentSegment(g));
        }
        if z != EMPTY && !self.superpixels.contains_key(&z) {
            return Err(EngineError::AbsentPlane(z));
        }

        let index = self.segment_superpixels.append_list(spids)?;
        self.segments.set(g, SEG_Z, z)?;
        self.segments.set(g, SEG_SPINDEX, index)?;
        Ok(())
    }

    fn write_segments_list(&mut self, b: u32, segids: &[u32]) -> Result<(), EngineError> {
        let index = self.body_segments.append_list(segids)?;
        self.body_index.set(b, 0, index)?;
        Ok(())
    }

    pub fn create_body(&mut self) -> Result<u32, EngineError> {
        let b = self.body_index.append_rows(1)?;
        self.write_segments_list(b, &[])?;
        Ok(b)
    }

    pub fn add_segments(&mut self, segids: &[u32], b: u32) -> Result<(), EngineError> {
        if b == 0 {
            return Err(EngineError::ZeroBodyAssignment);
        }
        if !self.has_body(b) {
            return Err(EngineError::AbsentBody(b));
        }

        let mut existing = self.segments_in_body(b)?;
        for &g in segids {
            if !self.has_segment(g) {
                return Err(EngineError::AbsentSegment(g));
            }
            self.segments.set(g, SEG_BODYID, b)?;
            if !existing.contains(&g) {
                existing.push(g);
            }
        }

        self.write_segments_list(b, &existing)
    }

    fn remove_superpixel_from_segment(&mut self, z: u32, s: u32) -> Result<(), EngineError> {
        let g = self.segment_of(z, s)?;
        let mut spids = self.superpixels_in_segment(g)?;
        spids.retain(|&spid| spid != s);
        self.set_superpixels(g, z, &spids)
    }

    fn remove_segment_from_body(&mut self, g: u32) -> Result<(), EngineError> {
        let b = self.body_of(g)?;
        let mut segids = self.segments_in_body(b)?;
        segids.retain(|&segid| segid != g);
        self.write_segments_list(b, &segids)
    }

    pub fn delete_segment(&mut self, g: u32) -> Result<(), EngineError> {
        if !self.has_segment(g) {
            return Ok(());
        }

        self.remove_segment_from_body(g)?;

        // Blank the row. Its superpixel list is left orphaned for the next
        // compaction.
        self.segments.set(g, SEG_Z, EMPTY)?;
        self.segments.set(g, SEG_BODYID, EMPTY)?;
        self.segments.set(g, SEG_SPINDEX, EMPTY)?;
        Ok(())
    }

    // ---- garbage collection --------------------------------------------

    /// Remove zero-volume superpixels, then segments and bodies left empty
    /// as a result, then compact both arenas. Run unconditionally by
    /// [`StackEngine::save`] unless the save is a backup.
    pub fn garbage_collect(&mut self) -> Result<(), EngineError> {
        let planes: Vec<u32> = self.superpixels.keys().copied().collect();
        for z in planes {
            let rows = self.plane_table(z)?.rows();
            for s in 0..rows {
                let table = self.plane_table(z)?;
                if table.get(s, SP_X)? == EMPTY || table.get(s, SP_VOLUME)? != 0 {
                    continue;
                }

                self.remove_superpixel_from_segment(z, s)?;

                let table = self.plane_table_mut(z)?;
                table.set(s, SP_X, EMPTY)?;
                table.set(s, SP_Y, EMPTY)?;
                table.set(s, SP_WIDTH, EMPTY)?;
                table.set(s, SP_HEIGHT, EMPTY)?;
                table.set(s, SP_VOLUME, EMPTY)?;
                table.set(s, SP_SEGID, EMPTY)?;
            }
        }

        for g in 0..self.segments.rows() {
            let spindex = self.segments.get(g, SEG_SPINDEX)?;
            if spindex != EMPTY && self.segment_superpixels.read_list(spindex)?.is_empty() {
                self.delete_segment(g)?;
            }
        }

        for b in 0..self.body_index.rows() {
            let bodyindex = self.body_index.get(b, 0)?;
            if bodyindex != EMPTY && self.body_segments.read_list(bodyindex)?.is_empty() {
                tracing::trace!(body = b, "deleting empty body");
                self.body_index.set(b, 0, EMPTY)?;
            }
        }

        self.segment_superpixels
            .compress(&mut self.segments, SEG_SPINDEX)?;
        self.body_segments.compress(&mut self.body_index, 0)?;

        Ok(())
    }

    // ---- load/save ------------------------------------------------------

    /// Load an engine from a previously saved container.
    pub fn load<R: std::io::Read + std::io::Seek>(
        reader: R,
    ) -> Result<Self, EngineError> {
        let mut container = ContainerReader::open(reader)?;

        let mut planes: Vec<u32> = Vec::new();
        for name in container.dataset_names() {
            if let Some(suffix) = name.strip_prefix("superpixel/") {
                let z: u32 = suffix
                    .parse()
                    .map_err(|_| EngineError::MalformedPlaneName(name.to_string()))?;
                planes.push(z);
            }
        }
        planes.sort_unstable();

        let mut superpixels = BTreeMap::new();
        if let (Some(&zmin), Some(&zmax)) = (planes.first(), planes.last()) {
            for z in zmin..=zmax {
                if !planes.contains(&z) {
                    return Err(EngineError::NonContiguousPlanes {
                        zmin,
                        zmax,
                        missing: z,
                    });
                }
                let table = container.read_dataset(&format!("superpixel/{z}"))?;
                superpixels.insert(z, table);
            }
        }

        let segments = container.read_dataset("segment")?;
        let segment_superpixels = Arena::from_table(container.read_dataset("segment_superpixels")?);
        let body_index = container.read_dataset("body_index")?;
        let body_segments = Arena::from_table(container.read_dataset("body_segments")?);

        Ok(Self::from_parts(
            superpixels,
            segments,
            segment_superpixels,
            body_index,
            body_segments,
        ))
    }

    /// Save the engine to a container. Unless `backup` is set, this first
    /// runs [`StackEngine::garbage_collect`] so the saved file never carries
    /// dead arena space or blanked-but-uncompacted rows.
    pub fn save<W: std::io::Write + std::io::Seek>(
        &mut self,
        writer: W,
        backup: bool,
    ) -> Result<(), EngineError> {
        if !backup {
            self.garbage_collect()?;
        }

        let mut container = ContainerWriter::new();
        container.create_group("superpixel");
        for (&z, table) in &self.superpixels {
            container.add_dataset(format!("superpixel/{z}"), table);
        }
        container.add_dataset("segment", &self.segments);
        container.add_dataset("segment_superpixels", self.segment_superpixels.table());
        container.add_dataset("body_index", &self.body_index);
        container.add_dataset("body_segments", self.body_segments.table());

        container.finish(writer)?;
        Ok(())
    }
}

impl Default for StackEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    fn engine_with_one_plane() -> StackEngine {
        let mut engine = StackEngine::new();
        engine.superpixels.insert(0, Table::new(0, NUM_SUPERPIXEL_COLUMNS));
        engine
    }

    #[test]
    fn create_body_and_segment_then_add_superpixel() {
        let mut engine = engine_with_one_plane();
        let b = engine.create_body().unwrap();
        let g = engine.create_segment().unwrap();
        engine.add_segments(&[g], b).unwrap();

        let s = engine.create_superpixel(0).unwrap();
        engine
            .set_bounds_and_volume(
                0,
                s,
                Bounds {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                },
                16,
            )
            .unwrap();
        engine.add_superpixel(0, s, g).unwrap();

        assert_eq!(engine.segment_of(0, s).unwrap(), g);
        assert_eq!(engine.body_of(g).unwrap(), b);
        assert_eq!(engine.superpixels_in_segment(g).unwrap(), vec![s]);
        assert_eq!(engine.segments_in_body(b).unwrap(), vec![g]);
    }

    #[test]
    fn add_superpixel_rejects_cross_plane_segment() {
        let mut engine = StackEngine::new();
        engine.superpixels.insert(5, Table::new(0, NUM_SUPERPIXEL_COLUMNS));
        engine.superpixels.insert(6, Table::new(0, NUM_SUPERPIXEL_COLUMNS));

        let b = engine.create_body().unwrap();
        let g = engine.create_segment().unwrap();
        engine.add_segments(&[g], b).unwrap();

        let s0 = engine.create_superpixel(5).unwrap();
        engine
            .set_bounds_and_volume(
                5,
                s0,
                Bounds {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                },
                1,
            )
            .unwrap();
        engine.add_superpixel(5, s0, g).unwrap();

        let s1 = engine.create_superpixel(6).unwrap();
        engine
            .set_bounds_and_volume(
                6,
                s1,
                Bounds {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                },
                1,
            )
            .unwrap();

        assert!(matches!(
            engine.add_superpixel(6, s1, g),
            Err(EngineError::PlaneMismatch { .. })
        ));
    }

    #[test]
    fn add_superpixel_rejects_zero_segment() {
        let mut engine = engine_with_one_plane();
        let s = engine.create_superpixel(0).unwrap();
        assert!(matches!(
            engine.add_superpixel(0, s, 0),
            Err(EngineError::ZeroSegmentAssignment)
        ));
    }

    #[test]
    fn garbage_collect_deletes_zero_volume_chain() {
        let mut engine = engine_with_one_plane();
        let b = engine.create_body().unwrap();
        let g = engine.create_segment().unwrap();
        engine.add_segments(&[g], b).unwrap();

        let s = engine.create_superpixel(0).unwrap();
        engine
            .set_bounds_and_volume(
                0,
                s,
                Bounds {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                },
                0,
            )
            .unwrap();
        engine.add_superpixel(0, s, g).unwrap();

        engine.garbage_collect().unwrap();

        assert!(!engine.has_superpixel(0, s));
        assert!(!engine.has_segment(g));
        assert!(!engine.has_body(b));
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut engine = engine_with_one_plane();
        let b = engine.create_body().unwrap();
        let g = engine.create_segment().unwrap();
        engine.add_segments(&[g], b).unwrap();

        let s = engine.create_superpixel(0).unwrap();
        engine
            .set_bounds_and_volume(
                0,
                s,
                Bounds {
                    x: 1,
                    y: 2,
                    width: 3,
                    height: 4,
                },
                5,
            )
            .unwrap();
        engine.add_superpixel(0, s, g).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        engine.save(&mut buffer, false).unwrap();
        buffer.set_position(0);

        let loaded = StackEngine::load(buffer).unwrap();
        assert_eq!(loaded.bounds(0, s).unwrap(), engine.bounds(0, s).unwrap());
        assert_eq!(loaded.body_of(g).unwrap(), b);
        assert_eq!(loaded.superpixels_in_segment(g).unwrap(), vec![s]);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(42)]
    fn plane_of_rejects_absent_or_zero_segment(#[case] g: u32) {
        let engine = engine_with_one_plane();
        if g == 0 {
            assert!(matches!(engine.plane_of(g), Err(EngineError::ZeroSegmentHasNoPlane)));
        } else {
            assert!(matches!(engine.plane_of(g), Err(EngineError::AbsentSegment(_))));
        }
    }

    #[test]
    fn delete_then_gc_compacts_arenas_to_constant_size() {
        let mut engine = engine_with_one_plane();
        let b = engine.create_body().unwrap();
        let g = engine.create_segment().unwrap();
        engine.add_segments(&[g], b).unwrap();

        let s = engine.create_superpixel(0).unwrap();
        engine
            .set_bounds_and_volume(
                0,
                s,
                Bounds {
                    x: 0,
                    y: 0,
                    width: 4,
                    height: 4,
                },
                0,
            )
            .unwrap();
        engine.add_superpixel(0, s, g).unwrap();

        engine.garbage_collect().unwrap();
        let rows_after_first = engine.segment_superpixels.rows();
        engine.garbage_collect().unwrap();
        assert_eq!(engine.segment_superpixels.rows(), rows_after_first);
    }
}
