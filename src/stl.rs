//! Binary STL export of a body as a voxel mesh: one axis-aligned box per
//! superpixel, stacked along z by `zaspect`.

use std::io::Write;

use crate::engine::{Bounds, StackEngine};
use crate::error::EngineError;

type Vertex = [f32; 3];

struct Triangle {
    normal: Vertex,
    a: Vertex,
    b: Vertex,
    c: Vertex,
}

struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    fn new() -> Self {
        Self { triangles: Vec::new() }
    }

    fn add_face(&mut self, a: Vertex, b: Vertex, c: Vertex, d: Vertex, normal: Vertex) {
        self.triangles.push(Triangle { normal, a, b, c });
        self.triangles.push(Triangle { normal, a, b: c, c: d });
    }

    /// One box per superpixel, each face split into two CCW triangles as
    /// seen from outside the box.
    fn add_cube(&mut self, bounds: Bounds, plane: u32, zaspect: f32) {
        let x0 = bounds.x as f32;
        let x1 = (bounds.x + bounds.width) as f32;
        let y0 = bounds.y as f32;
        let y1 = (bounds.y + bounds.height) as f32;
        let z0 = plane as f32 * zaspect;
        let z1 = (plane + 1) as f32 * zaspect;

        self.add_face([x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0], [0.0, 0.0, 1.0]);
        self.add_face([x0, y1, z0], [x0, y1, z1], [x1, y1, z1], [x1, y1, z0], [0.0, 1.0, 0.0]);
        self.add_face([x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0], [-1.0, 0.0, 0.0]);
        self.add_face([x1, y1, z0], [x1, y1, z1], [x1, y0, z1], [x1, y0, z0], [1.0, 0.0, 0.0]);
        self.add_face([x1, y0, z0], [x1, y0, z1], [x0, y0, z1], [x0, y0, z0], [0.0, -1.0, 0.0]);
        self.add_face([x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1], [0.0, 0.0, -1.0]);
    }

    fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        let mut header = [0u8; 80];
        let banner = b"Binary STL";
        header[..banner.len()].copy_from_slice(banner);
        writer.write_all(&header)?;
        writer.write_all(&(self.triangles.len() as u32).to_le_bytes())?;

        for tri in &self.triangles {
            for component in [tri.normal, tri.a, tri.b, tri.c] {
                for value in component {
                    writer.write_all(&value.to_le_bytes())?;
                }
            }
            writer.write_all(&0u16.to_le_bytes())?;
        }

        writer.flush()
    }
}

/// Write a binary STL mesh of every superpixel in `bodyid`, one box per
/// superpixel, to `writer`. `zaspect` scales the z axis relative to the
/// in-plane pixel units.
pub fn write_body<W: Write>(
    writer: W,
    engine: &StackEngine,
    bodyid: u32,
    zaspect: f32,
) -> Result<(), EngineError> {
    let mut mesh = Mesh::new();
    for (z, bounds) in engine.body_bounds(bodyid)? {
        mesh.add_cube(bounds, z, zaspect);
    }
    mesh.write(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NUM_SUPERPIXEL_COLUMNS;
    use stack_table::Table;
    use std::io::Cursor;

    #[test]
    fn single_superpixel_writes_twelve_triangles() {
        let mut engine = StackEngine::new();
        engine.superpixels.insert(0, Table::new(0, NUM_SUPERPIXEL_COLUMNS));
        let b = engine.create_body().unwrap();
        let g = engine.create_segment().unwrap();
        engine.add_segments(&[g], b).unwrap();

        let s = engine.create_superpixel(0).unwrap();
        engine
            .set_bounds_and_volume(0, s, Bounds { x: 0, y: 0, width: 2, height: 2 }, 8)
            .unwrap();
        engine.add_superpixel(0, s, g).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        write_body(&mut buffer, &engine, b, 1.0).unwrap();

        let bytes = buffer.into_inner();
        assert_eq!(bytes.len(), 80 + 4 + 12 * 50);
        let count = u32::from_le_bytes(bytes[80..84].try_into().unwrap());
        assert_eq!(count, 12);
    }

    #[test]
    fn empty_body_writes_zero_triangles() {
        let mut engine = StackEngine::new();
        let b = engine.create_body().unwrap();

        let mut buffer = Cursor::new(Vec::new());
        write_body(&mut buffer, &engine, b, 1.0).unwrap();

        let bytes = buffer.into_inner();
        assert_eq!(bytes.len(), 84);
    }
}
