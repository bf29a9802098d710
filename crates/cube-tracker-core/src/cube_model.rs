//! Static geometry of the coloured cube.

use crate::{ColorPair, ColorPairMap, FaceColor, N_FACE_COLORS};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Edge length of the tracked cube in metres.
pub const DEFAULT_CUBE_WIDTH: f64 = 0.065;

/// Assignment of colours to the six axis-aligned faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceLayout {
    pub pos_x: FaceColor,
    pub neg_x: FaceColor,
    pub pos_y: FaceColor,
    pub neg_y: FaceColor,
    pub pos_z: FaceColor,
    pub neg_z: FaceColor,
}

impl Default for FaceLayout {
    fn default() -> Self {
        Self {
            pos_x: FaceColor::Red,
            neg_x: FaceColor::Cyan,
            pos_y: FaceColor::Green,
            neg_y: FaceColor::Magenta,
            pos_z: FaceColor::Blue,
            neg_z: FaceColor::Yellow,
        }
    }
}

impl FaceLayout {
    /// Faces as `(color, axis, sign)`, in +x, -x, +y, -y, +z, -z order.
    fn faces(&self) -> [(FaceColor, usize, f64); 6] {
        [
            (self.pos_x, 0, 1.0),
            (self.neg_x, 0, -1.0),
            (self.pos_y, 1, 1.0),
            (self.neg_y, 1, -1.0),
            (self.pos_z, 2, 1.0),
            (self.neg_z, 2, -1.0),
        ]
    }

    fn has_unique_colors(&self) -> bool {
        let mut seen = [false; N_FACE_COLORS];
        for (color, _, _) in self.faces() {
            if seen[color.index()] {
                return false;
            }
            seen[color.index()] = true;
        }
        true
    }
}

/// Errors produced when building a [`CubeModel`].
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum CubeModelError {
    #[error("cube width must be > 0, got {0}")]
    InvalidWidth(f64),
    #[error("every face needs a distinct color")]
    DuplicateFaceColor,
}

/// One face of the cube.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeFace {
    pub color: FaceColor,
    /// Outward normal in the cube frame.
    pub normal: Vector3<f64>,
    /// Vertex indices, counter-clockwise when seen from outside.
    pub vertices: [usize; 4],
}

/// Cube geometry in its own frame (origin at the centre, axes along edges).
///
/// Vertex `i` has coordinate `±width/2` on axis `k` depending on bit `k` of
/// `i` (set = positive).
#[derive(Clone, Debug)]
pub struct CubeModel {
    width: f64,
    layout: FaceLayout,
    vertices: [Point3<f64>; 8],
    faces: [CubeFace; 6],
    edges: ColorPairMap<[usize; 2]>,
}

impl Default for CubeModel {
    fn default() -> Self {
        Self::build(DEFAULT_CUBE_WIDTH, FaceLayout::default())
    }
}

impl CubeModel {
    /// Validate and build a model for the given edge length and colour layout.
    pub fn new(width: f64, layout: FaceLayout) -> Result<Self, CubeModelError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(CubeModelError::InvalidWidth(width));
        }
        if !layout.has_unique_colors() {
            return Err(CubeModelError::DuplicateFaceColor);
        }
        Ok(Self::build(width, layout))
    }

    fn build(width: f64, layout: FaceLayout) -> Self {
        let h = width / 2.0;
        let vertices: [Point3<f64>; 8] = std::array::from_fn(|i| {
            let s = |bit: usize| if i & (1 << bit) != 0 { h } else { -h };
            Point3::new(s(0), s(1), s(2))
        });

        let faces = layout
            .faces()
            .map(|(color, axis, sign)| build_face(color, axis, sign));

        let mut edges = ColorPairMap::new();
        let face_defs = layout.faces();
        for (i, &(ca, axis_a, sign_a)) in face_defs.iter().enumerate() {
            for &(cb, axis_b, sign_b) in &face_defs[i + 1..] {
                if axis_a == axis_b {
                    continue;
                }
                let Some(pair) = ColorPair::new(ca, cb) else {
                    continue;
                };
                let free_axis = 3 - axis_a - axis_b;
                let base = bit_for(axis_a, sign_a) | bit_for(axis_b, sign_b);
                edges.insert(pair, [base, base | (1 << free_axis)]);
            }
        }

        Self {
            width,
            layout,
            vertices,
            faces,
            edges,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn layout(&self) -> FaceLayout {
        self.layout
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>; 8] {
        &self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[CubeFace; 6] {
        &self.faces
    }

    pub fn face(&self, color: FaceColor) -> Option<&CubeFace> {
        self.faces.iter().find(|f| f.color == color)
    }

    /// Colour pair -> vertex indices of the shared edge.
    #[inline]
    pub fn edges(&self) -> &ColorPairMap<[usize; 2]> {
        &self.edges
    }

    #[inline]
    pub fn edge(&self, pair: ColorPair) -> Option<[usize; 2]> {
        self.edges.get(pair).copied()
    }

    /// 3D endpoints of the edge named by `pair`.
    pub fn edge_points(&self, pair: ColorPair) -> Option<[Point3<f64>; 2]> {
        let [a, b] = self.edge(pair)?;
        Some([self.vertices[a], self.vertices[b]])
    }

    #[inline]
    pub fn has_edge(&self, pair: ColorPair) -> bool {
        self.edges.contains(pair)
    }
}

fn bit_for(axis: usize, sign: f64) -> usize {
    if sign > 0.0 {
        1 << axis
    } else {
        0
    }
}

fn build_face(color: FaceColor, axis: usize, sign: f64) -> CubeFace {
    let u = (axis + 1) % 3;
    let v = (axis + 2) % 3;
    let fixed = bit_for(axis, sign);
    // (u, v) corners in CCW order around +axis; flipped for the negative face.
    let mut quad = [(0, 0), (1, 0), (1, 1), (0, 1)];
    if sign < 0.0 {
        quad.reverse();
    }
    let vertices = quad.map(|(bu, bv)| fixed | (bu << u) | (bv << v));
    let mut normal = Vector3::zeros();
    normal[axis] = sign;
    CubeFace {
        color,
        normal,
        vertices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_model_has_twelve_edges_of_cube_width() {
        let model = CubeModel::default();
        assert_eq!(model.edges().len(), 12);
        for (pair, _) in model.edges().iter() {
            let [a, b] = model.edge_points(pair).unwrap();
            assert_relative_eq!((a - b).norm(), DEFAULT_CUBE_WIDTH, epsilon = 1e-12);
        }
    }

    #[test]
    fn opposite_faces_share_no_edge() {
        let model = CubeModel::default();
        let l = model.layout();
        for (a, b) in [(l.pos_x, l.neg_x), (l.pos_y, l.neg_y), (l.pos_z, l.neg_z)] {
            assert!(!model.has_edge(ColorPair::new(a, b).unwrap()));
        }
    }

    #[test]
    fn edge_vertices_belong_to_both_faces() {
        let model = CubeModel::default();
        for (pair, verts) in model.edges().iter() {
            let fa = model.face(pair.first()).unwrap();
            let fb = model.face(pair.second()).unwrap();
            for v in verts {
                assert!(fa.vertices.contains(v), "{pair}: vertex {v} not on {}", fa.color);
                assert!(fb.vertices.contains(v), "{pair}: vertex {v} not on {}", fb.color);
            }
        }
    }

    #[test]
    fn face_winding_matches_outward_normal() {
        let model = CubeModel::default();
        let vs = model.vertices();
        for face in model.faces() {
            let [a, b, c, _] = face.vertices.map(|i| vs[i]);
            let n = (b - a).cross(&(c - a)).normalize();
            assert_relative_eq!(n, face.normal, epsilon = 1e-12);
            let center = face.vertices.iter().map(|&i| vs[i].coords).sum::<Vector3<f64>>() / 4.0;
            assert_relative_eq!(center, face.normal * model.width() / 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_invalid_models() {
        assert_eq!(
            CubeModel::new(0.0, FaceLayout::default()).unwrap_err(),
            CubeModelError::InvalidWidth(0.0)
        );
        let layout = FaceLayout {
            neg_z: FaceColor::Red,
            ..FaceLayout::default()
        };
        assert_eq!(
            CubeModel::new(0.05, layout).unwrap_err(),
            CubeModelError::DuplicateFaceColor
        );
    }
}
