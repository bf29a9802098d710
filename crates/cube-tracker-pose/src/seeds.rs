//! Initial orientations for the multi-start solve.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

/// The 24 proper rotations mapping coordinate axes onto coordinate axes.
pub fn axis_aligned_rotations() -> Vec<UnitQuaternion<f64>> {
    const PERMS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    let mut out = Vec::with_capacity(24);
    for perm in PERMS {
        for signs in 0..8u8 {
            let mut m = Matrix3::zeros();
            for (row, &col) in perm.iter().enumerate() {
                m[(row, col)] = if signs & (1 << row) != 0 { -1.0 } else { 1.0 };
            }
            if m.determinant() > 0.0 {
                let r = Rotation3::from_matrix_unchecked(m);
                out.push(UnitQuaternion::from_rotation_matrix(&r));
            }
        }
    }
    out
}

/// Axis-aligned rotations composed with each yaw offset about world z.
pub fn seed_orientations(yaw_offsets_deg: &[f64]) -> Vec<UnitQuaternion<f64>> {
    let base = axis_aligned_rotations();
    let offsets: &[f64] = if yaw_offsets_deg.is_empty() {
        &[0.0]
    } else {
        yaw_offsets_deg
    };
    offsets
        .iter()
        .flat_map(|deg| {
            let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), deg.to_radians());
            base.iter().map(move |q| yaw * q)
        })
        .collect()
}
