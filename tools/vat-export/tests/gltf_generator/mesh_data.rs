//! Strip mesh, skeleton and animation data.
//!
//! The strip is two quads stacked along +Y, tilted back along Z so its
//! bounds have depth. The bottom row follows Root, the top row follows Tip
//! and the middle row is split evenly.

/// Vertices in the strip (3 rows of 2)
pub const VERTEX_COUNT: usize = 6;
/// Distance between vertex rows, and Root to Tip
pub const SEGMENT_HEIGHT: f32 = 1.0;
/// Z offset of the right-hand column
pub const STRIP_DEPTH: f32 = 0.5;
/// Root translation at the end of "Lift"
pub const LIFT_HEIGHT: f32 = 2.0;
/// Tip rotation about +Z at the end of "Bend", in radians
pub const BEND_ANGLE: f32 = std::f32::consts::FRAC_PI_2;
/// Both animations run from 0 to this time
pub const ANIMATION_LENGTH: f32 = 1.0;

pub struct StripData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub joints: Vec<[u8; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices: Vec<u16>,
    /// Column-major, one per joint
    pub inverse_bind_matrices: Vec<[f32; 16]>,
}

/// Bind-pose positions of the strip
pub fn strip_bind_positions() -> Vec<[f32; 3]> {
    (0..3)
        .flat_map(|row| {
            let y = row as f32 * SEGMENT_HEIGHT;
            [[-0.5, y, 0.0], [0.5, y, STRIP_DEPTH]]
        })
        .collect()
}

pub fn create_strip() -> StripData {
    let positions = strip_bind_positions();
    let uvs = positions
        .iter()
        .map(|p| [p[0] + 0.5, p[1] / (2.0 * SEGMENT_HEIGHT)])
        .collect();

    let mut joints = Vec::with_capacity(VERTEX_COUNT);
    let mut weights = Vec::with_capacity(VERTEX_COUNT);
    for row in 0..3 {
        let (j, w) = match row {
            0 => ([0, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
            1 => ([0, 1, 0, 0], [0.5, 0.5, 0.0, 0.0]),
            _ => ([1, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
        };
        joints.extend([j, j]);
        weights.extend([w, w]);
    }

    #[rustfmt::skip]
    let tip_ibm = [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, -SEGMENT_HEIGHT, 0.0, 1.0,
    ];
    #[rustfmt::skip]
    let identity = [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];

    StripData {
        positions,
        normals: vec![[0.0, 0.0, 1.0]; VERTEX_COUNT],
        uvs,
        joints,
        weights,
        indices: vec![0, 1, 3, 0, 3, 2, 2, 3, 5, 2, 5, 4],
        inverse_bind_matrices: vec![identity, tip_ibm],
    }
}

/// Keyframe times shared by both animations
pub fn key_times() -> [f32; 2] {
    [0.0, ANIMATION_LENGTH]
}

/// Root translations for "Lift"
pub fn lift_keys() -> [[f32; 3]; 2] {
    [[0.0, 0.0, 0.0], [0.0, LIFT_HEIGHT, 0.0]]
}

/// Tip rotations (xyzw) for "Bend"
pub fn bend_keys() -> [[f32; 4]; 2] {
    let half = BEND_ANGLE * 0.5;
    [[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, half.sin(), half.cos()]]
}

/// Component-wise min/max
pub fn compute_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    positions.iter().fold(
        ([f32::MAX; 3], [f32::MIN; 3]),
        |(mut min, mut max), p| {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
            (min, max)
        },
    )
}
