use serde::{Deserialize, Serialize};

/// Tessellation tolerances for exported meshes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshQuality {
    /// Maximum chordal deviation in millimetres.
    pub linear_deflection: f64,
    /// Maximum angle between adjacent facet normals, in radians.
    pub angular_deflection: f64,
}

impl MeshQuality {
    /// Print quality: 5 micron chord error, 10 degree facet angle.
    pub const PRINT: MeshQuality = MeshQuality {
        linear_deflection: 0.005,
        angular_deflection: 10.0 * std::f64::consts::PI / 180.0,
    };

    /// Chord tolerance for a curved feature of the given radius: the tighter of the
    /// linear bound and the sagitta implied by the angular bound.
    pub fn chord_tolerance(&self, radius: f64) -> f64 {
        let sagitta = radius * (1.0 - (self.angular_deflection / 2.0).cos());
        self.linear_deflection.min(sagitta)
    }
}
