use crate::grid::Snapshot;
use crate::render::{RGB, Shade};

pub struct DefaultShader;

impl Shade for DefaultShader {
    fn shade_node(&self, i: usize, j: usize, snapshot: &Snapshot) -> RGB {
        let [dh_dx, dh_dz] = snapshot.stencil().gradient(&snapshot.heights, i, j);
        let mut v_normal = [-(dh_dx as f64), 1.0, -(dh_dz as f64)];
        vec3::norm_mut(&mut v_normal);
        let mut v_light = [-1.0, 1.0, 1.0];
        vec3::norm_mut(&mut v_light);
        let lighting = vec3::dot(&v_normal, &v_light).max(0.0);

        let height = snapshot.height(i, j) as f64;
        let factor = 1.0 + (-4.0 * height).max(-0.5);
        RGB {
            r: 0.1 * lighting / factor,
            g: 0.4 * lighting / factor,
            b: 1.0 * lighting / factor,
        }
    }
}
