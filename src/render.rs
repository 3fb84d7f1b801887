use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::error::SimResult;
use crate::grid::Snapshot;

/// Writes height-field snapshots as PNG frames, `scale` pixels per node.
pub struct Renderer<S: Shade> {
    scale: usize,
    shader: S,
    render_path: PathBuf,
}

pub trait Shade {
    fn shade_node(&self, i: usize, j: usize, snapshot: &Snapshot) -> RGB;
}

#[derive(Clone, Debug, PartialEq)]
pub struct RGB {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl<S: Shade> Renderer<S> {
    pub fn new(scale: usize, shader: S, render_path: impl Into<PathBuf>) -> Renderer<S> {
        Renderer { scale: scale.max(1), shader, render_path: render_path.into() }
    }

    pub fn frame_path(&self, frame_num: u32) -> PathBuf {
        self.render_path.join(format!("frame_{:06}.png", frame_num))
    }

    pub fn render(&self, snapshot: &Snapshot, frame_num: u32) -> SimResult<PathBuf> {
        let path = self.frame_path(frame_num);
        let size = snapshot.side() * self.scale;
        self.save_image(&path, size, &self.to_data(snapshot))?;
        Ok(path)
    }

    /// Row-major RGB bytes, `i` across and `j` down.
    pub fn to_data(&self, snapshot: &Snapshot) -> Vec<u8> {
        let side = snapshot.side();
        let colors: Vec<[u8; 3]> = (0..side * side)
            .map(|n| self.shader.shade_node(n / side, n % side, snapshot).to_data())
            .collect();

        let size = side * self.scale;
        let mut data: Vec<u8> = Vec::with_capacity(size * size * 3);
        for py in 0..size {
            for px in 0..size {
                let (i, j) = (px / self.scale, py / self.scale);
                data.extend_from_slice(&colors[i * side + j]);
            }
        }
        data
    }

    fn save_image(&self, path: &Path, size: usize, pixel_data: &[u8]) -> SimResult<()> {
        let file = File::create(path)?;
        let w = &mut BufWriter::new(file);

        let mut encoder = png::Encoder::new(w, size as u32, size as u32);
        encoder.set_color(png::ColorType::RGB);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(pixel_data)?;
        Ok(())
    }
}

impl RGB {
    pub fn to_data(&self) -> [u8; 3] {
        [
            RGB::normalize(self.r),
            RGB::normalize(self.g),
            RGB::normalize(self.b)
        ]
    }

    fn normalize(n: f64) -> u8 {
        let mut n = (n * 256.0).floor();
        if n < 0.0 { n = 0.0; }
        if n > 255.0 { n = 255.0; }
        n as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    struct Flat;

    impl Shade for Flat {
        fn shade_node(&self, i: usize, _j: usize, _snapshot: &Snapshot) -> RGB {
            RGB { r: i as f64 * 0.5, g: 0.0, b: 2.0 }
        }
    }

    #[test]
    fn normalize_clamps_to_byte_range() {
        assert_eq!(RGB { r: -1.0, g: 0.5, b: 4.0 }.to_data(), [0, 128, 255]);
    }

    #[test]
    fn data_is_scaled_per_node() {
        let snapshot = Grid::new(1, 1.0, 0.0).unwrap().snapshot();
        let renderer = Renderer::new(2, Flat, ".");
        let data = renderer.to_data(&snapshot);
        assert_eq!(data.len(), 4 * 4 * 3);
        // first row: two pixels of i = 0, then two of i = 1
        assert_eq!(&data[0..3], &[0, 0, 255]);
        assert_eq!(&data[3..6], &[0, 0, 255]);
        assert_eq!(&data[6..9], &[128, 0, 255]);
    }

    #[test]
    fn frame_names_are_zero_padded() {
        let renderer = Renderer::new(1, Flat, "out");
        assert_eq!(renderer.frame_path(42), Path::new("out").join("frame_000042.png"));
    }
}
