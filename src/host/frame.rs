use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::machine::tiny_vga::output::Rgb222;

/// Expand a 2-bit colour level to 8 bits by repeating it: 01 -> 0x55.
pub fn expand_2bit(x: u8) -> u8 {
    let x = x & 3;
    (x << 6) | (x << 4) | (x << 2) | x
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Rgb888 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl From<Rgb222> for Rgb888 {
    fn from(c: Rgb222) -> Self {
        Self {
            r: expand_2bit(c.r),
            g: expand_2bit(c.g),
            b: expand_2bit(c.b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb888>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgb888> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Returns false if `(x, y)` is off the frame.
    pub fn set(&mut self, x: usize, y: usize, pixel: Rgb888) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y * self.width + x] = pixel;
        true
    }

    /// Packed RGB bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, mut w: W) -> io::Result<()> {
        write!(w, "P6\n{} {}\n255\n", self.width(), self.height())?;
        w.write_all(self.as_bytes())?;
        w.flush()
    }

    pub fn save_ppm(&self, path: &Path) -> io::Result<()> {
        self.write_ppm(BufWriter::new(File::create(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_2bit() {
        assert_eq!(expand_2bit(0), 0x00);
        assert_eq!(expand_2bit(1), 0x55);
        assert_eq!(expand_2bit(2), 0xaa);
        assert_eq!(expand_2bit(3), 0xff);
    }

    #[test]
    fn test_bounds() {
        let mut fb = Framebuffer::new(4, 2);
        assert_eq!((fb.width(), fb.height()), (4, 2));
        let red = Rgb888 { r: 255, g: 0, b: 0 };
        assert!(fb.set(3, 1, red));
        assert!(!fb.set(4, 0, red));
        assert!(!fb.set(0, 2, red));
        assert_eq!(fb.get(3, 1), Some(red));
        assert_eq!(fb.get(0, 0), Some(Rgb888::default()));
        assert_eq!(fb.get(4, 1), None);
    }

    #[test]
    fn test_ppm_file() {
        let mut fb = Framebuffer::new(2, 1);
        fb.set(0, 0, Rgb222::new(3, 1, 0).into());
        fb.set(1, 0, Rgb222::new(0, 2, 3).into());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.ppm");
        fb.save_ppm(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[0xff, 0x55, 0x00, 0x00, 0xaa, 0xff]);
        assert_eq!(bytes, expected);
    }
}
