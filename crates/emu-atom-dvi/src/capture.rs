//! Headless capture: PNG frames and WAV audio dumps.

use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use emu_core::Pixel;

use crate::AtomDvi;

/// Expand an RGB332 pixel to 8-bit RGB.
#[must_use]
pub fn rgb332_to_rgb(pixel: Pixel) -> [u8; 3] {
    let r = (pixel >> 5) & 7;
    let g = (pixel >> 2) & 7;
    let b = pixel & 3;
    [
        (u16::from(r) * 255 / 7) as u8,
        (u16::from(g) * 255 / 7) as u8,
        b * 85,
    ]
}

/// Save an RGB332 frame as a PNG file.
pub fn save_frame(pixels: &[Pixel], width: usize, height: usize, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    let w = io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, u32::try_from(width)?, u32::try_from(height)?);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let rgb: Vec<u8> = pixels[..width * height]
        .iter()
        .flat_map(|&pixel| rgb332_to_rgb(pixel))
        .collect();
    writer.write_image_data(&rgb)?;
    Ok(())
}

/// Render the current frame and save it as a PNG file.
pub fn save_screenshot(board: &mut AtomDvi, path: &Path) -> Result<(), Box<dyn Error>> {
    let timing = board.timing();
    let frame = board.render_frame();
    save_frame(&frame, timing.h_active, timing.v_active, path)
}

/// Save SID samples as a mono 16-bit WAV file.
pub fn save_audio(samples: &[i16], sample_rate: u32, path: &Path) -> Result<(), Box<dyn Error>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Next free numbered file in `dir`: `<prefix>NNNN<extension>`, one past
/// the highest number already there. Creates `dir` if needed.
pub fn next_capture_path(dir: &Path, prefix: &str, extension: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let mut last = 0u32;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let Some(number) = name
            .to_str()
            .and_then(|name| name.strip_prefix(prefix))
            .and_then(|rest| rest.strip_suffix(extension))
            .and_then(|digits| digits.parse::<u32>().ok())
        else {
            continue;
        };
        last = last.max(number);
    }
    Ok(dir.join(format!("{prefix}{:04}{extension}", last + 1)))
}
