use crate::aztec::AztecCode;
use crate::error::{EncodeError, RenderError};

use image::{ImageBuffer, Luma};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Pixels per module when none is given.
pub const DEFAULT_MODULE_SIZE: u32 = 1;
/// Light modules around the symbol when no border is given.
pub const DEFAULT_BORDER: u32 = 4;

/*---- Utilities ----*/

// Returns a string of SVG code for an image depicting
// the given Aztec Code, with the given number of border modules.
// The string always uses Unix newlines (\n), regardless of the platform.
pub fn to_svg_string(code: &AztecCode, border: u32) -> String {
    let border = border as i32;
    let dimension = code.size() + border * 2;
    let mut result = String::new();
    result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
    result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
    result += &format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n",
        dimension
    );
    result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
    result += "\t<path d=\"";
    let mut first = true;
    for y in 0..code.size() {
        for x in 0..code.size() {
            if code.get_module(x, y) {
                if !first {
                    result += " ";
                }
                first = false;
                result += &format!("M{},{}h1v1h-1z", x + border, y + border);
            }
        }
    }
    result += "\" fill=\"#000000\"/>\n";
    result += "</svg>\n";
    result
}

/// Renders the symbol as text, `#` for dark modules and a space for light ones.
pub fn to_ascii_string(code: &AztecCode, border: u32) -> String {
    let border = border as i32;
    let mut result = String::new();
    for y in -border..code.size() + border {
        for x in -border..code.size() + border {
            result.push(if code.get_module(x, y) { '#' } else { ' ' });
        }
        result.push('\n');
    }
    result
}

/// Renders the symbol with half-block characters, two module rows per line.
///
/// Light modules are drawn in the foreground colour, so the output is wrapped in ANSI codes
/// selecting white on black.
pub fn to_unicode_string(code: &AztecCode, border: u32) -> String {
    let border = border as i32;
    let size = code.size();
    let mut result = String::new();
    let mut y = -border;
    while y < size + border {
        // An odd row count leaves the last line with only an upper half.
        let last_half_row = y == size + border - 1;
        let edge = if last_half_row { '\u{2580}' } else { '\u{2588}' };
        result += "\x1b[40;37;1m";
        result.extend(std::iter::repeat_n(edge, border as usize));
        for x in 0..size {
            let upper = code.get_module(x, y);
            let lower = if y + 1 < size {
                code.get_module(x, y + 1)
            } else {
                last_half_row
            };
            result.push(match (upper, lower) {
                (true, true) => ' ',
                (true, false) => '\u{2584}',
                (false, true) => '\u{2580}',
                (false, false) => '\u{2588}',
            });
        }
        result.extend(std::iter::repeat_n(edge, border as usize));
        result += "\x1b[0m\n";
        y += 2;
    }
    result
}

/// Prints the given Aztec Code to the console.
pub fn print_code(code: &AztecCode, border: u32) {
    print!("{}", to_unicode_string(code, border));
}

/// Rasterizes the symbol to a grayscale image, 0 for dark and 255 for light.
///
/// # Arguments
///
/// * `code` - The Aztec Code to draw.
/// * `module_size` - Optional. Pixels per module. Defaults to [`DEFAULT_MODULE_SIZE`].
/// * `border` - Optional. Light modules around the symbol. Defaults to [`DEFAULT_BORDER`].
pub fn to_image_buffer(
    code: &AztecCode,
    module_size: Option<u32>,
    border: Option<u32>,
) -> ImageBuffer<Luma<u8>, Vec<u8>> {
    let module_size = module_size.unwrap_or(DEFAULT_MODULE_SIZE).max(1);
    let border = border.unwrap_or(DEFAULT_BORDER);
    let size = (code.size() as u32 + 2 * border) * module_size;
    let mut img = ImageBuffer::new(size, size);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let code_x = (x / module_size) as i32 - border as i32;
        let code_y = (y / module_size) as i32 - border as i32;
        *pixel = if code.get_module(code_x, code_y) {
            Luma([0u8]) // Black
        } else {
            Luma([255u8]) // White
        };
    }
    img
}

/// Converts an Aztec Code to an image and saves it as a PNG file.
///
/// # Arguments
///
/// * `code` - The Aztec Code to convert.
/// * `module_size` - Optional. Pixels per module.
/// * `border` - Optional. Light modules around the symbol.
/// * `directory_path` - Optional. The directory path where the image will be saved. If not provided, the default directory is "generated".
/// * `filename` - Optional. The name of the image file, without extension. If not provided, a timestamp-based filename will be used.
///
/// # Errors
///
/// Returns a [`RenderError`] if the directory cannot be created or the image cannot be saved.
///
/// # Example
///
/// ```rust,no_run
/// use azrust::aztec::AztecCode;
/// use azrust::helper::code_to_image_and_save;
///
/// let code = AztecCode::encode_text("Hello, World!", None, None, None).unwrap();
/// code_to_image_and_save(&code, Some(5), None, Some("images"), Some("aztec_code")).unwrap();
/// ```
pub fn code_to_image_and_save(
    code: &AztecCode,
    module_size: Option<u32>,
    border: Option<u32>,
    directory_path: Option<&str>,
    filename: Option<&str>,
) -> Result<PathBuf, RenderError> {
    let img = to_image_buffer(code, module_size, border);

    let directory_path = directory_path.unwrap_or("generated");
    let filename = match filename {
        Some(name) => name.to_string(),
        None => {
            let since_the_epoch = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            format!("aztec_{}", since_the_epoch)
        }
    };

    // Check if the directory exists, create it if it doesn't
    if !Path::new(directory_path).exists() {
        fs::create_dir_all(directory_path)?;
    }

    let file_path = Path::new(directory_path).join(format!("{}.png", filename));
    img.save(&file_path)?;
    Ok(file_path)
}

/// Generates an Aztec Code image from the provided content and saves it to a file.
///
/// # Arguments
///
/// * `content` - The content to encode into the Aztec Code.
/// * `directory` - Optional. The directory path where the image will be saved. If not provided, the default directory is "generated".
/// * `filename` - Optional. The name of the image file. If not provided, a timestamp-based filename will be used.
///
/// # Example
///
/// ```no_run
/// use azrust::helper::generate_image;
///
/// generate_image("Hello, World!", Some("images"), Some("aztec_code")).unwrap();
/// ```
pub fn generate_image(
    content: &str,
    directory: Option<&str>,
    filename: Option<&str>,
) -> Result<PathBuf, RenderError> {
    let code = AztecCode::encode_text(content, None, None, None)?;
    code_to_image_and_save(&code, None, None, directory, filename)
}

/// Generates an Aztec Code SVG from the provided content.
///
/// # Example
///
/// ```
/// use azrust::helper::generate_svg_string;
///
/// let svg_string = generate_svg_string("Hello, World!").unwrap();
/// assert!(svg_string.contains("<path"));
/// ```
pub fn generate_svg_string(content: &str) -> Result<String, EncodeError> {
    let code = AztecCode::encode_text(content, None, None, None)?;
    Ok(to_svg_string(&code, DEFAULT_BORDER))
}

/// Generates an Aztec Code image buffer from the provided content.
///
/// # Example
///
/// ```
/// use azrust::helper::generate_image_buffer;
///
/// let img_buffer = generate_image_buffer("Hello, World!").unwrap();
/// ```
pub fn generate_image_buffer(content: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, EncodeError> {
    let code = AztecCode::encode_text(content, None, None, None)?;
    Ok(to_image_buffer(&code, None, None))
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AztecCode {
        AztecCode::encode_text("HELLO WORLD", None, None, None).unwrap()
    }

    fn dark_count(code: &AztecCode) -> usize {
        let mut count = 0;
        for y in 0..code.size() {
            for x in 0..code.size() {
                if code.get_module(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_to_svg_string() {
        let code = sample();
        let svg = to_svg_string(&code, 4);

        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(svg.contains("viewBox=\"0 0 23 23\""));
        assert_eq!(svg.matches("h1v1h-1z").count(), dark_count(&code));
        assert!(!svg.contains("d=\" "));
    }

    #[test]
    fn test_to_ascii_string() {
        let code = sample();
        let text = to_ascii_string(&code, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 19);
        assert!(lines.iter().all(|line| line.chars().count() == 19));
        assert_eq!(lines[0].trim(), "");
        assert_eq!(text.matches('#').count(), dark_count(&code));
        // Bullseye center.
        assert_eq!(lines[9].chars().nth(9), Some('#'));
    }

    #[test]
    fn test_to_unicode_string() {
        let code = sample();
        let text = to_unicode_string(&code, 2);
        assert_eq!(text.lines().count(), 10);
        assert!(text.lines().all(|line| line.starts_with("\x1b[40;37;1m") && line.ends_with("\x1b[0m")));
    }

    #[test]
    fn test_to_image_buffer() {
        let code = sample();
        let img = to_image_buffer(&code, Some(3), Some(1));
        assert_eq!(img.dimensions(), (51, 51));
        // Border is light, bullseye center is dark.
        assert_eq!(img.get_pixel(0, 0), &Luma([255u8]));
        assert_eq!(img.get_pixel(25, 25), &Luma([0u8]));
    }

    #[test]
    fn test_generate_image_buffer() {
        let content = "Hello, world!";
        let img = generate_image_buffer(content).unwrap();

        // "Hello, world!" fits the 15x15 compact symbol; with the default border of 4
        // and one pixel per module the image is 23x23 pixels.
        assert_eq!(img.dimensions(), (23, 23));
    }

    #[test]
    fn test_generate_svg_rejects_unencodable_text() {
        assert!(generate_svg_string("\u{20ac}").is_err());
    }

    #[test]
    fn test_code_to_image_and_save() {
        let dir = std::env::temp_dir().join(format!("azrust_helper_{}", std::process::id()));
        let dir_str = dir.to_string_lossy().to_string();
        let path = code_to_image_and_save(&sample(), Some(2), None, Some(&dir_str), Some("sample")).unwrap();
        assert!(path.exists());
        let saved = image::open(&path).unwrap().to_luma8();
        assert_eq!(saved.dimensions(), (46, 46));
        fs::remove_dir_all(&dir).unwrap();
    }
}
