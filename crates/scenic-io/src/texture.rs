//! Embedded image decoding shared by every format.

use image::ImageFormat;
use scenic_core::{Sampler, Texture, TextureImage};

use crate::error::Result;
use crate::loader::LoadOptions;

/// Builds a texture from encoded image bytes.
///
/// `mime_type` picks the decoder when given; otherwise the format is
/// guessed from the leading bytes. With texture decoding disabled the
/// bytes are kept as they are.
pub(crate) fn load_texture(
    name: &str,
    bytes: Vec<u8>,
    mime_type: Option<&str>,
    sampler: Option<Sampler>,
    options: &LoadOptions,
) -> Result<Texture> {
    let image = if options.decode_textures() {
        let format = match mime_type.and_then(|mime| ImageFormat::from_mime_type(mime)) {
            Some(format) => format,
            None => image::guess_format(&bytes)?,
        };
        let rgba = image::load_from_memory_with_format(&bytes, format)?.to_rgba8();
        log::debug!("Decoded {:?} texture {:?}: {}x{}", format, name, rgba.width(), rgba.height());
        TextureImage::Decoded {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        }
    } else {
        TextureImage::Undecoded {
            mime_type: mime_type.map(str::to_string),
            bytes,
        }
    };

    Ok(Texture {
        name: name.to_string(),
        image,
        sampler,
    })
}
